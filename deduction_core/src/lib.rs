//! # Deduction Core (The Cortex)
//!
//! The engine of a multi-agent deduction session. Character agents act on their own
//! inside a moderated scene; this crate decides what each of them may see, when their
//! secrets may surface, in which order they act, and how rounds begin and end.
//!
//! ## Core Components
//!
//! - **knowledge_base**: Tiered, immutable world knowledge for the session
//! - **visibility**: Per-reader knowledge filter and character view assembly
//! - **pressure**: Secret pressure tracking and narrative event recognition
//! - **scheduler**: Deterministic turn ordering with starvation protection
//! - **memory**: Public log, interaction log, private memory repository, persistence hooks
//! - **round**: The round state machine and its external collaborators
//!
//! ## Design Philosophy
//!
//! - **Isolation by construction**: A character view is a pure function of public state and
//!   that character's own record; secret-tier knowledge has no path into it
//! - **Single writer**: Only the round state machine mutates logs and memories, one turn at a time
//! - **Tunable**: Weights, deltas and limits live in [`SessionConfig`], not in the algorithms

pub mod config;
pub mod error;
pub mod knowledge_base;
pub mod memory;
pub mod pressure;
pub mod round;
pub mod scheduler;
pub mod visibility;

pub use config::*;
pub use error::*;
pub use knowledge_base::*;
pub use memory::*;
pub use pressure::*;
pub use round::*;
pub use scheduler::*;
pub use visibility::*;
