//! Memory module - everything the session remembers.
//!
//! - **Public log**: append-only, totally ordered record every character may read
//! - **Interaction log**: full audit trail, including private reasoning and skipped turns
//! - **Private memory**: one record per character, read only by its owner
//! - **Roster**: the repository that owns dossiers and private records, keyed by character
//! - **Store**: persistence hooks; the core owns no storage mechanism itself

mod interaction_log;
mod private;
mod public_log;
mod roster;
mod store;

pub use interaction_log::*;
pub use private::*;
pub use public_log::*;
pub use roster::*;
pub use store::*;
