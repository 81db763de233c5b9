//! # Deduction Rules
//!
//! The "Session Bible" crate - identifiers, character dossiers, knowledge tiers,
//! secrets and the session setup format for deduction sessions.
//! This crate is the single source of truth for session data and does not contain any
//! orchestration logic.

pub mod entities;
pub mod error;
pub mod mechanics;
pub mod setup;

pub use entities::*;
pub use error::*;
pub use mechanics::*;
pub use setup::*;
