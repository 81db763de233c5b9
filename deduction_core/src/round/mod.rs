//! Round State Machine - drives the session from setup to handoff.
//!
//! - **Session**: root state, round state, snapshots and the final transcript
//! - **Collaborators**: decision maker and scene moderator contracts
//! - **Validation**: acceptance rules for a character's decision
//! - **Machine**: phase transitions, retries, memory synchronization

mod collaborator;
mod machine;
mod session;
mod validate;

pub use collaborator::*;
pub use machine::*;
pub use session::*;
pub use validate::*;
