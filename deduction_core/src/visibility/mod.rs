//! Knowledge Visibility - who may see what.
//!
//! - **Filter**: resolves a reader's visible knowledge from tiers and knowledge levels
//! - **Capabilities**: privileged moderator reads and the scrubbing public relay
//! - **View**: the complete, leak-free input assembled for one character's turn

mod capability;
mod filter;
mod view;

pub use capability::*;
pub use filter::*;
pub use view::*;
