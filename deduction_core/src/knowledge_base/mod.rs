//! Knowledge Base module - the session's tiered world knowledge.
//!
//! The knowledge base consists of:
//! - **Segments**: Pieces of world knowledge, each with an accessibility tier
//! - **Scopes**: The region or affiliation a scoped tier belongs to
//! - **Tier index**: Lookups by tier for the visibility filter

mod base;
mod segment;

pub use base::*;
pub use segment::*;
