//! Segment definitions - single pieces of tiered world knowledge.

use deduction_rules::{SegmentRecord, Tier};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Position of a segment in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub usize);

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "segment#{}", self.0)
    }
}

/// A piece of world knowledge with its accessibility tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeSegment {
    pub id: SegmentId,
    pub tier: Tier,
    /// Region for `Regional`, affiliation for `Special`, `None` otherwise.
    pub scope_key: Option<String>,
    pub text: String,
}

impl KnowledgeSegment {
    /// Create a common segment.
    pub fn common(id: SegmentId, text: impl Into<String>) -> Self {
        Self {
            id,
            tier: Tier::Common,
            scope_key: None,
            text: text.into(),
        }
    }

    /// Build a segment from a setup row, rejecting unknown tiers and missing scopes.
    pub fn from_record(id: SegmentId, record: &SegmentRecord) -> CoreResult<Self> {
        let tier: Tier = record.tier.parse()?;

        let scope_key = record
            .scope
            .as_deref()
            .map(str::trim)
            .filter(|scope| !scope.is_empty())
            .map(str::to_string);

        if tier.requires_scope() && scope_key.is_none() {
            return Err(CoreError::Configuration(format!(
                "{} ({} tier) requires a scope",
                id, tier
            )));
        }

        if record.text.trim().is_empty() {
            return Err(CoreError::Configuration(format!("{} has no text", id)));
        }

        Ok(Self {
            id,
            tier,
            scope_key: if tier.requires_scope() { scope_key } else { None },
            text: record.text.clone(),
        })
    }

    /// Whether this segment is scoped to exactly `scope`.
    pub fn is_scoped_to(&self, scope: &str) -> bool {
        self.scope_key.as_deref() == Some(scope)
    }

    /// Short label such as `regional:North`.
    pub fn label(&self) -> String {
        match &self.scope_key {
            Some(scope) => format!("{}:{}", self.tier, scope),
            None => self.tier.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_record() {
        let record = SegmentRecord::new("Regional", Some(" North "), "Snow closes the pass.");
        let segment = KnowledgeSegment::from_record(SegmentId(3), &record).unwrap();
        assert_eq!(segment.tier, Tier::Regional);
        assert!(segment.is_scoped_to("North"));
        assert!(!segment.is_scoped_to("north"));
        assert_eq!(segment.label(), "regional:North");
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let record = SegmentRecord::new("restricted", None, "Something");
        let err = KnowledgeSegment::from_record(SegmentId(0), &record).unwrap_err();
        assert!(matches!(err, CoreError::Configuration(msg) if msg.contains("restricted")));
    }

    #[test]
    fn test_scoped_tier_requires_scope() {
        let record = SegmentRecord::new("special", Some("  "), "Guild handshake");
        assert!(KnowledgeSegment::from_record(SegmentId(0), &record).is_err());
    }

    #[test]
    fn test_unscoped_tier_drops_scope() {
        let record = SegmentRecord::new("secret", Some("North"), "The mayor is the thief.");
        let segment = KnowledgeSegment::from_record(SegmentId(1), &record).unwrap();
        assert_eq!(segment.scope_key, None);
        assert_eq!(segment.label(), "secret");
    }

    #[test]
    fn test_empty_text_rejected() {
        let record = SegmentRecord::new("common", None, "   ");
        assert!(KnowledgeSegment::from_record(SegmentId(0), &record).is_err());
    }
}
