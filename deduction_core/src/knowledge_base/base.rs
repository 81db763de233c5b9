//! Knowledge Base - ordered, tier-indexed store of world knowledge.

use deduction_rules::{SegmentRecord, Tier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{KnowledgeSegment, SegmentId};
use crate::error::CoreResult;

/// The session's world knowledge. Immutable once loaded.
///
/// Segments keep their load order; the tier index only stores positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    segments: Vec<KnowledgeSegment>,

    /// Index: Tier -> positions of segments in that tier, in load order.
    by_tier: HashMap<Tier, Vec<usize>>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate setup rows. Any bad row fails the whole load.
    pub fn from_records(records: &[SegmentRecord]) -> CoreResult<Self> {
        let segments = records
            .iter()
            .enumerate()
            .map(|(i, record)| KnowledgeSegment::from_record(SegmentId(i), record))
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self::from_segments(segments))
    }

    fn from_segments(segments: Vec<KnowledgeSegment>) -> Self {
        let mut by_tier: HashMap<Tier, Vec<usize>> = HashMap::new();
        for (position, segment) in segments.iter().enumerate() {
            by_tier.entry(segment.tier).or_default().push(position);
        }
        Self { segments, by_tier }
    }

    /// All segments in load order.
    pub fn segments(&self) -> &[KnowledgeSegment] {
        &self.segments
    }

    pub fn get(&self, id: SegmentId) -> Option<&KnowledgeSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Segments of one tier, in load order.
    pub fn by_tier(&self, tier: Tier) -> impl Iterator<Item = &KnowledgeSegment> {
        self.by_tier
            .get(&tier)
            .map(|positions| positions.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(|&position| self.segments.get(position))
    }

    /// Segments of one tier bound to exactly `scope`.
    pub fn scoped<'a>(
        &'a self,
        tier: Tier,
        scope: &'a str,
    ) -> impl Iterator<Item = &'a KnowledgeSegment> + 'a {
        self.by_tier(tier).filter(move |s| s.is_scoped_to(scope))
    }

    /// Number of segments in a tier.
    pub fn tier_count(&self, tier: Tier) -> usize {
        self.by_tier.get(&tier).map(Vec::len).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<SegmentRecord> {
        vec![
            SegmentRecord::new("common", None, "The river floods each spring."),
            SegmentRecord::new("regional", Some("North"), "The north gate sticks."),
            SegmentRecord::new("regional", Some("South"), "The south market opens at dawn."),
            SegmentRecord::new("special", Some("Harbor Watch"), "The watch password is 'gull'."),
            SegmentRecord::new("secret", None, "The magistrate forged the will."),
            SegmentRecord::new("common", None, "Bells ring at noon."),
        ]
    }

    #[test]
    fn test_load_keeps_order() {
        let kb = KnowledgeBase::from_records(&records()).unwrap();
        assert_eq!(kb.len(), 6);
        let ids: Vec<_> = kb.segments().iter().map(|s| s.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_tier_index() {
        let kb = KnowledgeBase::from_records(&records()).unwrap();
        let common: Vec<_> = kb.by_tier(Tier::Common).map(|s| s.text.as_str()).collect();
        assert_eq!(common, vec!["The river floods each spring.", "Bells ring at noon."]);
        assert_eq!(kb.tier_count(Tier::Regional), 2);
        assert_eq!(kb.tier_count(Tier::Secret), 1);
    }

    #[test]
    fn test_scoped_lookup() {
        let kb = KnowledgeBase::from_records(&records()).unwrap();
        let north: Vec<_> = kb.scoped(Tier::Regional, "North").collect();
        assert_eq!(north.len(), 1);
        assert_eq!(north[0].text, "The north gate sticks.");
        assert_eq!(kb.scoped(Tier::Special, "Harbor").count(), 0);
    }

    #[test]
    fn test_bad_row_fails_whole_load() {
        let mut rows = records();
        rows.push(SegmentRecord::new("classified", None, "?"));
        assert!(KnowledgeBase::from_records(&rows).is_err());
    }

    #[test]
    fn test_get_by_id() {
        let kb = KnowledgeBase::from_records(&records()).unwrap();
        assert_eq!(kb.get(SegmentId(4)).map(|s| s.tier), Some(Tier::Secret));
        assert!(kb.get(SegmentId(99)).is_none());
        assert!(KnowledgeBase::new().is_empty());
    }
}
