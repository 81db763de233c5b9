//! The knowledge visibility filter.
//!
//! A pure function from (knowledge base, reader, context) to visible knowledge.

use deduction_rules::{CharacterDossier, CharacterId, KnowledgeLevel, Tier};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ModeratorPass;
use crate::knowledge_base::{KnowledgeBase, KnowledgeSegment};

/// Who is reading.
#[derive(Debug, Clone, Copy)]
pub enum Reader<'a> {
    Character(&'a CharacterDossier),
    /// Privileged reader. Requires a pass only the core can mint.
    Moderator(&'a ModeratorPass),
}

/// The scene and round a view is resolved for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewContext {
    pub round: u32,
    pub scene: Option<String>,
}

impl ViewContext {
    pub fn new(round: u32) -> Self {
        Self { round, scene: None }
    }

    pub fn with_scene(mut self, scene: impl Into<String>) -> Self {
        self.scene = Some(scene.into());
        self
    }
}

/// Knowledge a reader may see, in load order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleKnowledge {
    /// The reading character, `None` for the moderator.
    pub reader: Option<CharacterId>,
    /// Knowledge level the view was resolved with.
    pub level: Option<String>,
    pub segments: Vec<KnowledgeSegment>,
    pub scene: Option<String>,
    /// The declared level was missing or malformed and `common` was used instead.
    pub downgraded: bool,
}

impl VisibleKnowledge {
    pub fn contains_tier(&self, tier: Tier) -> bool {
        self.segments.iter().any(|s| s.tier == tier)
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|s| s.text.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Resolved access of a character reader.
struct CharacterAccess<'a> {
    level: KnowledgeLevel,
    region: Option<&'a str>,
}

impl CharacterAccess<'_> {
    fn admits(&self, segment: &KnowledgeSegment) -> bool {
        let scope = segment.scope_key.as_deref();
        match segment.tier {
            Tier::Common => true,
            Tier::Regional => {
                self.level.grants_regional() && self.region.is_some() && scope == self.region
            }
            Tier::Special => match self.level.special_affiliation() {
                Some(affiliation) => scope == Some(affiliation),
                None => false,
            },
            Tier::Secret => false,
        }
    }
}

/// Resolves views over one session's knowledge base.
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeFilter<'a> {
    knowledge: &'a KnowledgeBase,
}

impl<'a> KnowledgeFilter<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        Self { knowledge }
    }

    /// Compute what `reader` may see.
    ///
    /// Characters get `common` segments, `regional` segments for their own region when
    /// their level grants it, and `special` segments for the exact affiliation named by
    /// their level. `secret` segments are returned to the moderator only.
    pub fn resolve_view(&self, reader: Reader<'_>, context: &ViewContext) -> VisibleKnowledge {
        match reader {
            Reader::Moderator(_) => VisibleKnowledge {
                reader: None,
                level: None,
                segments: self.knowledge.segments().to_vec(),
                scene: context.scene.clone(),
                downgraded: false,
            },
            Reader::Character(dossier) => {
                let (level, downgraded) =
                    KnowledgeLevel::resolve(dossier.knowledge_level.as_deref());
                if downgraded {
                    warn!(
                        character = %dossier.character_id,
                        declared = ?dossier.knowledge_level,
                        "knowledge level missing or malformed, using common"
                    );
                }

                let access = CharacterAccess {
                    level,
                    region: dossier.region.as_deref(),
                };
                let segments = self
                    .knowledge
                    .segments()
                    .iter()
                    .filter(|segment| access.admits(segment))
                    .cloned()
                    .collect();

                VisibleKnowledge {
                    reader: Some(dossier.character_id.clone()),
                    level: Some(access.level.to_string()),
                    segments,
                    scene: context.scene.clone(),
                    downgraded,
                }
            }
        }
    }
}
