//! Session mechanics: knowledge tiers, knowledge levels, interaction kinds.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::RulesError;

/// Accessibility class of a knowledge segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Known to everyone in the world.
    Common,
    /// Known to locals of one region.
    Regional,
    /// Known to members of one affiliation.
    Special,
    /// Never handed out in bulk; only the moderator reads it.
    Secret,
}

impl Tier {
    /// Whether segments of this tier must carry a scope key.
    pub fn requires_scope(&self) -> bool {
        matches!(self, Tier::Regional | Tier::Special)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Common => "common",
            Tier::Regional => "regional",
            Tier::Special => "special",
            Tier::Secret => "secret",
        }
    }
}

impl FromStr for Tier {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "common" => Ok(Tier::Common),
            "regional" => Ok(Tier::Regional),
            "special" => Ok(Tier::Special),
            "secret" => Ok(Tier::Secret),
            _ => Err(RulesError::UnknownTier(s.to_string())),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A character's declared access class.
///
/// Textual forms: `common`, `common+regional`, `special:<affiliation>`, `outsider`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum KnowledgeLevel {
    #[default]
    Common,
    CommonRegional,
    Special(String),
    /// A stranger to the setting: sees common knowledge only, even when placed in a region.
    Outsider,
}

impl KnowledgeLevel {
    /// Parse a declared level, falling back to `Common` when it is missing or malformed.
    ///
    /// Returns the level and whether the fallback was taken.
    pub fn resolve(declared: Option<&str>) -> (Self, bool) {
        match declared.map(str::parse::<KnowledgeLevel>) {
            Some(Ok(level)) => (level, false),
            _ => (KnowledgeLevel::Common, true),
        }
    }

    pub fn grants_regional(&self) -> bool {
        matches!(self, KnowledgeLevel::CommonRegional)
    }

    /// The affiliation whose special knowledge this level unlocks, if any.
    pub fn special_affiliation(&self) -> Option<&str> {
        match self {
            KnowledgeLevel::Special(affiliation) => Some(affiliation.as_str()),
            _ => None,
        }
    }
}

impl FromStr for KnowledgeLevel {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_ascii_lowercase();
        match lowered.as_str() {
            "common" => return Ok(KnowledgeLevel::Common),
            "common+regional" => return Ok(KnowledgeLevel::CommonRegional),
            "outsider" => return Ok(KnowledgeLevel::Outsider),
            _ => {}
        }

        if lowered.starts_with("special:") {
            let affiliation = trimmed["special:".len()..].trim();
            if !affiliation.is_empty() {
                return Ok(KnowledgeLevel::Special(affiliation.to_string()));
            }
        }

        Err(RulesError::InvalidKnowledgeLevel(s.to_string()))
    }
}

impl std::fmt::Display for KnowledgeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KnowledgeLevel::Common => write!(f, "common"),
            KnowledgeLevel::CommonRegional => write!(f, "common+regional"),
            KnowledgeLevel::Special(affiliation) => write!(f, "special:{}", affiliation),
            KnowledgeLevel::Outsider => write!(f, "outsider"),
        }
    }
}

/// How a character interacts during its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Speak,
    Action,
    /// Speaks and acts in the same turn.
    Composite,
}

impl InteractionType {
    pub fn requires_speech(&self) -> bool {
        matches!(self, InteractionType::Speak | InteractionType::Composite)
    }

    pub fn requires_action(&self) -> bool {
        matches!(self, InteractionType::Action | InteractionType::Composite)
    }
}

impl FromStr for InteractionType {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "speak" => Ok(InteractionType::Speak),
            "action" => Ok(InteractionType::Action),
            "composite" => Ok(InteractionType::Composite),
            _ => Err(RulesError::UnknownInteractionType(s.to_string())),
        }
    }
}

/// Lifecycle of a character goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

impl GoalStatus {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, GoalStatus::Active)
    }
}

/// Visibility tag on a piece of information a character holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InfoVisibility {
    Public,
    #[default]
    Private,
}
