//! Goals, secrets and tagged information carried by a character.

use serde::{Deserialize, Serialize};

use super::{CharacterId, GoalId, SecretId};
use crate::mechanics::{GoalStatus, InfoVisibility};

/// Pressure at which a secret becomes surfaceable unless configured otherwise.
pub const DEFAULT_SECRET_THRESHOLD: u32 = 80;

/// Threshold value meaning "use the session default".
pub const INHERIT_THRESHOLD: u32 = 0;

/// An immediate, self-interested goal of a character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub goal_id: GoalId,
    #[serde(default)]
    pub status: GoalStatus,
    pub description: String,
}

impl Goal {
    /// Create a new active goal.
    pub fn new(goal_id: impl Into<GoalId>, description: impl Into<String>) -> Self {
        Self {
            goal_id: goal_id.into(),
            status: GoalStatus::Active,
            description: description.into(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == GoalStatus::Active
    }
}

/// A secret held by a character, with its disclosure pressure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretEntry {
    pub secret_id: SecretId,

    /// What the secret is. Never part of any other character's view.
    pub content: String,

    /// Words whose public mention pushes this secret toward the surface.
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub pressure: u32,

    /// Surfacing threshold; [`INHERIT_THRESHOLD`] takes the session default at initialization.
    #[serde(default)]
    pub threshold: u32,

    /// Set once the holder discloses the secret.
    #[serde(default)]
    pub revealed: bool,
}

impl SecretEntry {
    /// Create a new unrevealed secret with zero pressure and an inherited threshold.
    pub fn new(secret_id: impl Into<SecretId>, content: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            content: content.into(),
            keywords: Vec::new(),
            pressure: 0,
            threshold: INHERIT_THRESHOLD,
            revealed: false,
        }
    }

    /// Add trigger keywords.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }

    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Replace an inherited threshold with `default`.
    pub fn resolve_threshold(&mut self, default: u32) {
        if self.threshold == INHERIT_THRESHOLD {
            self.threshold = default;
        }
    }

    /// Whether the secret still carries pressure toward disclosure.
    pub fn is_pending(&self) -> bool {
        !self.revealed && self.pressure > 0
    }

    /// Whether any keyword occurs in `text`.
    pub fn mentioned_in(&self, text: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && text.contains(keyword.as_str()))
    }
}

/// A piece of information tagged with who may see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedInfo {
    pub content: String,
    #[serde(default)]
    pub visibility: InfoVisibility,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub known_by: Vec<CharacterId>,
}

impl TaggedInfo {
    /// Create information visible to everyone.
    pub fn public(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            visibility: InfoVisibility::Public,
            source: source.into(),
            known_by: Vec::new(),
        }
    }

    /// Create information visible only to the listed characters.
    pub fn private(
        content: impl Into<String>,
        source: impl Into<String>,
        known_by: impl IntoIterator<Item = CharacterId>,
    ) -> Self {
        Self {
            content: content.into(),
            visibility: InfoVisibility::Private,
            source: source.into(),
            known_by: known_by.into_iter().collect(),
        }
    }

    /// Whether `reader` may see this information.
    pub fn accessible_to(&self, reader: &CharacterId) -> bool {
        match self.visibility {
            InfoVisibility::Public => true,
            InfoVisibility::Private => self.known_by.contains(reader),
        }
    }
}
