//! Character dossier definitions.

use serde::{Deserialize, Serialize};

use super::{CharacterId, Goal, GoalId, SecretEntry, SecretId, TaggedInfo};
use crate::mechanics::KnowledgeLevel;

/// Everything a character starts a session with, written from its own perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterDossier {
    pub character_id: CharacterId,

    /// Display name; falls back to the id when empty.
    #[serde(default)]
    pub name: String,

    /// Declared access class as written in the setup, e.g. `special:Harbor Watch`.
    /// Resolved fail-safe by [`CharacterDossier::knowledge_level`].
    #[serde(default)]
    pub knowledge_level: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    #[serde(default)]
    pub affiliation: Option<String>,

    /// "Who I am", first person.
    pub core_identity: String,

    /// "What I make of this moment", first person.
    #[serde(default)]
    pub private_understanding: String,

    #[serde(default)]
    pub goals: Vec<Goal>,

    #[serde(default)]
    pub known_info: Vec<TaggedInfo>,

    #[serde(default)]
    pub secrets: Vec<SecretEntry>,
}

impl CharacterDossier {
    /// Create a new dossier with common knowledge and nothing else.
    pub fn new(character_id: impl Into<CharacterId>, core_identity: impl Into<String>) -> Self {
        Self {
            character_id: character_id.into(),
            name: String::new(),
            knowledge_level: Some(KnowledgeLevel::Common.to_string()),
            region: None,
            affiliation: None,
            core_identity: core_identity.into(),
            private_understanding: String::new(),
            goals: Vec::new(),
            known_info: Vec::new(),
            secrets: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_knowledge_level(mut self, level: impl Into<String>) -> Self {
        self.knowledge_level = Some(level.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = Some(affiliation.into());
        self
    }

    pub fn with_understanding(mut self, understanding: impl Into<String>) -> Self {
        self.private_understanding = understanding.into();
        self
    }

    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goals.push(goal);
        self
    }

    pub fn with_secret(mut self, secret: SecretEntry) -> Self {
        self.secrets.push(secret);
        self
    }

    pub fn with_info(mut self, info: TaggedInfo) -> Self {
        self.known_info.push(info);
        self
    }

    /// Name used when addressing the character in text.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.character_id.as_str()
        } else {
            &self.name
        }
    }

    /// Resolved knowledge level; missing or malformed declarations resolve to `Common`.
    pub fn knowledge_level(&self) -> KnowledgeLevel {
        KnowledgeLevel::resolve(self.knowledge_level.as_deref()).0
    }

    pub fn goal(&self, goal_id: &GoalId) -> Option<&Goal> {
        self.goals.iter().find(|g| &g.goal_id == goal_id)
    }

    pub fn secret(&self, secret_id: &SecretId) -> Option<&SecretEntry> {
        self.secrets.iter().find(|s| &s.secret_id == secret_id)
    }

    pub fn has_active_goal(&self) -> bool {
        self.goals.iter().any(Goal::is_active)
    }

    /// Stable background seeded into private memory at initialization.
    pub fn stable_memory(&self) -> String {
        let mut stable = self.core_identity.trim().to_string();
        if !self.private_understanding.trim().is_empty() {
            stable.push_str("\n\n");
            stable.push_str(self.private_understanding.trim());
        }
        stable
    }
}
