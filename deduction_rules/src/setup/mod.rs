//! Session setup - the structured output of the outline parser, loaded at initialization.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::entities::{CharacterDossier, CharacterId, TaggedInfo};
use crate::error::RulesError;

/// Purely objective facts about the opening scene. No character's opinion belongs here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveFacts {
    pub time_and_place: String,
    pub physical_state: String,
    pub interaction_basis: String,
    pub opening_event: String,
}

impl ObjectiveFacts {
    /// Labelled facts in a fixed order, skipping empty ones.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("Time and place", self.time_and_place.as_str()),
            ("Physical state", self.physical_state.as_str()),
            ("Interaction basis", self.interaction_basis.as_str()),
            ("Opening event", self.opening_event.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect()
    }

    /// Render the facts as a plain scene description.
    pub fn describe(&self) -> String {
        self.entries()
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The facts as public information every character starts out knowing.
    pub fn as_public_info(&self) -> Vec<TaggedInfo> {
        self.entries()
            .into_iter()
            .map(|(label, value)| TaggedInfo::public(format!("{}: {}", label, value), "objective_facts"))
            .collect()
    }
}

/// One row of world knowledge as written in the setup. The tier is parsed by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub tier: String,
    /// Region or affiliation for scoped tiers.
    #[serde(default)]
    pub scope: Option<String>,
    pub text: String,
}

impl SegmentRecord {
    pub fn new(tier: impl Into<String>, scope: Option<&str>, text: impl Into<String>) -> Self {
        Self {
            tier: tier.into(),
            scope: scope.map(str::to_string),
            text: text.into(),
        }
    }
}

/// Everything needed to start a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSetup {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub objective_facts: ObjectiveFacts,

    /// Where the story is meant to end up; the moderator judges whether it is met.
    #[serde(default)]
    pub ending_direction: String,

    /// Characters whose resolved goals end the session.
    #[serde(default)]
    pub protagonists: Vec<CharacterId>,

    #[serde(default)]
    pub knowledge: Vec<SegmentRecord>,

    #[serde(default)]
    pub characters: Vec<CharacterDossier>,
}

impl SessionSetup {
    /// Load a setup file. `.json` files are read as JSON, everything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self, RulesError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RulesError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, RulesError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn character_ids(&self) -> Vec<CharacterId> {
        self.characters.iter().map(|c| c.character_id.clone()).collect()
    }

    /// Structural validation of the cast. Knowledge tiers are validated by the core.
    pub fn validate(&self) -> Result<(), RulesError> {
        if self.characters.is_empty() {
            return Err(RulesError::InvalidSetup("no characters".to_string()));
        }

        let mut seen = HashSet::new();
        for dossier in &self.characters {
            let id = &dossier.character_id;
            if id.as_str().trim().is_empty() {
                return Err(RulesError::InvalidSetup("character with empty id".to_string()));
            }
            if !seen.insert(id) {
                return Err(RulesError::InvalidSetup(format!("duplicate character '{}'", id)));
            }
            if dossier.core_identity.trim().is_empty() {
                return Err(RulesError::InvalidSetup(format!(
                    "character '{}' has no core identity",
                    id
                )));
            }

            let mut goal_ids = HashSet::new();
            if dossier.goals.iter().any(|g| !goal_ids.insert(&g.goal_id)) {
                return Err(RulesError::InvalidSetup(format!(
                    "character '{}' has duplicate goal ids",
                    id
                )));
            }

            let mut secret_ids = HashSet::new();
            for secret in &dossier.secrets {
                if !secret_ids.insert(&secret.secret_id) {
                    return Err(RulesError::InvalidSetup(format!(
                        "character '{}' has duplicate secret '{}'",
                        id, secret.secret_id
                    )));
                }
                if secret.content.trim().is_empty() {
                    return Err(RulesError::InvalidSetup(format!(
                        "secret '{}' of '{}' is empty",
                        secret.secret_id, id
                    )));
                }
            }
        }

        if let Some(missing) = self.protagonists.iter().find(|p| !seen.contains(p)) {
            return Err(RulesError::InvalidSetup(format!(
                "protagonist '{}' is not in the cast",
                missing
            )));
        }

        Ok(())
    }
}
