//! Action packs - what a character does with one turn.

use serde::{Deserialize, Serialize};

use super::CharacterId;
use crate::mechanics::InteractionType;

/// A character's output for one turn. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPack {
    pub character_id: CharacterId,
    pub round: u32,
    pub turn: u32,
    pub interaction_type: InteractionType,
    #[serde(default)]
    pub spoken_content: Option<String>,
    #[serde(default)]
    pub action_content: Option<String>,
    /// Private reasoning. Audit trail only, never relayed.
    #[serde(default)]
    pub inner_reasoning: String,
    #[serde(default)]
    pub targets: Vec<CharacterId>,
}

impl ActionPack {
    /// A speech-only action.
    pub fn speak(
        character_id: impl Into<CharacterId>,
        round: u32,
        turn: u32,
        words: impl Into<String>,
    ) -> Self {
        Self {
            character_id: character_id.into(),
            round,
            turn,
            interaction_type: InteractionType::Speak,
            spoken_content: Some(words.into()),
            action_content: None,
            inner_reasoning: String::new(),
            targets: Vec::new(),
        }
    }

    /// A physical action without speech.
    pub fn act(
        character_id: impl Into<CharacterId>,
        round: u32,
        turn: u32,
        deed: impl Into<String>,
    ) -> Self {
        Self {
            character_id: character_id.into(),
            round,
            turn,
            interaction_type: InteractionType::Action,
            spoken_content: None,
            action_content: Some(deed.into()),
            inner_reasoning: String::new(),
            targets: Vec::new(),
        }
    }

    /// Turn this into a composite action by adding a deed.
    pub fn with_action(mut self, deed: impl Into<String>) -> Self {
        self.action_content = Some(deed.into());
        if self.interaction_type == InteractionType::Speak {
            self.interaction_type = InteractionType::Composite;
        }
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.inner_reasoning = reasoning.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<CharacterId>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn targets_character(&self, id: &CharacterId) -> bool {
        self.targets.contains(id)
    }

    /// Spoken and acted content joined, i.e. everything others can observe.
    pub fn observable_text(&self) -> String {
        [self.spoken_content.as_deref(), self.action_content.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
