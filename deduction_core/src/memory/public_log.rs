//! The public log - the only channel through which information crosses characters.

use deduction_rules::{ActionPack, CharacterId, InteractionType};
use serde::{Deserialize, Serialize};

/// What a public log entry records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogBody {
    /// The moderator's scene announcement for a round.
    Scene { text: String },

    /// The public-safe part of a character's action.
    Action {
        character_id: CharacterId,
        turn: u32,
        interaction_type: InteractionType,
        spoken_content: Option<String>,
        action_content: Option<String>,
        targets: Vec<CharacterId>,
    },
}

/// One entry of the public log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicLogEntry {
    sequence: u64,
    round: u32,
    body: LogBody,
}

impl PublicLogEntry {
    /// Position in emission order, starting at zero.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn body(&self) -> &LogBody {
        &self.body
    }

    /// The acting character, for action entries.
    pub fn actor(&self) -> Option<&CharacterId> {
        match &self.body {
            LogBody::Action { character_id, .. } => Some(character_id),
            LogBody::Scene { .. } => None,
        }
    }

    /// Whether the entry names `id` as actor or target.
    pub fn involves(&self, id: &CharacterId) -> bool {
        match &self.body {
            LogBody::Action {
                character_id,
                targets,
                ..
            } => character_id == id || targets.contains(id),
            LogBody::Scene { .. } => false,
        }
    }

    /// Everything observable in this entry as one string.
    pub fn text(&self) -> String {
        match &self.body {
            LogBody::Scene { text } => text.clone(),
            LogBody::Action {
                spoken_content,
                action_content,
                ..
            } => [spoken_content.as_deref(), action_content.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// One-line rendering for summaries and transcripts.
    pub fn render(&self) -> String {
        match &self.body {
            LogBody::Scene { text } => format!("[round {}] scene: {}", self.round, text),
            LogBody::Action {
                character_id,
                spoken_content,
                action_content,
                targets,
                ..
            } => {
                let mut line = format!("[round {}] {}", self.round, character_id);
                if !targets.is_empty() {
                    let names: Vec<_> = targets.iter().map(CharacterId::as_str).collect();
                    line.push_str(&format!(" (to {})", names.join(", ")));
                }
                if let Some(words) = spoken_content {
                    line.push_str(&format!(" says: \"{}\"", words));
                }
                if let Some(deed) = action_content {
                    line.push_str(&format!(" [{}]", deed));
                }
                line
            }
        }
    }
}

/// Append-only, single-writer log of public events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicLog {
    entries: Vec<PublicLogEntry>,
}

impl PublicLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, round: u32, body: LogBody) -> u64 {
        let sequence = self.entries.len() as u64;
        self.entries.push(PublicLogEntry {
            sequence,
            round,
            body,
        });
        sequence
    }

    /// Append an already-scrubbed scene announcement.
    pub(crate) fn append_scene(&mut self, round: u32, text: impl Into<String>) -> u64 {
        self.push(round, LogBody::Scene { text: text.into() })
    }

    /// Append the public-safe fields of an action. Reasoning is dropped here.
    pub(crate) fn append_action(&mut self, action: &ActionPack) -> u64 {
        self.push(
            action.round,
            LogBody::Action {
                character_id: action.character_id.clone(),
                turn: action.turn,
                interaction_type: action.interaction_type,
                spoken_content: action.spoken_content.clone(),
                action_content: action.action_content.clone(),
                targets: action.targets.clone(),
            },
        )
    }

    pub fn entries(&self) -> &[PublicLogEntry] {
        &self.entries
    }

    /// Entries from `offset` on.
    pub fn since(&self, offset: usize) -> &[PublicLogEntry] {
        self.entries.get(offset..).unwrap_or(&[])
    }

    pub fn by_round(&self, round: u32) -> Vec<&PublicLogEntry> {
        self.entries.iter().filter(|e| e.round == round).collect()
    }

    pub fn by_character(&self, id: &CharacterId) -> Vec<&PublicLogEntry> {
        self.entries.iter().filter(|e| e.actor() == Some(id)).collect()
    }

    /// Entries whose observable text contains `keyword`.
    pub fn search(&self, keyword: &str) -> Vec<&PublicLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.text().contains(keyword))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render entries from `offset` on, one per line.
    pub fn summary_since(&self, offset: usize) -> String {
        self.since(offset)
            .iter()
            .map(PublicLogEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
