//! The interaction log - the raw audit trail handed to the polishing stage.

use deduction_rules::{ActionPack, CharacterId, GoalId, GoalStatus, SecretId};
use serde::{Deserialize, Serialize};

/// One audited event of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionRecord {
    /// A scene announced by the moderator.
    Scene { round: u32, text: String },

    /// An accepted action, including its private reasoning.
    Action { action: ActionPack, attempts: u32 },

    /// A turn the character lost after exhausting its attempts.
    Skipped {
        character_id: CharacterId,
        round: u32,
        turn: u32,
        reason: String,
    },

    /// A goal status change chosen by its owner.
    Goal {
        character_id: CharacterId,
        round: u32,
        goal_id: GoalId,
        status: GoalStatus,
    },

    /// A secret its holder chose to disclose.
    Disclosure {
        character_id: CharacterId,
        round: u32,
        secret_id: SecretId,
    },

    /// The moderator's judgment at the end of a round.
    Assessment {
        round: u32,
        summary: String,
        continue_session: bool,
    },
}

impl InteractionRecord {
    pub fn round(&self) -> u32 {
        match self {
            InteractionRecord::Scene { round, .. }
            | InteractionRecord::Skipped { round, .. }
            | InteractionRecord::Goal { round, .. }
            | InteractionRecord::Disclosure { round, .. }
            | InteractionRecord::Assessment { round, .. } => *round,
            InteractionRecord::Action { action, .. } => action.round,
        }
    }

    fn render(&self) -> String {
        match self {
            InteractionRecord::Scene { round, text } => {
                format!("== Round {} ==\n{}", round, text)
            }
            InteractionRecord::Action { action, attempts } => {
                let mut out = format!("{} ({:?})", action.character_id, action.interaction_type);
                if !action.targets.is_empty() {
                    let names: Vec<_> = action.targets.iter().map(CharacterId::as_str).collect();
                    out.push_str(&format!(" -> {}", names.join(", ")));
                }
                if let Some(words) = &action.spoken_content {
                    out.push_str(&format!("\n  says: {}", words));
                }
                if let Some(deed) = &action.action_content {
                    out.push_str(&format!("\n  does: {}", deed));
                }
                if !action.inner_reasoning.is_empty() {
                    out.push_str(&format!("\n  thinks: {}", action.inner_reasoning));
                }
                if *attempts > 1 {
                    out.push_str(&format!("\n  (accepted on attempt {})", attempts));
                }
                out
            }
            InteractionRecord::Skipped {
                character_id,
                reason,
                ..
            } => format!("{} loses the turn ({})", character_id, reason),
            InteractionRecord::Goal {
                character_id,
                goal_id,
                status,
                ..
            } => format!("{} marks goal {} as {:?}", character_id, goal_id, status),
            InteractionRecord::Disclosure {
                character_id,
                secret_id,
                ..
            } => format!("{} discloses secret {}", character_id, secret_id),
            InteractionRecord::Assessment {
                summary,
                continue_session,
                ..
            } => format!(
                "-- moderator: {} ({})",
                summary,
                if *continue_session { "continue" } else { "end" }
            ),
        }
    }
}

/// Full, ordered audit trail of a session. Never shown to characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionLog {
    records: Vec<InteractionRecord>,
}

impl InteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, record: InteractionRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[InteractionRecord] {
        &self.records
    }

    /// Accepted actions only.
    pub fn actions(&self) -> impl Iterator<Item = &ActionPack> {
        self.records.iter().filter_map(|r| match r {
            InteractionRecord::Action { action, .. } => Some(action),
            _ => None,
        })
    }

    pub fn skipped_turns(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, InteractionRecord::Skipped { .. }))
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Plain-text raw interaction log.
    pub fn render(&self) -> String {
        self.records
            .iter()
            .map(InteractionRecord::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
