//! Narrative events that push secrets toward the surface.

use deduction_rules::{ActionPack, CharacterId, InteractionType, SecretId};
use serde::{Deserialize, Serialize};

use crate::memory::PrivateMemoryRecord;

/// Kinds of narrative pressure recognized during a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureEvent {
    /// Someone publicly mentioned the secret's subject.
    KeywordMention,
    /// Someone mentioned the subject while addressing the holder.
    DirectQuestion,
    /// Someone pressed the subject on the holder with words and deeds at once.
    EmotionalEscalation,
    /// The holder was singled out again by the very next turn.
    RepeatedProximity,
}

/// Event-to-delta table. Tuned through configuration, never in the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PressureTable {
    pub keyword_mention: i32,
    pub direct_question: i32,
    pub emotional_escalation: i32,
    pub repeated_proximity: i32,
}

impl Default for PressureTable {
    fn default() -> Self {
        Self {
            keyword_mention: 10,
            direct_question: 15,
            emotional_escalation: 5,
            repeated_proximity: 5,
        }
    }
}

impl PressureTable {
    pub fn delta(&self, event: PressureEvent) -> i32 {
        match event {
            PressureEvent::KeywordMention => self.keyword_mention,
            PressureEvent::DirectQuestion => self.direct_question,
            PressureEvent::EmotionalEscalation => self.emotional_escalation,
            PressureEvent::RepeatedProximity => self.repeated_proximity,
        }
    }
}

/// A recognized event against one secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PressureHit {
    pub holder: CharacterId,
    pub secret_id: SecretId,
    pub event: PressureEvent,
}

/// Recognize the events `action` causes against `holder`'s unrevealed secrets.
///
/// `targeted_previous_turn` is true when the holder was also a target of the
/// immediately preceding action in the same round. A character never pressures itself.
pub fn recognize_events(
    action: &ActionPack,
    holder: &PrivateMemoryRecord,
    targeted_previous_turn: bool,
) -> Vec<PressureHit> {
    if action.character_id == holder.character_id {
        return Vec::new();
    }

    let text = action.observable_text();
    let targeted = action.targets_character(&holder.character_id);
    let mut hits = Vec::new();

    for secret in holder.secrets.iter().filter(|s| !s.revealed) {
        let mut push = |event| {
            hits.push(PressureHit {
                holder: holder.character_id.clone(),
                secret_id: secret.secret_id.clone(),
                event,
            })
        };

        if secret.mentioned_in(&text) {
            if targeted {
                push(PressureEvent::DirectQuestion);
                if action.interaction_type == InteractionType::Composite {
                    push(PressureEvent::EmotionalEscalation);
                }
            } else {
                push(PressureEvent::KeywordMention);
            }
        }

        if targeted && targeted_previous_turn {
            push(PressureEvent::RepeatedProximity);
        }
    }

    hits
}
