//! Turn decision validation and leak auditing.

use deduction_rules::{CharacterId, InteractionType};
use tracing::warn;

use super::TurnDecision;
use crate::error::{CoreError, CoreResult};
use crate::memory::CharacterRoster;

/// The turn a decision must answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnSlot {
    pub character_id: CharacterId,
    pub round: u32,
    pub turn: u32,
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|text| !text.trim().is_empty())
}

/// Check a decision against the turn it answers.
///
/// Returns the first problem as a `MalformedAction`, worded so it can be sent back
/// to the decision maker as a correction.
pub fn validate_decision(
    decision: &TurnDecision,
    slot: &TurnSlot,
    roster: &CharacterRoster,
) -> CoreResult<()> {
    let actor = &slot.character_id;
    let action = &decision.action;
    let reject = |reason: String| Err(CoreError::malformed(actor, reason));

    if &action.character_id != actor {
        return reject(format!(
            "action is signed by '{}' but it is {}'s turn",
            action.character_id, actor
        ));
    }
    if action.round != slot.round || action.turn != slot.turn {
        return reject(format!(
            "action is for round {} turn {}, expected round {} turn {}",
            action.round, action.turn, slot.round, slot.turn
        ));
    }

    let kind = match action.interaction_type {
        InteractionType::Speak => "speak",
        InteractionType::Action => "action",
        InteractionType::Composite => "composite",
    };
    if action.interaction_type.requires_speech() && !has_text(&action.spoken_content) {
        return reject(format!("interaction type '{}' requires spoken content", kind));
    }
    if action.interaction_type.requires_action() && !has_text(&action.action_content) {
        return reject(format!("interaction type '{}' requires action content", kind));
    }
    if action.inner_reasoning.trim().is_empty() {
        return reject("inner reasoning is missing".to_string());
    }

    for target in &action.targets {
        if !roster.contains(target) {
            return reject(format!("unknown target '{}'", target));
        }
    }

    let memory = roster.memory(actor)?;
    for update in &decision.goal_updates {
        if memory.goal(&update.goal_id).is_none() {
            return reject(format!("'{}' is not one of your goals", update.goal_id));
        }
    }
    for secret_id in &decision.disclosed_secrets {
        match memory.secret(secret_id) {
            None => return reject(format!("'{}' is not one of your secrets", secret_id)),
            Some(secret) if secret.revealed => {
                return reject(format!("secret '{}' is already revealed", secret_id))
            }
            Some(secret) if secret.pressure < secret.threshold => {
                return reject(format!("secret '{}' cannot surface yet", secret_id))
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Report keywords of other characters' unrevealed secrets that the actor uses
/// without any accessible information mentioning them.
///
/// Findings are logged, not rejected: the actor may simply have guessed.
pub fn audit_leakage(decision: &TurnDecision, roster: &CharacterRoster) -> Vec<String> {
    let action = &decision.action;
    let text = action.observable_text();
    if text.is_empty() {
        return Vec::new();
    }
    let Ok(actor) = roster.dossier(&action.character_id) else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    for entry in roster.entries().filter(|e| e.dossier.character_id != actor.character_id) {
        for secret in entry.memory.secrets.iter().filter(|s| !s.revealed) {
            for keyword in secret
                .keywords
                .iter()
                .filter(|k| !k.is_empty() && text.contains(k.as_str()))
            {
                let known = actor
                    .known_info
                    .iter()
                    .any(|info| info.accessible_to(&actor.character_id) && info.content.contains(keyword.as_str()));
                if !known {
                    warn!(
                        actor = %actor.character_id,
                        keyword = %keyword,
                        owner = %entry.dossier.character_id,
                        secret = %secret.secret_id,
                        "possible information leak"
                    );
                    findings.push(format!(
                        "'{}' references '{}' from {}'s secret '{}' without access",
                        actor.character_id, keyword, entry.dossier.character_id, secret.secret_id
                    ));
                }
            }
        }
    }
    findings
}
