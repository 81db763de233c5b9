//! Private memory - a character's exclusive record.

use deduction_rules::{CharacterDossier, CharacterId, Goal, GoalId, SecretEntry, SecretId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a character privately remembers. Only its owner ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMemoryRecord {
    pub character_id: CharacterId,

    /// Background that does not change during the session.
    pub stable: String,

    /// Running notes about the session so far, newest last.
    pub working: String,

    pub goals: Vec<Goal>,
    pub secrets: Vec<SecretEntry>,

    /// Round in which the character last took a turn.
    pub last_acted_round: Option<u32>,

    /// Public log length the character had seen when its last turn ended.
    pub last_public_offset: usize,

    /// Reasoning behind the character's previous action.
    pub last_inner_reasoning: String,
}

impl PrivateMemoryRecord {
    /// Seed a record from a dossier, giving inherited thresholds the session default.
    pub fn seed(dossier: &CharacterDossier, default_threshold: u32) -> Self {
        let secrets = dossier
            .secrets
            .iter()
            .cloned()
            .map(|mut secret| {
                secret.resolve_threshold(default_threshold);
                secret
            })
            .collect();

        Self {
            character_id: dossier.character_id.clone(),
            stable: dossier.stable_memory(),
            working: String::new(),
            goals: dossier.goals.clone(),
            secrets,
            last_acted_round: None,
            last_public_offset: 0,
            last_inner_reasoning: String::new(),
        }
    }

    pub fn goal(&self, goal_id: &GoalId) -> Option<&Goal> {
        self.goals.iter().find(|g| &g.goal_id == goal_id)
    }

    pub fn goal_mut(&mut self, goal_id: &GoalId) -> Option<&mut Goal> {
        self.goals.iter_mut().find(|g| &g.goal_id == goal_id)
    }

    pub fn secret(&self, secret_id: &SecretId) -> Option<&SecretEntry> {
        self.secrets.iter().find(|s| &s.secret_id == secret_id)
    }

    pub fn secret_mut(&mut self, secret_id: &SecretId) -> Option<&mut SecretEntry> {
        self.secrets.iter_mut().find(|s| &s.secret_id == secret_id)
    }

    pub fn active_goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.iter().filter(|g| g.is_active())
    }

    pub fn has_active_goal(&self) -> bool {
        self.active_goals().next().is_some()
    }

    /// True when there are goals and none of them is still active.
    pub fn goals_resolved(&self) -> bool {
        !self.goals.is_empty() && !self.has_active_goal()
    }

    /// Whether any unrevealed secret carries pressure.
    pub fn has_pending_pressure(&self) -> bool {
        self.secrets.iter().any(SecretEntry::is_pending)
    }

    /// Current pressure per secret.
    pub fn pressure_snapshot(&self) -> BTreeMap<SecretId, u32> {
        self.secrets
            .iter()
            .map(|s| (s.secret_id.clone(), s.pressure))
            .collect()
    }

    /// Unrevealed secrets at or above their threshold.
    pub fn surfaceable_secrets(&self) -> impl Iterator<Item = &SecretEntry> {
        self.secrets
            .iter()
            .filter(|s| !s.revealed && s.pressure >= s.threshold)
    }

    /// Append a line to working memory.
    pub fn note(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref().trim();
        if line.is_empty() {
            return;
        }
        if !self.working.is_empty() {
            self.working.push('\n');
        }
        self.working.push_str(line);
    }
}
