//! Turn Order Scheduler - who acts when within a round.
//!
//! Priority is integer arithmetic over three signals, so identical inputs always give
//! identical orders:
//! - goal urgency: number of active goals
//! - secret pressure: per-mille of threshold reached, summed over unrevealed secrets
//! - recency: rounds since the character last acted, plus a boost once it is starving
//!
//! Ties are broken by character id, ascending.

use deduction_rules::CharacterId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::{CharacterRoster, PrivateMemoryRecord};
use crate::round::RoundState;

/// Tunable scheduler weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerWeights {
    /// Weight per active goal.
    pub goal_weight: u64,
    /// Weight per full threshold of accumulated pressure.
    pub pressure_weight: u64,
    /// Weight per round since the character last acted.
    pub recency_weight: u64,
    /// Rounds without a turn after which a character counts as starving.
    pub starvation_rounds: u32,
    /// Flat bonus for starving characters.
    pub starvation_boost: u64,
}

impl Default for SchedulerWeights {
    fn default() -> Self {
        Self {
            goal_weight: 10,
            pressure_weight: 20,
            recency_weight: 5,
            starvation_rounds: 2,
            starvation_boost: 50,
        }
    }
}

/// Computes turn order from round state and per-character records.
#[derive(Debug, Clone, Default)]
pub struct TurnScheduler {
    weights: SchedulerWeights,
}

impl TurnScheduler {
    pub fn new(weights: SchedulerWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &SchedulerWeights {
        &self.weights
    }

    /// Rounds since the character last took a turn. Never-acted counts from round zero.
    pub fn rounds_since_acted(record: &PrivateMemoryRecord, round_number: u32) -> u32 {
        round_number.saturating_sub(record.last_acted_round.unwrap_or(0))
    }

    /// Priority of one character in the given round.
    pub fn priority(&self, record: &PrivateMemoryRecord, round_number: u32) -> u64 {
        let w = &self.weights;

        let goals = record.active_goals().count() as u64;

        let permille: u64 = record
            .secrets
            .iter()
            .filter(|s| !s.revealed)
            .map(|s| s.pressure as u64 * 1000 / s.threshold.max(1) as u64)
            .sum();

        let idle = Self::rounds_since_acted(record, round_number);
        let starvation = if idle >= w.starvation_rounds {
            w.starvation_boost
        } else {
            0
        };

        w.goal_weight * goals
            + w.pressure_weight * permille / 1000
            + w.recency_weight * idle as u64
            + starvation
    }

    /// Order characters for a round.
    ///
    /// Every character is scheduled unless the round explicitly allows partial
    /// rounds, in which case characters with no active goal and no pending
    /// pressure sit the round out.
    pub fn compute_order(&self, round: &RoundState, roster: &CharacterRoster) -> Vec<CharacterId> {
        let mut ranked: Vec<(u64, &CharacterId)> = roster
            .entries()
            .filter(|entry| {
                !round.partial_round_allowed
                    || entry.memory.has_active_goal()
                    || entry.memory.has_pending_pressure()
            })
            .map(|entry| {
                (
                    self.priority(&entry.memory, round.round_number),
                    &entry.dossier.character_id,
                )
            })
            .collect();

        ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        debug!(
            round = round.round_number,
            order = ?ranked,
            "turn order computed"
        );

        ranked.into_iter().map(|(_, id)| id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deduction_rules::{CharacterDossier, Goal, GoalId, GoalStatus, SecretEntry, SecretId};

    fn roster() -> CharacterRoster {
        CharacterRoster::from_dossiers(
            vec![
                CharacterDossier::new("cole", "I am Cole.").with_goal(Goal::new("g", "Leave")),
                CharacterDossier::new("ada", "I am Ada.").with_goal(Goal::new("g", "Stay")),
                CharacterDossier::new("bram", "I am Bram.")
                    .with_goal(Goal::new("g", "Find the oil"))
                    .with_secret(SecretEntry::new("s", "I lit the fire")),
                CharacterDossier::new("idle", "I watch."),
            ],
            80,
        )
        .unwrap()
    }

    fn ids(order: &[CharacterId]) -> Vec<&str> {
        order.iter().map(CharacterId::as_str).collect()
    }

    #[test]
    fn test_ties_break_by_id() {
        let scheduler = TurnScheduler::default();
        let order = scheduler.compute_order(&RoundState::new(1), &roster());
        assert_eq!(ids(&order), vec!["ada", "bram", "cole", "idle"]);
    }

    #[test]
    fn test_deterministic() {
        let scheduler = TurnScheduler::default();
        let roster = roster();
        let state = RoundState::new(4);
        let first = scheduler.compute_order(&state, &roster);
        for _ in 0..10 {
            assert_eq!(scheduler.compute_order(&state, &roster), first);
        }
    }

    #[test]
    fn test_pressure_raises_priority() {
        let scheduler = TurnScheduler::default();
        let mut roster = roster();
        let bram = CharacterId::from("bram");
        roster
            .update(&bram, |record| {
                record.secret_mut(&SecretId::from("s")).unwrap().pressure = 80;
                Ok(())
            })
            .unwrap();

        let order = scheduler.compute_order(&RoundState::new(1), &roster);
        assert_eq!(order[0], bram);
    }

    #[test]
    fn test_recency_and_starvation() {
        let scheduler = TurnScheduler::default();
        let mut roster = roster();
        for id in ["ada", "bram"] {
            roster
                .update(&CharacterId::from(id), |record| {
                    record.last_acted_round = Some(3);
                    Ok(())
                })
                .unwrap();
        }
        roster
            .update(&CharacterId::from("cole"), |record| {
                record.last_acted_round = Some(1);
                Ok(())
            })
            .unwrap();

        let cole = roster.memory(&CharacterId::from("cole")).unwrap();
        assert_eq!(TurnScheduler::rounds_since_acted(cole, 4), 3);
        assert_eq!(scheduler.priority(cole, 4), 10 + 15 + 50);

        let order = scheduler.compute_order(&RoundState::new(4), &roster);
        assert_eq!(ids(&order), vec!["cole", "idle", "ada", "bram"]);
    }

    #[test]
    fn test_every_character_with_a_goal_is_scheduled() {
        let scheduler = TurnScheduler::default();
        let roster = roster();
        for round_number in 1..6 {
            let order = scheduler.compute_order(&RoundState::new(round_number), &roster);
            for entry in roster.entries().filter(|e| e.memory.has_active_goal()) {
                assert!(order.contains(&entry.dossier.character_id));
            }
        }
    }

    #[test]
    fn test_partial_round_skips_only_idle_characters() {
        let scheduler = TurnScheduler::default();
        let mut roster = roster();
        roster
            .update(&CharacterId::from("cole"), |record| {
                record.goal_mut(&GoalId::from("g")).unwrap().status = GoalStatus::Completed;
                Ok(())
            })
            .unwrap();

        let mut state = RoundState::new(2);
        assert_eq!(scheduler.compute_order(&state, &roster).len(), 4);

        state.partial_round_allowed = true;
        let order = scheduler.compute_order(&state, &roster);
        assert_eq!(ids(&order), vec!["ada", "bram"]);
    }
}
