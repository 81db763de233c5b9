//! Secret Pressure - per character, per secret disclosure pressure.
//!
//! Pressure only ever changes through explicit events:
//! 1. **Event**: a narrative event is recognized during a turn
//! 2. **Delta**: the configured table maps the event to a pressure delta
//! 3. **Clamp**: pressure stays within `0..=threshold * cap_factor`
//! 4. **Gate**: at or above threshold the holder *may* disclose; nothing forces it
//! 5. **Reveal**: disclosure zeroes pressure and retires the secret for good

mod events;

pub use events::*;

use deduction_rules::{CharacterId, SecretId};
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::{CoreError, CoreResult};
use crate::memory::CharacterRoster;

/// Applies pressure events to secrets held in the roster.
#[derive(Debug, Clone)]
pub struct PressureTracker {
    table: PressureTable,
    cap_factor: u32,
}

impl PressureTracker {
    pub fn new(table: PressureTable, cap_factor: u32) -> Self {
        Self {
            table,
            cap_factor: cap_factor.max(1),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.pressure.clone(), config.pressure_cap_factor)
    }

    pub fn table(&self) -> &PressureTable {
        &self.table
    }

    /// Adjust a secret's pressure by `delta` and return the new value.
    ///
    /// Revealed secrets accept events but stay at zero.
    pub fn apply_event(
        &self,
        roster: &mut CharacterRoster,
        character: &CharacterId,
        secret: &SecretId,
        delta: i32,
    ) -> CoreResult<u32> {
        let cap_factor = self.cap_factor;
        roster.update(character, |record| {
            let entry = record
                .secret_mut(secret)
                .ok_or_else(|| CoreError::secret_not_found(character, secret))?;

            if entry.revealed {
                debug!(
                    character = %character,
                    secret = %secret,
                    delta,
                    "pressure event on revealed secret ignored"
                );
                return Ok(entry.pressure);
            }

            let cap = entry.threshold.saturating_mul(cap_factor) as i64;
            let before = entry.pressure;
            let after = (before as i64 + delta as i64).clamp(0, cap) as u32;
            entry.pressure = after;

            debug!(
                character = %character,
                secret = %secret,
                before,
                after,
                "secret pressure adjusted"
            );
            if before < entry.threshold && after >= entry.threshold {
                info!(
                    character = %character,
                    secret = %secret,
                    pressure = after,
                    threshold = entry.threshold,
                    "secret became surfaceable"
                );
            }

            Ok(after)
        })
    }

    /// Apply a narrative event through the delta table.
    pub fn apply(
        &self,
        roster: &mut CharacterRoster,
        character: &CharacterId,
        secret: &SecretId,
        event: PressureEvent,
    ) -> CoreResult<u32> {
        self.apply_event(roster, character, secret, self.table.delta(event))
    }

    /// Whether the holder is permitted to disclose the secret now.
    pub fn is_surfaceable(
        &self,
        roster: &CharacterRoster,
        character: &CharacterId,
        secret: &SecretId,
    ) -> CoreResult<bool> {
        let entry = roster
            .memory(character)?
            .secret(secret)
            .ok_or_else(|| CoreError::secret_not_found(character, secret))?;
        Ok(!entry.revealed && entry.pressure >= entry.threshold)
    }

    /// Mark a secret revealed and zero its pressure. Returns false if it already was.
    pub fn reveal(
        &self,
        roster: &mut CharacterRoster,
        character: &CharacterId,
        secret: &SecretId,
    ) -> CoreResult<bool> {
        roster.update(character, |record| {
            let entry = record
                .secret_mut(secret)
                .ok_or_else(|| CoreError::secret_not_found(character, secret))?;
            if entry.revealed {
                return Ok(false);
            }
            entry.revealed = true;
            entry.pressure = 0;
            info!(character = %character, secret = %secret, "secret revealed");
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deduction_rules::{CharacterDossier, SecretEntry};

    fn setup() -> (PressureTracker, CharacterRoster, CharacterId, SecretId) {
        let roster = CharacterRoster::from_dossiers(
            vec![CharacterDossier::new("mira", "I am Mira.")
                .with_secret(SecretEntry::new("oil", "I sold the lamp oil"))],
            80,
        )
        .unwrap();
        (
            PressureTracker::new(PressureTable::default(), 2),
            roster,
            CharacterId::from("mira"),
            SecretId::from("oil"),
        )
    }

    #[test]
    fn test_threshold_scenario() {
        let (tracker, mut roster, mira, oil) = setup();

        assert_eq!(tracker.apply_event(&mut roster, &mira, &oil, 50).unwrap(), 50);
        assert!(!tracker.is_surfaceable(&roster, &mira, &oil).unwrap());

        assert_eq!(tracker.apply_event(&mut roster, &mira, &oil, 50).unwrap(), 100);
        assert!(tracker.is_surfaceable(&roster, &mira, &oil).unwrap());

        assert!(tracker.reveal(&mut roster, &mira, &oil).unwrap());
        assert_eq!(roster.memory(&mira).unwrap().secret(&oil).unwrap().pressure, 0);
        assert!(!tracker.is_surfaceable(&roster, &mira, &oil).unwrap());
    }

    #[test]
    fn test_surfaceable_boundary() {
        let (tracker, mut roster, mira, oil) = setup();

        tracker.apply_event(&mut roster, &mira, &oil, 79).unwrap();
        assert!(!tracker.is_surfaceable(&roster, &mira, &oil).unwrap());

        tracker.apply_event(&mut roster, &mira, &oil, 1).unwrap();
        assert!(tracker.is_surfaceable(&roster, &mira, &oil).unwrap());
    }

    #[test]
    fn test_positive_deltas_never_decrease() {
        let (tracker, mut roster, mira, oil) = setup();
        let mut last = 0;
        for delta in [5, 0, 30, 17, 60, 90, 1] {
            let now = tracker.apply_event(&mut roster, &mira, &oil, delta).unwrap();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn test_clamped_to_cap_and_floor() {
        let (tracker, mut roster, mira, oil) = setup();
        assert_eq!(tracker.apply_event(&mut roster, &mira, &oil, 1000).unwrap(), 160);
        assert_eq!(tracker.apply_event(&mut roster, &mira, &oil, -1000).unwrap(), 0);
    }

    #[test]
    fn test_reveal_is_idempotent_and_events_still_work() {
        let (tracker, mut roster, mira, oil) = setup();
        tracker.apply_event(&mut roster, &mira, &oil, 90).unwrap();

        assert!(tracker.reveal(&mut roster, &mira, &oil).unwrap());
        assert!(!tracker.reveal(&mut roster, &mira, &oil).unwrap());

        assert_eq!(tracker.apply_event(&mut roster, &mira, &oil, 50).unwrap(), 0);
        assert_eq!(
            tracker.apply(&mut roster, &mira, &oil, PressureEvent::DirectQuestion).unwrap(),
            0
        );
        assert!(!tracker.is_surfaceable(&roster, &mira, &oil).unwrap());
    }

    #[test]
    fn test_unknown_secret_is_not_created() {
        let (tracker, mut roster, mira, _) = setup();
        let ghost = SecretId::from("ghost");

        assert!(matches!(
            tracker.apply_event(&mut roster, &mira, &ghost, 10),
            Err(CoreError::NotFound(_))
        ));
        assert!(matches!(
            tracker.is_surfaceable(&roster, &mira, &ghost),
            Err(CoreError::NotFound(_))
        ));
        assert!(roster.memory(&mira).unwrap().secret(&ghost).is_none());

        assert!(matches!(
            tracker.reveal(&mut roster, &CharacterId::from("nobody"), &ghost),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_table_driven_events() {
        let (tracker, mut roster, mira, oil) = setup();
        tracker.apply(&mut roster, &mira, &oil, PressureEvent::KeywordMention).unwrap();
        let now = tracker.apply(&mut roster, &mira, &oil, PressureEvent::DirectQuestion).unwrap();
        assert_eq!(now, 25);
    }
}
