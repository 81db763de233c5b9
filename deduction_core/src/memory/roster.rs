//! Character roster - the repository of per-character state.
//!
//! Each character's dossier and private memory live in their own entry, keyed by id.
//! There is no shared pressure or goal map; every write replaces one character's
//! whole record.

use deduction_rules::{CharacterDossier, CharacterId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::PrivateMemoryRecord;
use crate::error::{CoreError, CoreResult};

/// One character's profile and private memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterEntry {
    /// Profile as loaded at initialization. Read-only afterwards.
    pub dossier: CharacterDossier,
    pub memory: PrivateMemoryRecord,
}

/// Repository of character entries, iterated in id order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterRoster {
    entries: BTreeMap<CharacterId, CharacterEntry>,
}

impl CharacterRoster {
    /// Build a roster, seeding each private record from its dossier.
    pub fn from_dossiers(
        dossiers: impl IntoIterator<Item = CharacterDossier>,
        default_threshold: u32,
    ) -> CoreResult<Self> {
        let mut entries = BTreeMap::new();
        for dossier in dossiers {
            let memory = PrivateMemoryRecord::seed(&dossier, default_threshold);
            let id = dossier.character_id.clone();
            if entries
                .insert(id.clone(), CharacterEntry { dossier, memory })
                .is_some()
            {
                return Err(CoreError::Configuration(format!(
                    "duplicate character '{}'",
                    id
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Rebuild a roster from persisted records. Every dossier needs a record.
    pub fn restore(
        dossiers: impl IntoIterator<Item = CharacterDossier>,
        mut records: BTreeMap<CharacterId, PrivateMemoryRecord>,
    ) -> CoreResult<Self> {
        let mut entries = BTreeMap::new();
        for dossier in dossiers {
            let id = dossier.character_id.clone();
            let memory = records
                .remove(&id)
                .ok_or_else(|| CoreError::Persistence(format!("no memory record for '{}'", id)))?;
            if memory.character_id != id {
                return Err(CoreError::Persistence(format!(
                    "memory record for '{}' belongs to '{}'",
                    id, memory.character_id
                )));
            }
            entries.insert(id, CharacterEntry { dossier, memory });
        }
        Ok(Self { entries })
    }

    pub fn ids(&self) -> impl Iterator<Item = &CharacterId> {
        self.entries.keys()
    }

    pub fn contains(&self, id: &CharacterId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, id: &CharacterId) -> CoreResult<&CharacterEntry> {
        self.entries
            .get(id)
            .ok_or_else(|| CoreError::character_not_found(id))
    }

    pub fn entries(&self) -> impl Iterator<Item = &CharacterEntry> {
        self.entries.values()
    }

    pub fn dossier(&self, id: &CharacterId) -> CoreResult<&CharacterDossier> {
        self.entry(id).map(|e| &e.dossier)
    }

    pub fn memory(&self, id: &CharacterId) -> CoreResult<&PrivateMemoryRecord> {
        self.entry(id).map(|e| &e.memory)
    }

    /// Replace a character's whole private record.
    pub(crate) fn rewrite(&mut self, record: PrivateMemoryRecord) -> CoreResult<()> {
        let entry = self
            .entries
            .get_mut(&record.character_id)
            .ok_or_else(|| CoreError::character_not_found(&record.character_id))?;
        entry.memory = record;
        Ok(())
    }

    /// Edit a copy of a character's record and write it back only if `edit` succeeds.
    pub(crate) fn update<T>(
        &mut self,
        id: &CharacterId,
        edit: impl FnOnce(&mut PrivateMemoryRecord) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let mut record = self.memory(id)?.clone();
        let result = edit(&mut record)?;
        self.rewrite(record)?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deduction_rules::{SecretEntry, SecretId};

    fn roster() -> CharacterRoster {
        CharacterRoster::from_dossiers(
            vec![
                CharacterDossier::new("mira", "I am Mira.")
                    .with_secret(SecretEntry::new("s1", "I sold the oil")),
                CharacterDossier::new("bram", "I am Bram."),
            ],
            80,
        )
        .unwrap()
    }

    #[test]
    fn test_ids_in_order() {
        let roster = roster();
        let ids: Vec<_> = roster.ids().map(CharacterId::as_str).collect();
        assert_eq!(ids, vec!["bram", "mira"]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = CharacterRoster::from_dossiers(
            vec![
                CharacterDossier::new("mira", "I am Mira."),
                CharacterDossier::new("mira", "Me again."),
            ],
            80,
        );
        assert!(matches!(result, Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_unknown_character() {
        let roster = roster();
        assert!(matches!(
            roster.memory(&CharacterId::from("ghost")),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_failed_update_leaves_record_untouched() {
        let mut roster = roster();
        let mira = CharacterId::from("mira");

        let result: CoreResult<()> = roster.update(&mira, |record| {
            record.note("should not persist");
            Err(CoreError::Collaborator("boom".into()))
        });
        assert!(result.is_err());
        assert!(roster.memory(&mira).unwrap().working.is_empty());

        roster
            .update(&mira, |record| {
                record.note("kept");
                Ok(())
            })
            .unwrap();
        assert_eq!(roster.memory(&mira).unwrap().working, "kept");
    }

    #[test]
    fn test_restore_requires_every_record() {
        let roster = roster();
        let dossiers: Vec<_> = roster.entries().map(|e| e.dossier.clone()).collect();
        let mut records: BTreeMap<_, _> = roster
            .entries()
            .map(|e| (e.memory.character_id.clone(), e.memory.clone()))
            .collect();

        let restored = CharacterRoster::restore(dossiers.clone(), records.clone()).unwrap();
        assert_eq!(
            restored
                .memory(&CharacterId::from("mira"))
                .unwrap()
                .secret(&SecretId::from("s1"))
                .unwrap()
                .threshold,
            80
        );

        records.remove(&CharacterId::from("bram"));
        assert!(CharacterRoster::restore(dossiers, records).is_err());
    }

    #[test]
    fn test_restore_rejects_foreign_record() {
        let roster = roster();
        let dossiers: Vec<_> = roster.entries().map(|e| e.dossier.clone()).collect();
        let mut records: BTreeMap<_, _> = roster
            .entries()
            .map(|e| (e.memory.character_id.clone(), e.memory.clone()))
            .collect();

        let mira_record = records[&CharacterId::from("mira")].clone();
        records.insert(CharacterId::from("bram"), mira_record);

        let result = CharacterRoster::restore(dossiers, records);
        assert!(matches!(
            result,
            Err(CoreError::Persistence(msg)) if msg.contains("belongs to 'mira'")
        ));
    }
}
