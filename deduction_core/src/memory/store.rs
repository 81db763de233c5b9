//! Persistence hooks for resumable sessions.
//!
//! The core decides *what* is saved and when; a [`SessionStore`] decides where.

use deduction_rules::{CharacterId, SessionId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::{InteractionLog, PrivateMemoryRecord, PublicLog};
use crate::error::CoreResult;
use crate::round::SessionSnapshot;

/// Read/write hooks for every persisted entity, keyed by session.
pub trait SessionStore {
    fn save_snapshot(&mut self, snapshot: &SessionSnapshot) -> CoreResult<()>;
    fn load_snapshot(&self, session: SessionId) -> CoreResult<Option<SessionSnapshot>>;

    fn save_public_log(&mut self, session: SessionId, log: &PublicLog) -> CoreResult<()>;
    fn load_public_log(&self, session: SessionId) -> CoreResult<Option<PublicLog>>;

    fn save_interaction_log(&mut self, session: SessionId, log: &InteractionLog)
        -> CoreResult<()>;
    fn load_interaction_log(&self, session: SessionId) -> CoreResult<Option<InteractionLog>>;

    fn save_private_memory(
        &mut self,
        session: SessionId,
        record: &PrivateMemoryRecord,
    ) -> CoreResult<()>;
    fn load_private_memory(
        &self,
        session: SessionId,
        character: &CharacterId,
    ) -> CoreResult<Option<PrivateMemoryRecord>>;
}

/// Store that keeps everything in process. Useful for tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    snapshots: HashMap<SessionId, SessionSnapshot>,
    public_logs: HashMap<SessionId, PublicLog>,
    interaction_logs: HashMap<SessionId, InteractionLog>,
    memories: HashMap<(SessionId, CharacterId), PrivateMemoryRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemoryStore {
    fn save_snapshot(&mut self, snapshot: &SessionSnapshot) -> CoreResult<()> {
        self.snapshots
            .insert(snapshot.session.session_id, snapshot.clone());
        Ok(())
    }

    fn load_snapshot(&self, session: SessionId) -> CoreResult<Option<SessionSnapshot>> {
        Ok(self.snapshots.get(&session).cloned())
    }

    fn save_public_log(&mut self, session: SessionId, log: &PublicLog) -> CoreResult<()> {
        self.public_logs.insert(session, log.clone());
        Ok(())
    }

    fn load_public_log(&self, session: SessionId) -> CoreResult<Option<PublicLog>> {
        Ok(self.public_logs.get(&session).cloned())
    }

    fn save_interaction_log(
        &mut self,
        session: SessionId,
        log: &InteractionLog,
    ) -> CoreResult<()> {
        self.interaction_logs.insert(session, log.clone());
        Ok(())
    }

    fn load_interaction_log(&self, session: SessionId) -> CoreResult<Option<InteractionLog>> {
        Ok(self.interaction_logs.get(&session).cloned())
    }

    fn save_private_memory(
        &mut self,
        session: SessionId,
        record: &PrivateMemoryRecord,
    ) -> CoreResult<()> {
        self.memories
            .insert((session, record.character_id.clone()), record.clone());
        Ok(())
    }

    fn load_private_memory(
        &self,
        session: SessionId,
        character: &CharacterId,
    ) -> CoreResult<Option<PrivateMemoryRecord>> {
        Ok(self.memories.get(&(session, character.clone())).cloned())
    }
}

/// Store that writes one pretty-printed JSON file per entity.
///
/// Layout: `<root>/<session>/{session,public_log,interaction_log}.json` and
/// `<root>/<session>/memory/<character>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn session_dir(&self, session: SessionId) -> PathBuf {
        self.root.join(session.to_string())
    }

    fn memory_path(&self, session: SessionId, character: &CharacterId) -> PathBuf {
        self.session_dir(session)
            .join("memory")
            .join(format!("{}.json", Self::file_stem(character)))
    }

    /// Injective file stem for a character id.
    ///
    /// Lowercase ASCII letters, digits and `-` pass through; every other byte becomes
    /// `_xx` (lowercase hex), so distinct ids never share a file, even on
    /// case-insensitive filesystems.
    fn file_stem(character: &CharacterId) -> String {
        let mut stem = String::with_capacity(character.as_str().len());
        for byte in character.as_str().bytes() {
            match byte {
                b'a'..=b'z' | b'0'..=b'9' | b'-' => stem.push(char::from(byte)),
                _ => stem.push_str(&format!("_{:02x}", byte)),
            }
        }
        stem
    }

    fn write_json<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(value)?)?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> CoreResult<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

impl SessionStore for JsonFileStore {
    fn save_snapshot(&mut self, snapshot: &SessionSnapshot) -> CoreResult<()> {
        let path = self
            .session_dir(snapshot.session.session_id)
            .join("session.json");
        Self::write_json(&path, snapshot)
    }

    fn load_snapshot(&self, session: SessionId) -> CoreResult<Option<SessionSnapshot>> {
        Self::read_json(&self.session_dir(session).join("session.json"))
    }

    fn save_public_log(&mut self, session: SessionId, log: &PublicLog) -> CoreResult<()> {
        Self::write_json(&self.session_dir(session).join("public_log.json"), log)
    }

    fn load_public_log(&self, session: SessionId) -> CoreResult<Option<PublicLog>> {
        Self::read_json(&self.session_dir(session).join("public_log.json"))
    }

    fn save_interaction_log(
        &mut self,
        session: SessionId,
        log: &InteractionLog,
    ) -> CoreResult<()> {
        Self::write_json(&self.session_dir(session).join("interaction_log.json"), log)
    }

    fn load_interaction_log(&self, session: SessionId) -> CoreResult<Option<InteractionLog>> {
        Self::read_json(&self.session_dir(session).join("interaction_log.json"))
    }

    fn save_private_memory(
        &mut self,
        session: SessionId,
        record: &PrivateMemoryRecord,
    ) -> CoreResult<()> {
        Self::write_json(&self.memory_path(session, &record.character_id), record)
    }

    fn load_private_memory(
        &self,
        session: SessionId,
        character: &CharacterId,
    ) -> CoreResult<Option<PrivateMemoryRecord>> {
        Self::read_json(&self.memory_path(session, character))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deduction_rules::{ActionPack, CharacterDossier};

    fn record() -> PrivateMemoryRecord {
        let mut record =
            PrivateMemoryRecord::seed(&CharacterDossier::new("old tom", "I am Tom."), 80);
        record.note("The bell rang twice.");
        record
    }

    fn exercise(store: &mut dyn SessionStore) {
        let session = SessionId::new();

        let mut log = PublicLog::new();
        log.append_action(&ActionPack::speak("old tom", 1, 0, "Evening."));
        store.save_public_log(session, &log).unwrap();
        assert_eq!(store.load_public_log(session).unwrap(), Some(log));

        store.save_private_memory(session, &record()).unwrap();
        let loaded = store
            .load_private_memory(session, &CharacterId::from("old tom"))
            .unwrap();
        assert_eq!(loaded, Some(record()));

        assert!(store.load_interaction_log(session).unwrap().is_none());
        assert!(store
            .load_private_memory(SessionId::new(), &CharacterId::from("old tom"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_in_memory_store() {
        exercise(&mut InMemoryStore::new());
    }

    #[test]
    fn test_json_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        exercise(&mut store);
    }

    #[test]
    fn test_json_file_names_are_sanitized() {
        let store = JsonFileStore::new("/tmp/sessions");
        let path = store.memory_path(SessionId::nil(), &CharacterId::from("../old tom"));
        assert!(path.ends_with("memory/_2e_2e_2fold_20tom.json"));
    }

    #[test]
    fn test_json_file_names_never_collide() {
        let ids = ["a.b", "a_b", "a b", "A_b", "a_2eb", "old tom", "old_tom"];
        let stems: std::collections::HashSet<_> = ids
            .iter()
            .map(|id| JsonFileStore::file_stem(&CharacterId::from(*id)))
            .collect();
        assert_eq!(stems.len(), ids.len());
    }

    #[test]
    fn test_json_file_store_keeps_lookalike_ids_apart() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path());
        let session = SessionId::new();

        let dot = PrivateMemoryRecord::seed(&CharacterDossier::new("a.b", "Dot."), 80);
        let under = PrivateMemoryRecord::seed(&CharacterDossier::new("a_b", "Under."), 80);
        store.save_private_memory(session, &dot).unwrap();
        store.save_private_memory(session, &under).unwrap();

        let loaded = store
            .load_private_memory(session, &CharacterId::from("a.b"))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.character_id, CharacterId::from("a.b"));
        assert_eq!(loaded, dot);
    }
}
