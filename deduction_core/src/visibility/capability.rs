//! Moderator capabilities: privileged read, filtered write.
//!
//! Reading everything and writing to the public log are two separate interfaces.
//! Anything the moderator writes passes through [`PublicRelay`], which scrubs
//! secret-tier knowledge and unrevealed secrets before the log sees it.

use tracing::debug;

use super::{KnowledgeFilter, Reader, ViewContext, VisibleKnowledge};
use crate::knowledge_base::KnowledgeBase;
use crate::memory::{CharacterRoster, PublicLog};
use deduction_rules::Tier;

/// Replacement text for scrubbed material.
pub const REDACTED: &str = "[redacted]";

/// Proof of moderator privilege.
#[derive(Debug)]
pub struct ModeratorPass {
    _private: (),
}

impl ModeratorPass {
    pub(crate) fn mint() -> Self {
        Self { _private: () }
    }
}

/// Read access to the full knowledge base.
pub trait PrivilegedReader {
    fn privileged_view(&self, context: &ViewContext) -> VisibleKnowledge;
}

/// The only way moderator output reaches the public log.
pub trait PublicWriter {
    /// Publish a scene announcement for `round`. Returns the entry's sequence number.
    fn publish_scene(&mut self, round: u32, text: &str) -> u64;
}

/// The moderator's read side.
#[derive(Debug)]
pub struct ModeratorDesk<'a> {
    pass: &'a ModeratorPass,
    knowledge: &'a KnowledgeBase,
}

impl<'a> ModeratorDesk<'a> {
    pub fn new(pass: &'a ModeratorPass, knowledge: &'a KnowledgeBase) -> Self {
        Self { pass, knowledge }
    }
}

impl PrivilegedReader for ModeratorDesk<'_> {
    fn privileged_view(&self, context: &ViewContext) -> VisibleKnowledge {
        KnowledgeFilter::new(self.knowledge).resolve_view(Reader::Moderator(self.pass), context)
    }
}

/// Scrubbing writer over the public log.
#[derive(Debug)]
pub struct PublicRelay<'a> {
    log: &'a mut PublicLog,
    redactions: Vec<String>,
}

impl<'a> PublicRelay<'a> {
    /// Collect everything that must never be relayed: secret-tier segment text and
    /// the content of every unrevealed secret in the roster.
    pub(crate) fn new(
        log: &'a mut PublicLog,
        knowledge: &KnowledgeBase,
        roster: &CharacterRoster,
    ) -> Self {
        let mut redactions: Vec<String> = knowledge
            .by_tier(Tier::Secret)
            .map(|s| s.text.trim().to_string())
            .chain(
                roster
                    .entries()
                    .flat_map(|e| e.memory.secrets.iter())
                    .filter(|s| !s.revealed)
                    .map(|s| s.content.trim().to_string()),
            )
            .filter(|text| !text.is_empty())
            .collect();

        // Longest first so a passage containing a shorter one is removed whole.
        redactions.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        redactions.dedup();

        Self { log, redactions }
    }

    /// Remove every protected passage from `text`.
    pub fn scrub(&self, text: &str) -> String {
        let mut scrubbed = text.to_string();
        for passage in &self.redactions {
            if scrubbed.contains(passage.as_str()) {
                debug!(length = passage.len(), "protected passage scrubbed from relay");
                scrubbed = scrubbed.replace(passage.as_str(), REDACTED);
            }
        }
        scrubbed
    }
}

impl PublicWriter for PublicRelay<'_> {
    fn publish_scene(&mut self, round: u32, text: &str) -> u64 {
        let scrubbed = self.scrub(text);
        self.log.append_scene(round, scrubbed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deduction_rules::{CharacterDossier, SecretEntry, SegmentRecord};

    fn knowledge() -> KnowledgeBase {
        KnowledgeBase::from_records(&[
            SegmentRecord::new("common", None, "The docks are quiet."),
            SegmentRecord::new("secret", None, "The mayor drowned the ferryman."),
        ])
        .unwrap()
    }

    fn roster(revealed: bool) -> CharacterRoster {
        let mut secret = SecretEntry::new("oil", "Mira sold the lamp oil");
        secret.revealed = revealed;
        CharacterRoster::from_dossiers(
            vec![CharacterDossier::new("mira", "I am Mira.").with_secret(secret)],
            80,
        )
        .unwrap()
    }

    #[test]
    fn test_privileged_read_then_filtered_write() {
        let kb = knowledge();
        let pass = ModeratorPass::mint();
        let desk = ModeratorDesk::new(&pass, &kb);
        let view = desk.privileged_view(&ViewContext::new(1));
        assert!(view.contains_tier(Tier::Secret));

        // The moderator naively echoes everything it read.
        let announcement = view.texts().collect::<Vec<_>>().join(" ");

        let mut log = PublicLog::new();
        let roster = roster(false);
        PublicRelay::new(&mut log, &kb, &roster).publish_scene(1, &announcement);

        let published = log.entries()[0].text();
        assert_eq!(published, format!("The docks are quiet. {}", REDACTED));
        assert!(!published.contains("ferryman"));
    }

    #[test]
    fn test_unrevealed_secrets_scrubbed() {
        let kb = knowledge();
        let mut log = PublicLog::new();
        let roster = roster(false);
        let mut relay = PublicRelay::new(&mut log, &kb, &roster);
        relay.publish_scene(1, "Rumour says Mira sold the lamp oil.");
        assert_eq!(log.entries()[0].text(), format!("Rumour says {}.", REDACTED));
    }

    #[test]
    fn test_revealed_secrets_pass_through() {
        let kb = knowledge();
        let mut log = PublicLog::new();
        let roster = roster(true);
        PublicRelay::new(&mut log, &kb, &roster)
            .publish_scene(2, "Everyone now knows Mira sold the lamp oil.");
        assert!(log.entries()[0].text().contains("Mira sold the lamp oil"));
    }
}
