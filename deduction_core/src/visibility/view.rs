//! Character view assembly - everything one character may perceive before acting.

use deduction_rules::{CharacterDossier, CharacterId, SecretId, TaggedInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{KnowledgeFilter, Reader, ViewContext, VisibleKnowledge};
use crate::knowledge_base::KnowledgeBase;
use crate::memory::{PrivateMemoryRecord, PublicLog, PublicLogEntry};

/// The assembled input for one character's decision.
///
/// Built only from public state and the character's own record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterView {
    pub character_id: CharacterId,
    pub name: String,
    pub knowledge: VisibleKnowledge,
    /// Public entries other than the character's own actions, in emission order.
    pub public_entries: Vec<PublicLogEntry>,
    pub memory: PrivateMemoryRecord,
    pub pressure: BTreeMap<SecretId, u32>,
    /// Secrets the character may now choose to disclose.
    pub surfaceable: Vec<SecretId>,
    /// Tagged information accessible to the character.
    pub known_info: Vec<TaggedInfo>,
}

impl CharacterView {
    /// Assemble the view of `dossier`'s owner from its own memory and the public log.
    pub fn assemble(
        knowledge: &KnowledgeBase,
        dossier: &CharacterDossier,
        memory: &PrivateMemoryRecord,
        log: &PublicLog,
        context: &ViewContext,
    ) -> Self {
        let knowledge =
            KnowledgeFilter::new(knowledge).resolve_view(Reader::Character(dossier), context);
        let id = &dossier.character_id;

        Self {
            character_id: id.clone(),
            name: dossier.display_name().to_string(),
            knowledge,
            public_entries: log
                .entries()
                .iter()
                .filter(|e| e.actor() != Some(id))
                .cloned()
                .collect(),
            memory: memory.clone(),
            pressure: memory.pressure_snapshot(),
            surfaceable: memory
                .surfaceable_secrets()
                .map(|s| s.secret_id.clone())
                .collect(),
            known_info: dossier
                .known_info
                .iter()
                .filter(|info| info.accessible_to(id))
                .cloned()
                .collect(),
        }
    }

    /// Format the view as a prompt for the decision collaborator.
    pub fn to_prompt_string(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!("## You are {}\n", self.name));
        prompt.push_str(&self.memory.stable);
        prompt.push_str("\n\n");

        if let Some(scene) = &self.knowledge.scene {
            prompt.push_str("## Current Scene\n");
            prompt.push_str(scene);
            prompt.push_str("\n\n");
        }

        if !self.knowledge.is_empty() {
            prompt.push_str("## What You Know Of The World\n");
            for text in self.knowledge.texts() {
                prompt.push_str(&format!("- {}\n", text));
            }
            prompt.push('\n');
        }

        if !self.known_info.is_empty() {
            prompt.push_str("## Things You Have Learned\n");
            for info in &self.known_info {
                prompt.push_str(&format!("- {}\n", info.content));
            }
            prompt.push('\n');
        }

        if !self.public_entries.is_empty() {
            prompt.push_str("## What Others Have Said And Done\n");
            for entry in &self.public_entries {
                prompt.push_str(&entry.render());
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        if !self.memory.working.is_empty() {
            prompt.push_str("## Your Notes\n");
            prompt.push_str(&self.memory.working);
            prompt.push_str("\n\n");
        }

        let goals: Vec<_> = self.memory.active_goals().collect();
        if !goals.is_empty() {
            prompt.push_str("## Your Goals\n");
            for goal in goals {
                prompt.push_str(&format!("- [{}] {}\n", goal.goal_id, goal.description));
            }
            prompt.push('\n');
        }

        let secrets: Vec<_> = self.memory.secrets.iter().filter(|s| !s.revealed).collect();
        if !secrets.is_empty() {
            prompt.push_str("## Your Secrets\n");
            for secret in secrets {
                let marker = if self.surfaceable.contains(&secret.secret_id) {
                    " (you may now reveal this)"
                } else {
                    ""
                };
                prompt.push_str(&format!(
                    "- [{}] {} - pressure {}/{}{}\n",
                    secret.secret_id, secret.content, secret.pressure, secret.threshold, marker
                ));
            }
            prompt.push('\n');
        }

        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CharacterRoster;
    use deduction_rules::{ActionPack, Goal, SecretEntry, SegmentRecord};

    fn setup() -> (KnowledgeBase, CharacterRoster, PublicLog) {
        let kb = KnowledgeBase::from_records(&[
            SegmentRecord::new("common", None, "The lighthouse is dark."),
            SegmentRecord::new("secret", None, "The keeper was paid to let it go dark."),
        ])
        .unwrap();

        let roster = CharacterRoster::from_dossiers(
            vec![
                CharacterDossier::new("mira", "I am Mira, the keeper's niece.")
                    .with_name("Mira")
                    .with_goal(Goal::new("g1", "Learn who paid my uncle"))
                    .with_secret(SecretEntry::new("oil", "I sold the lamp oil"))
                    .with_info(TaggedInfo::private("Bram owes money", "rumour", [CharacterId::from("mira")]))
                    .with_info(TaggedInfo::private("Mira lies", "gossip", [CharacterId::from("bram")])),
                CharacterDossier::new("bram", "I am Bram.")
                    .with_secret(SecretEntry::new("debt", "I owe the mayor")),
            ],
            80,
        )
        .unwrap();

        let mut log = PublicLog::new();
        log.append_scene(1, "A storm rolls in.");
        log.append_action(&ActionPack::speak("mira", 1, 0, "Who was on watch?"));
        log.append_action(
            &ActionPack::speak("bram", 1, 1, "Not me.").with_reasoning("It was me, in fact."),
        );

        (kb, roster, log)
    }

    fn mira_view() -> CharacterView {
        let (kb, roster, log) = setup();
        let mira = CharacterId::from("mira");
        CharacterView::assemble(
            &kb,
            roster.dossier(&mira).unwrap(),
            roster.memory(&mira).unwrap(),
            &log,
            &ViewContext::new(1).with_scene("A storm rolls in."),
        )
    }

    #[test]
    fn test_view_contents() {
        let view = mira_view();

        assert_eq!(view.knowledge.texts().collect::<Vec<_>>(), vec!["The lighthouse is dark."]);
        assert_eq!(view.public_entries.len(), 2);
        assert!(view.public_entries.iter().all(|e| e.actor().map(CharacterId::as_str) != Some("mira")));
        assert_eq!(view.known_info.len(), 1);
        assert_eq!(view.known_info[0].content, "Bram owes money");
        assert_eq!(view.pressure[&SecretId::from("oil")], 0);
        assert!(view.surfaceable.is_empty());
    }

    #[test]
    fn test_prompt_never_leaks() {
        let prompt = mira_view().to_prompt_string();

        assert!(prompt.contains("## You are Mira"));
        assert!(prompt.contains("I sold the lamp oil"));
        assert!(prompt.contains("Learn who paid my uncle"));
        assert!(prompt.contains("bram says: \"Not me.\""));

        assert!(!prompt.contains("paid to let it go dark"));
        assert!(!prompt.contains("I owe the mayor"));
        assert!(!prompt.contains("It was me, in fact."));
        assert!(!prompt.contains("Mira lies"));
    }

    #[test]
    fn test_surfaceable_marked() {
        let (kb, mut roster, log) = setup();
        let mira = CharacterId::from("mira");
        roster
            .update(&mira, |record| {
                record.secret_mut(&SecretId::from("oil")).unwrap().pressure = 85;
                Ok(())
            })
            .unwrap();

        let view = CharacterView::assemble(
            &kb,
            roster.dossier(&mira).unwrap(),
            roster.memory(&mira).unwrap(),
            &log,
            &ViewContext::new(2),
        );
        assert_eq!(view.surfaceable, vec![SecretId::from("oil")]);
        assert!(view.to_prompt_string().contains("(you may now reveal this)"));
    }
}
