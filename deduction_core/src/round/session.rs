//! Session state: the root object, per-round state, and the handoff transcript.

use deduction_rules::{CharacterId, SessionId, SessionSetup};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Assessment;
use crate::knowledge_base::KnowledgeBase;
use crate::memory::{InteractionLog, PublicLog};

/// Where the state machine stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Init,
    SceneAnnounce,
    /// Index into the round's turn order.
    CharacterTurn(usize),
    RoundAssess,
    Terminated,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// The moderator chose to stop.
    ModeratorDecision,
    /// The moderator judged the ending direction reached.
    EndingDirectionMet,
    /// Every protagonist goal is resolved.
    GoalsResolved,
    /// The configured round ceiling was reached.
    RoundLimit,
    /// Stopped by an external control signal.
    Cancelled,
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            EndReason::ModeratorDecision => "moderator decision",
            EndReason::EndingDirectionMet => "ending direction met",
            EndReason::GoalsResolved => "goals resolved",
            EndReason::RoundLimit => "round limit",
            EndReason::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// State of one round. Kept in the session history once the round ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundState {
    pub round_number: u32,
    pub turn_order: Vec<CharacterId>,
    pub scene: Option<String>,
    pub assessment: Option<Assessment>,
    /// Granted by the previous assessment; lets the scheduler skip idle characters.
    pub partial_round_allowed: bool,
}

impl RoundState {
    pub fn new(round_number: u32) -> Self {
        Self {
            round_number,
            ..Self::default()
        }
    }
}

/// The session root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: SessionId,
    pub title: String,
    pub characters: BTreeSet<CharacterId>,
    /// Rebuilt from the setup on resume.
    #[serde(skip)]
    pub knowledge_base: KnowledgeBase,
    pub rounds_completed: u32,
    pub terminated: bool,
    pub end_reason: Option<EndReason>,
}

/// Everything beyond logs and private memories needed to resume a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session: Session,
    pub setup: SessionSetup,
    pub phase: Phase,
    pub round: RoundState,
    pub history: Vec<RoundState>,
    /// Public log length at the previous assessment.
    pub last_assessed_offset: usize,
    /// Directives for the next scene announcement.
    pub pending_directives: Vec<String>,
    /// Targets of the latest accepted action in the current round.
    pub previous_targets: Vec<CharacterId>,
}

/// The handoff artifact of a terminated session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTranscript {
    pub session_id: SessionId,
    pub title: String,
    pub end_reason: Option<EndReason>,
    pub rounds_completed: u32,
    pub public_log: PublicLog,
    pub interaction_log: InteractionLog,
    pub assessments: Vec<Assessment>,
}

impl SessionTranscript {
    /// Plain-text raw interaction log.
    pub fn render(&self) -> String {
        let mut out = String::new();
        if !self.title.is_empty() {
            out.push_str(&format!("# {}\n\n", self.title));
        }
        out.push_str(&self.interaction_log.render());
        out.push_str(&format!(
            "\n\n-- ended after {} round(s): {}\n",
            self.rounds_completed,
            self.end_reason
                .map(|reason| reason.to_string())
                .unwrap_or_else(|| "in progress".to_string())
        ));
        out
    }
}
