//! External collaborators: the per-character decision maker and the scene moderator.
//!
//! Both are unreliable services from the core's point of view. Their failures are
//! absorbed by the state machine, never propagated out of a round.

use async_trait::async_trait;
use deduction_rules::{ActionPack, GoalId, GoalStatus, ObjectiveFacts, SecretId};
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::visibility::{CharacterView, VisibleKnowledge};

/// Everything the decision maker gets for one turn attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub round: u32,
    pub turn: u32,
    /// 1 for the first try, 2 for the corrective retry, and so on.
    pub attempt: u32,
    pub view: CharacterView,
    /// Why the previous attempt was rejected.
    pub correction: Option<String>,
}

impl DecisionRequest {
    /// Prompt text for language-model backed decision makers.
    pub fn prompt(&self) -> String {
        let mut prompt = self.view.to_prompt_string();
        prompt.push_str(&format!("## Your Turn\nRound {}, turn {}.\n", self.round, self.turn));
        if let Some(correction) = &self.correction {
            prompt.push_str(&format!(
                "\nYour previous answer was rejected: {}\nAnswer again, fixing this.\n",
                correction
            ));
        }
        prompt
    }
}

/// A goal status change the character chose for itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalUpdate {
    pub goal_id: GoalId,
    pub status: GoalStatus,
}

/// The decision maker's full answer for one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnDecision {
    pub action: ActionPack,
    #[serde(default)]
    pub goal_updates: Vec<GoalUpdate>,
    /// Surfaceable secrets the character reveals this turn.
    #[serde(default)]
    pub disclosed_secrets: Vec<SecretId>,
    /// Lines appended to the character's working memory.
    #[serde(default)]
    pub memory_notes: Vec<String>,
    /// Replaces the working memory wholesale when present.
    #[serde(default)]
    pub working_summary: Option<String>,
}

impl TurnDecision {
    pub fn new(action: ActionPack) -> Self {
        Self {
            action,
            goal_updates: Vec::new(),
            disclosed_secrets: Vec::new(),
            memory_notes: Vec::new(),
            working_summary: None,
        }
    }

    pub fn with_goal_update(mut self, goal_id: impl Into<GoalId>, status: GoalStatus) -> Self {
        self.goal_updates.push(GoalUpdate {
            goal_id: goal_id.into(),
            status,
        });
        self
    }

    pub fn with_disclosure(mut self, secret_id: impl Into<SecretId>) -> Self {
        self.disclosed_secrets.push(secret_id.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.memory_notes.push(note.into());
        self
    }

    pub fn with_working_summary(mut self, summary: impl Into<String>) -> Self {
        self.working_summary = Some(summary.into());
        self
    }
}

/// Produces one character's decision per turn.
#[async_trait]
pub trait DecisionMaker: Send + Sync {
    async fn decide(&self, request: &DecisionRequest) -> CoreResult<TurnDecision>;
}

/// Privileged input for the scene announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeratorBriefing {
    pub round: u32,
    pub knowledge: VisibleKnowledge,
    pub objective_facts: ObjectiveFacts,
    pub ending_direction: String,
    /// Directives carried over from the previous assessment.
    pub directives: Vec<String>,
    /// Public log since the previous assessment, rendered.
    pub recent_events: String,
}

/// Public-only input for the round assessment. Carries no private memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicSummary {
    pub round: u32,
    pub rounds_completed: u32,
    pub max_rounds: u32,
    pub ending_direction: String,
    /// Public log since the previous assessment, rendered.
    pub summary: String,
}

/// The moderator's verdict on a finished round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub continue_session: bool,
    #[serde(default)]
    pub ending_direction_met: bool,
    #[serde(default)]
    pub summary: String,
    /// Steering for the next scene announcement.
    #[serde(default)]
    pub scene_directives: Vec<String>,
    /// Lets the scheduler skip idle characters next round.
    #[serde(default)]
    pub allow_partial_round: bool,
}

impl Assessment {
    /// Keep going with no further guidance.
    pub fn proceed(summary: impl Into<String>) -> Self {
        Self {
            continue_session: true,
            ending_direction_met: false,
            summary: summary.into(),
            scene_directives: Vec::new(),
            allow_partial_round: false,
        }
    }

    /// End the session.
    pub fn conclude(summary: impl Into<String>) -> Self {
        Self {
            continue_session: false,
            ..Self::proceed(summary)
        }
    }

    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.scene_directives.push(directive.into());
        self
    }

    pub fn allowing_partial_round(mut self) -> Self {
        self.allow_partial_round = true;
        self
    }
}

/// Announces scenes and judges rounds.
#[async_trait]
pub trait SceneModerator: Send + Sync {
    async fn announce_scene(&self, briefing: &ModeratorBriefing) -> CoreResult<String>;

    async fn assess_round(&self, summary: &PublicSummary) -> CoreResult<Assessment>;
}
