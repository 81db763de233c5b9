//! Scripted collaborators and fixtures shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use deduction_core::{
    Assessment, CoreError, CoreResult, DecisionMaker, DecisionRequest, ModeratorBriefing,
    PublicSummary, SceneModerator, SessionConfig, TurnDecision,
};
use deduction_rules::{ActionPack, CharacterId, SessionSetup};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LANTERN_HOUSE: &str = r#"
title = "The Lantern House"
ending_direction = "The one who doused the lamp is named aloud"

[objective_facts]
time_and_place = "Midnight, the lantern house on the pier"
physical_state = "The great lamp is cold and the oil store is empty"
opening_event = "A ship ran aground because the lamp went dark"

[[knowledge]]
tier = "common"
text = "The lamp has burned every night for a hundred years."

[[knowledge]]
tier = "regional"
scope = "North"
text = "Northerners never cross the pier after dusk."

[[knowledge]]
tier = "special"
scope = "Harbor Watch"
text = "The watch log for tonight has a torn page."

[[knowledge]]
tier = "secret"
text = "The harbor master paid to have the lamp go dark."

[[characters]]
character_id = "mira"
name = "Mira"
knowledge_level = "common+regional"
region = "North"
core_identity = "I am Mira, keeper of the lamp."

[[characters.goals]]
goal_id = "g1"
description = "Find out who doused the lamp"

[[characters.secrets]]
secret_id = "oil"
content = "I sold the lamp oil to a smuggler"
keywords = ["oil"]
threshold = 30

[[characters]]
character_id = "bram"
name = "Bram"
knowledge_level = "special:Harbor Watch"
core_identity = "I am Bram of the harbor watch."

[[characters.goals]]
goal_id = "g1"
description = "Keep the watch out of trouble"

[[characters.secrets]]
secret_id = "page"
content = "I tore the page from the watch log"
keywords = ["log"]

[[characters]]
character_id = "tess"
name = "Tess"
knowledge_level = "outsider"
region = "North"
core_identity = "I am Tess, a passenger off the wrecked ship."

[[characters.goals]]
goal_id = "g1"
description = "Get compensation for my cargo"
"#;

pub const SECRET_SEGMENT: &str = "The harbor master paid to have the lamp go dark.";

pub fn lantern_house() -> SessionSetup {
    SessionSetup::from_toml_str(LANTERN_HOUSE).unwrap()
}

pub fn config(max_rounds: u32) -> SessionConfig {
    SessionConfig::default()
        .with_max_rounds(max_rounds)
        .with_decision_timeout(Duration::from_millis(100))
}

pub fn id(text: &str) -> CharacterId {
    CharacterId::from(text)
}

/// A well-formed, uneventful turn for whoever is asked.
pub fn plain_turn(request: &DecisionRequest) -> TurnDecision {
    TurnDecision::new(
        ActionPack::speak(
            request.view.character_id.clone(),
            request.round,
            request.turn,
            format!("{} keeps watch.", request.view.name),
        )
        .with_reasoning("Nothing worth saying yet."),
    )
}

pub enum Reply {
    Decide(TurnDecision),
    Fail(CoreError),
    Stall,
}

type Script = dyn Fn(&DecisionRequest) -> Reply + Send + Sync;

/// Decision maker driven by a closure. Records every request it receives.
pub struct ScriptedDecisions {
    script: Box<Script>,
    requests: Mutex<Vec<DecisionRequest>>,
}

impl ScriptedDecisions {
    pub fn new(script: impl Fn(&DecisionRequest) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn cooperative() -> Arc<Self> {
        Self::new(|request| Reply::Decide(plain_turn(request)))
    }

    pub fn requests(&self) -> Vec<DecisionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionMaker for ScriptedDecisions {
    async fn decide(&self, request: &DecisionRequest) -> CoreResult<TurnDecision> {
        self.requests.lock().unwrap().push(request.clone());
        let reply = (self.script)(request);
        match reply {
            Reply::Decide(decision) => Ok(decision),
            Reply::Fail(error) => Err(error),
            Reply::Stall => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(CoreError::Collaborator("stalled".into()))
            }
        }
    }
}

/// Moderator with a fixed announcement and a queue of verdicts.
/// An empty queue means "continue".
pub struct ScriptedModerator {
    announcement: Option<String>,
    verdicts: Mutex<VecDeque<Assessment>>,
    briefings: Mutex<Vec<ModeratorBriefing>>,
    summaries: Mutex<Vec<PublicSummary>>,
}

impl ScriptedModerator {
    pub fn announcing(text: &str, verdicts: Vec<Assessment>) -> Arc<Self> {
        Arc::new(Self {
            announcement: Some(text.to_string()),
            verdicts: Mutex::new(verdicts.into()),
            briefings: Mutex::new(Vec::new()),
            summaries: Mutex::new(Vec::new()),
        })
    }

    pub fn patient() -> Arc<Self> {
        Self::announcing("Fog rolls over the pier.", Vec::new())
    }

    /// Fails every announcement; assessments still follow the queue.
    pub fn mute(verdicts: Vec<Assessment>) -> Arc<Self> {
        Arc::new(Self {
            announcement: None,
            verdicts: Mutex::new(verdicts.into()),
            briefings: Mutex::new(Vec::new()),
            summaries: Mutex::new(Vec::new()),
        })
    }

    pub fn briefings(&self) -> Vec<ModeratorBriefing> {
        self.briefings.lock().unwrap().clone()
    }

    pub fn summaries(&self) -> Vec<PublicSummary> {
        self.summaries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SceneModerator for ScriptedModerator {
    async fn announce_scene(&self, briefing: &ModeratorBriefing) -> CoreResult<String> {
        self.briefings.lock().unwrap().push(briefing.clone());
        self.announcement
            .clone()
            .ok_or_else(|| CoreError::Collaborator("moderator unavailable".into()))
    }

    async fn assess_round(&self, summary: &PublicSummary) -> CoreResult<Assessment> {
        self.summaries.lock().unwrap().push(summary.clone());
        let verdict = self.verdicts.lock().unwrap().pop_front();
        Ok(verdict.unwrap_or_else(|| Assessment::proceed(format!("round {} done", summary.round))))
    }
}
