//! The round state machine.
//!
//! `Init -> SceneAnnounce -> CharacterTurn(0..k) -> RoundAssess -> SceneAnnounce | Terminated`
//!
//! Turns run strictly one after another. The machine is the only writer of the
//! public log, the interaction log and every private memory record.

use deduction_rules::{CharacterId, KnowledgeLevel, SessionId, SessionSetup};
use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    audit_leakage, validate_decision, Assessment, DecisionMaker, DecisionRequest, EndReason,
    ModeratorBriefing, Phase, PublicSummary, RoundState, SceneModerator, Session,
    SessionSnapshot, SessionTranscript, TurnDecision, TurnSlot,
};
use crate::config::SessionConfig;
use crate::error::{CoreError, CoreResult};
use crate::knowledge_base::KnowledgeBase;
use crate::memory::{
    CharacterRoster, InteractionLog, InteractionRecord, PublicLog, SessionStore,
};
use crate::pressure::{recognize_events, PressureTracker};
use crate::scheduler::TurnScheduler;
use crate::visibility::{
    CharacterView, ModeratorDesk, ModeratorPass, PrivilegedReader, PublicRelay, PublicWriter,
    ViewContext,
};

/// External stop request, observed between phases.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Await a collaborator call, turning an elapsed deadline into `CollaboratorTimeout`.
async fn with_deadline<T>(
    limit: Duration,
    call: impl Future<Output = CoreResult<T>>,
) -> CoreResult<T> {
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(CoreError::CollaboratorTimeout(limit)))
}

/// A running deduction session.
pub struct DeductionSession {
    config: SessionConfig,
    session: Session,
    setup: SessionSetup,
    roster: CharacterRoster,
    public_log: PublicLog,
    interaction_log: InteractionLog,
    phase: Phase,
    round: RoundState,
    history: Vec<RoundState>,
    last_assessed_offset: usize,
    pending_directives: Vec<String>,
    previous_targets: Vec<CharacterId>,
    tracker: PressureTracker,
    scheduler: TurnScheduler,
    pass: ModeratorPass,
    cancel: CancelSignal,
    decisions: Arc<dyn DecisionMaker>,
    moderator: Arc<dyn SceneModerator>,
}

impl std::fmt::Debug for DeductionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeductionSession")
            .field("session_id", &self.session.session_id)
            .field("phase", &self.phase)
            .field("round", &self.round.round_number)
            .field("rounds_completed", &self.session.rounds_completed)
            .finish()
    }
}

impl DeductionSession {
    /// Load and validate the setup, build the knowledge base and seed every private record.
    ///
    /// Any configuration problem aborts here; nothing is partially initialized.
    pub fn initialize(
        setup: SessionSetup,
        config: SessionConfig,
        decisions: Arc<dyn DecisionMaker>,
        moderator: Arc<dyn SceneModerator>,
    ) -> CoreResult<Self> {
        config.validate()?;
        setup.validate()?;

        for dossier in &setup.characters {
            if let Some(declared) = &dossier.knowledge_level {
                declared.parse::<KnowledgeLevel>().map_err(|e| {
                    CoreError::Configuration(format!("character '{}': {}", dossier.character_id, e))
                })?;
            }
        }

        let knowledge_base = KnowledgeBase::from_records(&setup.knowledge)?;
        let roster = CharacterRoster::from_dossiers(setup.characters.clone(), config.secret_threshold)?;

        let session = Session {
            session_id: SessionId::new(),
            title: setup.title.clone(),
            characters: roster.ids().cloned().collect::<BTreeSet<_>>(),
            knowledge_base,
            rounds_completed: 0,
            terminated: false,
            end_reason: None,
        };

        info!(
            session = %session.session_id,
            characters = session.characters.len(),
            segments = session.knowledge_base.len(),
            "session initialized"
        );

        Ok(Self::assemble(
            config,
            session,
            setup,
            roster,
            PublicLog::new(),
            InteractionLog::new(),
            decisions,
            moderator,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        config: SessionConfig,
        session: Session,
        setup: SessionSetup,
        roster: CharacterRoster,
        public_log: PublicLog,
        interaction_log: InteractionLog,
        decisions: Arc<dyn DecisionMaker>,
        moderator: Arc<dyn SceneModerator>,
    ) -> Self {
        Self {
            tracker: PressureTracker::from_config(&config),
            scheduler: TurnScheduler::new(config.scheduler.clone()),
            config,
            session,
            setup,
            roster,
            public_log,
            interaction_log,
            phase: Phase::Init,
            round: RoundState::default(),
            history: Vec::new(),
            last_assessed_offset: 0,
            pending_directives: Vec::new(),
            previous_targets: Vec::new(),
            pass: ModeratorPass::mint(),
            cancel: CancelSignal::new(),
            decisions,
            moderator,
        }
    }

    /// Rebuild a checkpointed session from a store.
    pub fn resume(
        store: &dyn SessionStore,
        session_id: SessionId,
        config: SessionConfig,
        decisions: Arc<dyn DecisionMaker>,
        moderator: Arc<dyn SceneModerator>,
    ) -> CoreResult<Self> {
        config.validate()?;
        let missing =
            |what: &str| CoreError::Persistence(format!("no {} for session {}", what, session_id));

        let snapshot = store.load_snapshot(session_id)?.ok_or_else(|| missing("snapshot"))?;
        let public_log = store.load_public_log(session_id)?.ok_or_else(|| missing("public log"))?;
        let interaction_log = store
            .load_interaction_log(session_id)?
            .ok_or_else(|| missing("interaction log"))?;

        let mut records = BTreeMap::new();
        for dossier in &snapshot.setup.characters {
            let record = store
                .load_private_memory(session_id, &dossier.character_id)?
                .ok_or_else(|| missing(&format!("memory of '{}'", dossier.character_id)))?;
            records.insert(dossier.character_id.clone(), record);
        }
        let roster = CharacterRoster::restore(snapshot.setup.characters.clone(), records)?;

        let SessionSnapshot {
            mut session,
            setup,
            phase,
            round,
            history,
            last_assessed_offset,
            pending_directives,
            previous_targets,
        } = snapshot;
        session.knowledge_base = KnowledgeBase::from_records(&setup.knowledge)?;

        info!(session = %session_id, ?phase, round = round.round_number, "session resumed");

        let mut resumed = Self::assemble(
            config,
            session,
            setup,
            roster,
            public_log,
            interaction_log,
            decisions,
            moderator,
        );
        resumed.phase = phase;
        resumed.round = round;
        resumed.history = history;
        resumed.last_assessed_offset = last_assessed_offset;
        resumed.pending_directives = pending_directives;
        resumed.previous_targets = previous_targets;
        Ok(resumed)
    }

    /// Persist everything needed to resume.
    pub fn checkpoint(&self, store: &mut dyn SessionStore) -> CoreResult<()> {
        let id = self.session.session_id;
        store.save_snapshot(&self.snapshot())?;
        store.save_public_log(id, &self.public_log)?;
        store.save_interaction_log(id, &self.interaction_log)?;
        for entry in self.roster.entries() {
            store.save_private_memory(id, &entry.memory)?;
        }
        debug!(session = %id, phase = ?self.phase, "checkpoint written");
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.session.clone(),
            setup: self.setup.clone(),
            phase: self.phase,
            round: self.round.clone(),
            history: self.history.clone(),
            last_assessed_offset: self.last_assessed_offset,
            pending_directives: self.pending_directives.clone(),
            previous_targets: self.previous_targets.clone(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session.session_id
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminated(&self) -> bool {
        self.session.terminated
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    /// Finished rounds, oldest first.
    pub fn history(&self) -> &[RoundState] {
        &self.history
    }

    pub fn roster(&self) -> &CharacterRoster {
        &self.roster
    }

    pub fn public_log(&self) -> &PublicLog {
        &self.public_log
    }

    pub fn interaction_log(&self) -> &InteractionLog {
        &self.interaction_log
    }

    pub fn pressure_tracker(&self) -> &PressureTracker {
        &self.tracker
    }

    /// A handle that stops the session at the next phase boundary.
    pub fn cancel_signal(&self) -> CancelSignal {
        self.cancel.clone()
    }

    /// The view `character` would receive if it acted now.
    pub fn view_for(&self, character: &CharacterId) -> CoreResult<CharacterView> {
        let entry = self.roster.entry(character)?;
        Ok(CharacterView::assemble(
            &self.session.knowledge_base,
            &entry.dossier,
            &entry.memory,
            &self.public_log,
            &self.view_context(),
        ))
    }

    fn view_context(&self) -> ViewContext {
        ViewContext {
            round: self.round.round_number,
            scene: self.round.scene.clone(),
        }
    }

    /// The handoff artifact. Complete once the session has terminated.
    pub fn transcript(&self) -> SessionTranscript {
        SessionTranscript {
            session_id: self.session.session_id,
            title: self.session.title.clone(),
            end_reason: self.session.end_reason,
            rounds_completed: self.session.rounds_completed,
            public_log: self.public_log.clone(),
            interaction_log: self.interaction_log.clone(),
            assessments: self
                .history
                .iter()
                .filter_map(|round| round.assessment.clone())
                .collect(),
        }
    }

    /// Advance exactly one phase and return the phase reached.
    pub async fn step(&mut self) -> CoreResult<Phase> {
        if self.session.terminated {
            return Err(CoreError::SessionTerminated(self.session.session_id));
        }
        if self.cancel.is_cancelled() {
            if !self.round.turn_order.is_empty() || self.round.scene.is_some() {
                self.history.push(self.round.clone());
            }
            self.terminate(EndReason::Cancelled);
            return Ok(self.phase);
        }

        match self.phase {
            Phase::Init => {
                self.round = RoundState::new(1);
                self.phase = Phase::SceneAnnounce;
            }
            Phase::SceneAnnounce => self.announce_scene().await?,
            Phase::CharacterTurn(index) => self.take_turn(index).await?,
            Phase::RoundAssess => self.assess_round().await?,
            Phase::Terminated => {}
        }
        Ok(self.phase)
    }

    /// Step until the session terminates, then hand off the transcript.
    pub async fn run(&mut self) -> CoreResult<SessionTranscript> {
        while !self.session.terminated {
            self.step().await?;
        }
        Ok(self.transcript())
    }

    async fn announce_scene(&mut self) -> CoreResult<()> {
        let round_number = self.round.round_number;
        self.round.turn_order = self.scheduler.compute_order(&self.round, &self.roster);

        let briefing = ModeratorBriefing {
            round: round_number,
            knowledge: ModeratorDesk::new(&self.pass, &self.session.knowledge_base)
                .privileged_view(&self.view_context()),
            objective_facts: self.setup.objective_facts.clone(),
            ending_direction: self.setup.ending_direction.clone(),
            directives: self.pending_directives.clone(),
            recent_events: self.public_log.summary_since(self.last_assessed_offset),
        };

        let limit = self.config.decision_timeout();
        let text = match with_deadline(limit, self.moderator.announce_scene(&briefing)).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => self.fallback_scene(),
            Err(e) => {
                warn!(round = round_number, error = %e, "scene announcement failed, using objective facts");
                self.fallback_scene()
            }
        };

        let sequence = PublicRelay::new(
            &mut self.public_log,
            &self.session.knowledge_base,
            &self.roster,
        )
        .publish_scene(round_number, &text);
        let published = self
            .public_log
            .entries()
            .get(sequence as usize)
            .map(|entry| entry.text())
            .unwrap_or_default();

        self.interaction_log.record(InteractionRecord::Scene {
            round: round_number,
            text: published.clone(),
        });
        self.round.scene = Some(published);
        self.pending_directives.clear();
        self.previous_targets.clear();

        info!(
            round = round_number,
            order = ?self.round.turn_order,
            "scene announced"
        );

        self.phase = if self.round.turn_order.is_empty() {
            Phase::RoundAssess
        } else {
            Phase::CharacterTurn(0)
        };
        Ok(())
    }

    fn fallback_scene(&self) -> String {
        let mut parts = vec![self.setup.objective_facts.describe()];
        parts.extend(self.pending_directives.iter().cloned());
        let text = parts
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            format!("Round {} begins.", self.round.round_number)
        } else {
            text
        }
    }

    async fn take_turn(&mut self, index: usize) -> CoreResult<()> {
        let Some(actor) = self.round.turn_order.get(index).cloned() else {
            self.phase = Phase::RoundAssess;
            return Ok(());
        };
        let slot = TurnSlot {
            character_id: actor.clone(),
            round: self.round.round_number,
            turn: index as u32,
        };
        let limit = self.config.decision_timeout();
        let max_attempts = self.config.max_decision_attempts;

        let mut correction = None;
        let mut accepted = None;
        for attempt in 1..=max_attempts {
            let request = DecisionRequest {
                round: slot.round,
                turn: slot.turn,
                attempt,
                view: self.view_for(&actor)?,
                correction: correction.take(),
            };

            let outcome = with_deadline(limit, self.decisions.decide(&request))
                .await
                .and_then(|decision| {
                    validate_decision(&decision, &slot, &self.roster).map(|_| decision)
                });

            match outcome {
                Ok(decision) => {
                    accepted = Some((decision, attempt));
                    break;
                }
                Err(e) if e.is_turn_recoverable() => {
                    warn!(
                        character = %actor,
                        round = slot.round,
                        attempt,
                        error = %e,
                        "turn attempt rejected"
                    );
                    correction = Some(match e {
                        CoreError::MalformedAction { reason, .. } => reason,
                        other => other.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        match accepted {
            Some((decision, attempts)) => self.commit_turn(decision, attempts)?,
            None => {
                let reason = correction.unwrap_or_else(|| "no decision".to_string());
                warn!(character = %actor, round = slot.round, reason = %reason, "turn skipped");
                self.interaction_log.record(InteractionRecord::Skipped {
                    character_id: actor,
                    round: slot.round,
                    turn: slot.turn,
                    reason,
                });
                self.previous_targets.clear();
            }
        }

        self.phase = if index + 1 < self.round.turn_order.len() {
            Phase::CharacterTurn(index + 1)
        } else {
            Phase::RoundAssess
        };
        Ok(())
    }

    /// Relay an accepted decision and fold its outcome into memory.
    fn commit_turn(&mut self, decision: TurnDecision, attempts: u32) -> CoreResult<()> {
        let round_number = self.round.round_number;
        let action = &decision.action;
        let actor = action.character_id.clone();

        let findings = audit_leakage(&decision, &self.roster);
        if !findings.is_empty() {
            debug!(character = %actor, count = findings.len(), "leak audit findings");
        }

        let sequence = self.public_log.append_action(action);
        let rendered = self
            .public_log
            .entries()
            .get(sequence as usize)
            .map(|entry| entry.render())
            .unwrap_or_default();
        self.interaction_log.record(InteractionRecord::Action {
            action: action.clone(),
            attempts,
        });

        let public_offset = self.public_log.len();
        self.roster.update(&actor, |record| {
            if let Some(summary) = &decision.working_summary {
                record.working = summary.trim().to_string();
            }
            record.note(&rendered);
            for note in &decision.memory_notes {
                record.note(note);
            }
            for update in &decision.goal_updates {
                let goal = record.goal_mut(&update.goal_id).ok_or_else(|| {
                    CoreError::malformed(&actor, format!("unknown goal '{}'", update.goal_id))
                })?;
                goal.status = update.status;
            }
            record.last_acted_round = Some(round_number);
            record.last_public_offset = public_offset;
            record.last_inner_reasoning = action.inner_reasoning.clone();
            Ok(())
        })?;

        for update in &decision.goal_updates {
            info!(character = %actor, goal = %update.goal_id, status = ?update.status, "goal updated");
            self.interaction_log.record(InteractionRecord::Goal {
                character_id: actor.clone(),
                round: round_number,
                goal_id: update.goal_id.clone(),
                status: update.status,
            });
        }

        for secret_id in &decision.disclosed_secrets {
            if self.tracker.reveal(&mut self.roster, &actor, secret_id)? {
                self.interaction_log.record(InteractionRecord::Disclosure {
                    character_id: actor.clone(),
                    round: round_number,
                    secret_id: secret_id.clone(),
                });
            }
        }

        for target in action.targets.iter().filter(|t| **t != actor) {
            let line = format!("Addressed in public: {}", rendered);
            self.roster.update(target, |record| {
                record.note(&line);
                Ok(())
            })?;
        }

        let mut hits = Vec::new();
        for entry in self.roster.entries() {
            let targeted_before = self.previous_targets.contains(&entry.dossier.character_id);
            hits.extend(recognize_events(action, &entry.memory, targeted_before));
        }
        for hit in hits {
            self.tracker
                .apply(&mut self.roster, &hit.holder, &hit.secret_id, hit.event)?;
        }

        self.previous_targets = action.targets.clone();

        debug!(
            character = %actor,
            round = round_number,
            turn = action.turn,
            attempts,
            "turn committed"
        );
        Ok(())
    }

    async fn assess_round(&mut self) -> CoreResult<()> {
        let round_number = self.round.round_number;
        self.session.rounds_completed += 1;

        let summary = PublicSummary {
            round: round_number,
            rounds_completed: self.session.rounds_completed,
            max_rounds: self.config.max_rounds,
            ending_direction: self.setup.ending_direction.clone(),
            summary: self.public_log.summary_since(self.last_assessed_offset),
        };

        let limit = self.config.decision_timeout();
        let assessment = match with_deadline(limit, self.moderator.assess_round(&summary)).await {
            Ok(assessment) => assessment,
            Err(e) => {
                warn!(round = round_number, error = %e, "round assessment failed, continuing");
                Assessment::proceed(format!("assessment unavailable: {}", e))
            }
        };

        self.interaction_log.record(InteractionRecord::Assessment {
            round: round_number,
            summary: assessment.summary.clone(),
            continue_session: assessment.continue_session,
        });
        self.last_assessed_offset = self.public_log.len();
        self.round.assessment = Some(assessment.clone());
        self.history.push(self.round.clone());

        let end = if assessment.ending_direction_met {
            Some(EndReason::EndingDirectionMet)
        } else if !assessment.continue_session {
            Some(EndReason::ModeratorDecision)
        } else if self.goals_resolved() {
            Some(EndReason::GoalsResolved)
        } else if self.session.rounds_completed >= self.config.max_rounds {
            Some(EndReason::RoundLimit)
        } else {
            None
        };

        info!(
            round = round_number,
            continue_session = assessment.continue_session,
            end = ?end,
            "round assessed"
        );

        match end {
            Some(reason) => self.terminate(reason),
            None => {
                self.pending_directives = assessment.scene_directives;
                self.round = RoundState {
                    partial_round_allowed: assessment.allow_partial_round,
                    ..RoundState::new(round_number + 1)
                };
                self.phase = Phase::SceneAnnounce;
            }
        }
        Ok(())
    }

    /// Any protagonist has settled all of their goals. With no protagonists, every
    /// character must have goals and all of them must be settled.
    fn goals_resolved(&self) -> bool {
        if self.setup.protagonists.is_empty() {
            return !self.roster.is_empty()
                && self.roster.entries().all(|e| e.memory.goals_resolved());
        }
        match self
            .setup
            .protagonists
            .iter()
            .find(|id| self.roster.memory(id).is_ok_and(|m| m.goals_resolved()))
        {
            Some(id) => {
                debug!(character = %id, "protagonist goals resolved");
                true
            }
            None => false,
        }
    }

    fn terminate(&mut self, reason: EndReason) {
        self.phase = Phase::Terminated;
        self.session.terminated = true;
        self.session.end_reason = Some(reason);
        info!(
            session = %self.session.session_id,
            reason = %reason,
            rounds = self.session.rounds_completed,
            "session terminated"
        );
    }
}
