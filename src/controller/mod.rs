//! Stage pipeline controller.
//!
//! One controller instance drives one end-to-end pipeline run: it owns the
//! session identifier, the current phase, the interactive sub-state, and a
//! running answer map, and it interprets service responses to decide the
//! next observable state. Stage results are written through to the step
//! cache, which is what makes any completed prefix of the chain resumable.

mod display;

#[cfg(test)]
mod integration_tests;

pub use display::{status_label, DisplayHints};

use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::StepCache;
use crate::core::{transition, InteractionState, PipelinePhase, Stage, StageEvent};
use crate::errors::DeckflowError;
use crate::events::{EventSink, MessageLog, NoOpEventSink};
use crate::observability::FlowSpanAttributes;
use crate::service::{
    DeckContent, GenerationService, Outline, Question, SessionSnapshot, StageArtifacts,
    StageRequest, StageResponse, StyleBundle,
};
use crate::utils::generate_uuid;

/// Input to one [`PipelineController::advance`] call.
#[derive(Debug, Clone, Default)]
pub struct AdvanceInput {
    /// Free-text request; only meaningful when starting the intent stage.
    pub user_text: Option<String>,
    /// Answers to outstanding questions; merged into the running map.
    pub answers: Map<String, Value>,
    /// Accept service defaults for all pending questions.
    pub accept_defaults: bool,
    /// Stop the chain once this stage completes.
    pub stop_at: Option<Stage>,
    /// Explicit style selection, used only when the style stage is bypassed.
    pub style_override: Option<String>,
    /// Resume at this stage using cached upstream results.
    pub resume_at: Option<Stage>,
}

impl AdvanceInput {
    /// Creates an empty input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the free-text request.
    #[must_use]
    pub fn with_user_text(mut self, text: impl Into<String>) -> Self {
        self.user_text = Some(text.into());
        self
    }

    /// Adds one answer.
    #[must_use]
    pub fn with_answer(mut self, key: impl Into<String>, value: Value) -> Self {
        self.answers.insert(key.into(), value);
        self
    }

    /// Requests service defaults for all pending questions.
    #[must_use]
    pub fn accepting_defaults(mut self) -> Self {
        self.accept_defaults = true;
        self
    }

    /// Sets the stop-at directive.
    #[must_use]
    pub fn with_stop_at(mut self, stage: Stage) -> Self {
        self.stop_at = Some(stage);
        self
    }

    /// Sets the explicit style selection.
    #[must_use]
    pub fn with_style_override(mut self, style: impl Into<String>) -> Self {
        self.style_override = Some(style.into());
        self
    }

    /// Sets the resume directive.
    #[must_use]
    pub fn resuming_at(mut self, stage: Stage) -> Self {
        self.resume_at = Some(stage);
        self
    }
}

/// Observable outcome of one `advance` call.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    /// The current stage is suspended awaiting answers.
    NeedsInput {
        /// The suspended stage.
        stage: Stage,
        /// Sub-state governing what the next submission means.
        interaction: Option<InteractionState>,
        /// Outstanding questions.
        questions: Vec<Question>,
    },
    /// One or more stages completed.
    Completed {
        /// The furthest stage the service completed.
        reached: Stage,
        /// True if the chain is finished (last stage or stop-at target).
        done: bool,
    },
}

/// Accumulated stage results for the current run.
///
/// Exactly what the service returned; nothing is ever defaulted.
#[derive(Debug, Clone, Default)]
pub struct StageResults {
    /// Structured intent.
    pub intent: Option<Value>,
    /// Chosen style configuration and samples.
    pub style: Option<StyleBundle>,
    /// Deck outline.
    pub outline: Option<Outline>,
    /// Assembled deck content.
    pub content: Option<DeckContent>,
}

/// Drives the ordered stage chain for one session.
pub struct PipelineController {
    service: Arc<dyn GenerationService>,
    events: Arc<dyn EventSink>,
    run_id: Uuid,
    session_id: Option<String>,
    phase: PipelinePhase,
    interaction: Option<InteractionState>,
    questions: Vec<Question>,
    answers: Map<String, Value>,
    busy: bool,
    results: StageResults,
    cache: StepCache,
    snapshot: Option<SessionSnapshot>,
    log: MessageLog,
}

impl PipelineController {
    /// Creates a controller over the given service.
    #[must_use]
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service,
            events: Arc::new(NoOpEventSink),
            run_id: generate_uuid(),
            session_id: None,
            phase: PipelinePhase::NotStarted,
            interaction: None,
            questions: Vec::new(),
            answers: Map::new(),
            busy: false,
            results: StageResults::default(),
            cache: StepCache::new(),
            snapshot: None,
            log: MessageLog::new(),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Runs or resumes the pipeline by one service round-trip.
    ///
    /// Creates a session first if none exists; failure there is fatal to
    /// this call only. A transport or service error leaves the phase and
    /// cache untouched, so retrying the same call is always safe.
    ///
    /// # Errors
    ///
    /// [`DeckflowError::SessionCreate`] when the session could not be
    /// created, [`DeckflowError::Transport`] when the stage call did not
    /// complete, and [`DeckflowError::Service`] when the service reported
    /// a logical error.
    pub async fn advance(&mut self, input: AdvanceInput) -> Result<AdvanceOutcome, DeckflowError> {
        if let Some(stage) = input.resume_at {
            self.restore_from_cache(stage);
        }
        self.busy = true;
        let result = self.advance_inner(input).await;
        self.busy = false;
        result
    }

    async fn advance_inner(
        &mut self,
        input: AdvanceInput,
    ) -> Result<AdvanceOutcome, DeckflowError> {
        let session_id = match self.session_id.clone() {
            Some(id) => id,
            None => {
                self.log.push("creating session");
                let id = self
                    .service
                    .create_session()
                    .await
                    .map_err(|e| DeckflowError::SessionCreate(e.to_string()))?;
                tracing::info!(session_id = %id, run_id = %self.run_id, "session created");
                self.session_id = Some(id.clone());
                id
            }
        };

        for (key, value) in input.answers {
            self.answers.insert(key, value);
        }

        let stage = self.phase.stage().unwrap_or(Stage::Intent);
        let attrs = FlowSpanAttributes::new()
            .with_session_id(&session_id)
            .with_run_id(self.run_id.to_string())
            .with_stage(stage.as_str());
        tracing::debug!(attributes = ?attrs.as_map(), "dispatching stage");

        let request = StageRequest {
            session_id: session_id.clone(),
            user_text: input.user_text,
            answers: self.answers.clone(),
            accept_defaults: input.accept_defaults,
            stop_at: input.stop_at,
            style_override: input.style_override,
        };

        let response = self.service.run_stage(&request).await?;
        match response {
            StageResponse::NeedsInput {
                stage,
                interaction,
                questions,
                partial_intent,
            } => {
                self.phase = transition(stage, StageEvent::InputRequested, input.stop_at);
                self.interaction = interaction.clone();
                self.questions = questions.clone();
                if let Some(partial) = partial_intent {
                    self.results.intent = Some(partial);
                }
                self.refresh_snapshot(&session_id).await;
                self.log.push(format!("{stage}: awaiting user input"));
                self.events.try_emit(
                    "stage.needs_input",
                    Some(serde_json::json!({ "stage": stage.as_str() })),
                );
                Ok(AdvanceOutcome::NeedsInput {
                    stage,
                    interaction,
                    questions,
                })
            }
            StageResponse::Completed { reached, artifacts } => {
                self.store_artifacts(artifacts, &session_id)?;
                self.interaction = None;
                self.questions.clear();
                self.phase = transition(reached, StageEvent::Completed, input.stop_at);
                self.refresh_snapshot(&session_id).await;
                self.log.push(format!("{reached}: complete"));
                self.events.try_emit(
                    "stage.completed",
                    Some(serde_json::json!({ "stage": reached.as_str() })),
                );
                Ok(AdvanceOutcome::Completed {
                    reached,
                    done: self.phase.is_complete(),
                })
            }
            StageResponse::Failed { message } => {
                tracing::warn!(stage = %stage, error = %message, "stage call failed");
                self.log.push(format!("{stage}: error: {message}"));
                Err(DeckflowError::Service(message))
            }
        }
    }

    /// Replaces the step cache wholesale, e.g. with one rehydrated from
    /// persistent storage, so a later `advance` can resume from it.
    pub fn seed_cache(&mut self, cache: StepCache) {
        self.cache = cache;
    }

    /// Restores phase, session, and results from cached upstream stages so
    /// the next dispatch runs `stage` without recomputing its inputs.
    pub fn restore_from_cache(&mut self, stage: Stage) {
        if let Some(prev) = stage.prev() {
            let bundle = self.cache.restore_up_to(prev);
            if let Some(session_id) = bundle.session_id {
                self.session_id = Some(session_id);
            }
            for (slot, payload) in &bundle.steps {
                self.absorb_cached(*slot, payload);
            }
        }
        self.phase = PipelinePhase::InStage(stage);
        self.interaction = None;
        self.questions.clear();
        self.log.push(format!("resuming at {stage}"));
    }

    /// Clears cached results from `stage` onward.
    ///
    /// Invalidating the intent slot forgets the session too, since session
    /// identity is anchored to the first stage.
    pub fn invalidate_from(&mut self, stage: Stage) {
        self.cache.clear_from(stage);
        if stage == Stage::Intent {
            self.session_id = None;
        }
    }

    /// Clears all client-side run state; optionally the step cache too.
    pub fn reset(&mut self, clear_cache: bool) {
        self.session_id = None;
        self.phase = PipelinePhase::NotStarted;
        self.interaction = None;
        self.questions.clear();
        self.answers = Map::new();
        self.results = StageResults::default();
        self.snapshot = None;
        self.log.clear();
        if clear_cache {
            self.cache.clear_all();
        }
    }

    /// Probes service liveness.
    ///
    /// # Errors
    ///
    /// Propagates the service's transport error.
    pub async fn check_health(&self) -> Result<Value, DeckflowError> {
        self.service.health().await
    }

    /// Returns the human-facing status label for the current position.
    #[must_use]
    pub fn display_status(&self) -> &'static str {
        status_label(self.phase, self.interaction.as_ref(), self.display_hints())
    }

    fn display_hints(&self) -> DisplayHints {
        let page_count_recommended = self
            .questions
            .iter()
            .any(|q| q.recommended_count.is_some())
            || self
                .results
                .intent
                .as_ref()
                .and_then(|intent| intent.get("slide_requirements"))
                .and_then(|req| req.get("llm_recommended_count"))
                .is_some();
        DisplayHints {
            page_count_recommended,
            style_ready_without_outline: self.results.style.is_some()
                && self.results.outline.is_none(),
        }
    }

    /// Returns the current pipeline phase.
    #[must_use]
    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// Returns the current stage, if the pipeline is positioned at one.
    #[must_use]
    pub fn stage(&self) -> Option<Stage> {
        self.phase.stage()
    }

    /// Returns the session id, once one exists.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Returns the current interactive sub-state.
    #[must_use]
    pub fn interaction(&self) -> Option<&InteractionState> {
        self.interaction.as_ref()
    }

    /// Returns the outstanding questions.
    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Returns the running answer map.
    #[must_use]
    pub fn answers(&self) -> &Map<String, Value> {
        &self.answers
    }

    /// Returns true while an `advance` call is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Returns the accumulated stage results.
    #[must_use]
    pub fn results(&self) -> &StageResults {
        &self.results
    }

    /// Returns the step cache.
    #[must_use]
    pub fn cache(&self) -> &StepCache {
        &self.cache
    }

    /// Returns the last fetched server-side session snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Option<&SessionSnapshot> {
        self.snapshot.as_ref()
    }

    /// Returns the run's message log.
    #[must_use]
    pub fn message_log(&self) -> &MessageLog {
        &self.log
    }

    fn store_artifacts(
        &mut self,
        artifacts: StageArtifacts,
        session_id: &str,
    ) -> Result<(), DeckflowError> {
        if let Some(intent) = artifacts.intent {
            self.cache.save(Stage::Intent, &intent, session_id);
            self.results.intent = Some(intent);
        }
        if let Some(style) = artifacts.style {
            let value = serde_json::to_value(&style)?;
            self.cache.save(Stage::Style, &value, session_id);
            self.results.style = Some(style);
        }
        if let Some(outline) = artifacts.outline {
            let value = serde_json::to_value(&outline)?;
            self.cache.save(Stage::Outline, &value, session_id);
            self.results.outline = Some(outline);
        }
        if let Some(content) = artifacts.content {
            let value = serde_json::to_value(&content)?;
            self.cache.save(Stage::Content, &value, session_id);
            self.results.content = Some(content);
        }
        Ok(())
    }

    fn absorb_cached(&mut self, stage: Stage, payload: &Value) {
        match stage {
            Stage::Intent => self.results.intent = Some(payload.clone()),
            Stage::Style => match serde_json::from_value(payload.clone()) {
                Ok(style) => self.results.style = Some(style),
                Err(e) => tracing::warn!(error = %e, "cached style payload unreadable"),
            },
            Stage::Outline => match serde_json::from_value(payload.clone()) {
                Ok(outline) => self.results.outline = Some(outline),
                Err(e) => tracing::warn!(error = %e, "cached outline payload unreadable"),
            },
            Stage::Content => match serde_json::from_value(payload.clone()) {
                Ok(content) => self.results.content = Some(content),
                Err(e) => tracing::warn!(error = %e, "cached content payload unreadable"),
            },
            Stage::Render => {}
        }
    }

    async fn refresh_snapshot(&mut self, session_id: &str) {
        let fetched = self.service.fetch_session(session_id).await;
        match fetched {
            Ok(snapshot) => self.snapshot = Some(snapshot),
            Err(e) => tracing::warn!(error = %e, "session snapshot refresh failed"),
        }
    }
}
