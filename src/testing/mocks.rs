//! Scripted generation-service doubles for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::core::Stage;
use crate::errors::DeckflowError;
use crate::service::{
    GenerationService, OutlineSlide, SessionSnapshot, StageRequest, StageResponse,
};

/// A generation service that replays scripted responses and records every
/// request it receives.
///
/// Stage responses are popped from a queue in FIFO order; per-item calls
/// succeed with a synthesized payload unless overridden. In-flight per-item
/// calls are counted so tests can assert the concurrency ceiling.
#[derive(Default)]
pub struct ScriptedService {
    responses: Mutex<VecDeque<StageResponse>>,
    requests: Mutex<Vec<StageRequest>>,
    sessions_created: AtomicUsize,
    session_create_error: Mutex<Option<String>>,
    snapshot_stage: Mutex<Option<Stage>>,
    item_overrides: Mutex<HashMap<usize, Result<Value, String>>>,
    outline_updates: Mutex<Vec<(String, Vec<OutlineSlide>)>>,
    outline_update_error: Mutex<Option<String>>,
    item_delay_ms: AtomicU64,
    item_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedService {
    /// Creates a service with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next stage response.
    pub fn push_response(&self, response: StageResponse) {
        self.responses.lock().push_back(response);
    }

    /// Makes session creation fail with the given message.
    pub fn fail_session_create(&self, message: impl Into<String>) {
        *self.session_create_error.lock() = Some(message.into());
    }

    /// Sets the stage reported by `fetch_session`.
    pub fn set_snapshot_stage(&self, stage: Stage) {
        *self.snapshot_stage.lock() = Some(stage);
    }

    /// Makes the given item index succeed with `content`.
    pub fn set_item_content(&self, index: usize, content: Value) {
        self.item_overrides.lock().insert(index, Ok(content));
    }

    /// Makes the given item index fail with `message`.
    pub fn fail_item(&self, index: usize, message: impl Into<String>) {
        self.item_overrides.lock().insert(index, Err(message.into()));
    }

    /// Adds a delay to every per-item call, so concurrency is observable.
    pub fn set_item_delay_ms(&self, millis: u64) {
        self.item_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Makes outline updates fail with the given message.
    pub fn fail_outline_update(&self, message: impl Into<String>) {
        *self.outline_update_error.lock() = Some(message.into());
    }

    /// Returns every outline update received, in order.
    #[must_use]
    pub fn outline_updates(&self) -> Vec<(String, Vec<OutlineSlide>)> {
        self.outline_updates.lock().clone()
    }

    /// Returns every stage request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<StageRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of sessions created.
    #[must_use]
    pub fn sessions_created(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }

    /// Returns the total number of per-item calls.
    #[must_use]
    pub fn item_calls(&self) -> usize {
        self.item_calls.load(Ordering::SeqCst)
    }

    /// Returns the peak number of simultaneously in-flight per-item calls.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn run_item(&self, index: usize) -> Result<Value, DeckflowError> {
        self.item_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self.item_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let scripted = self.item_overrides.lock().get(&index).cloned();
        match scripted {
            Some(Ok(content)) => Ok(content),
            Some(Err(message)) => Err(DeckflowError::Service(message)),
            None => Ok(serde_json::json!({ "index": index })),
        }
    }
}

#[async_trait]
impl GenerationService for ScriptedService {
    async fn create_session(&self) -> Result<String, DeckflowError> {
        if let Some(message) = self.session_create_error.lock().clone() {
            return Err(DeckflowError::Transport(message));
        }
        let n = self.sessions_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("sess-{n}"))
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionSnapshot, DeckflowError> {
        Ok(SessionSnapshot {
            session_id: session_id.to_string(),
            stage: *self.snapshot_stage.lock(),
            interaction: None,
            raw: Value::Null,
        })
    }

    async fn run_stage(&self, request: &StageRequest) -> Result<StageResponse, DeckflowError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| DeckflowError::transport("scripted responses exhausted"))
    }

    async fn generate_item(
        &self,
        _session_id: &str,
        index: usize,
        _context: Option<&Value>,
    ) -> Result<Value, DeckflowError> {
        self.run_item(index).await
    }

    async fn expand_item(&self, _session_id: &str, index: usize) -> Result<Value, DeckflowError> {
        self.run_item(index).await
    }

    async fn update_outline(
        &self,
        session_id: &str,
        slides: &[OutlineSlide],
    ) -> Result<(), DeckflowError> {
        if let Some(message) = self.outline_update_error.lock().clone() {
            return Err(DeckflowError::Service(message));
        }
        self.outline_updates
            .lock()
            .push((session_id.to_string(), slides.to_vec()));
        Ok(())
    }

    async fn health(&self) -> Result<Value, DeckflowError> {
        Ok(serde_json::json!({ "status": "ok" }))
    }
}
