//! Bounded-concurrency per-item executor.
//!
//! Fans out one service call per slide with a hard in-flight ceiling:
//! eligible items are partitioned into batches of at most the configured
//! limit, batches run sequentially, and items within a batch run
//! concurrently. A batch does not start until every call of the previous
//! batch has settled, so the live in-flight count never exceeds the limit.
//!
//! Failures are isolated to their index: a failed item never aborts
//! sibling in-flight work nor blocks later batches, and retry is always an
//! explicit caller action (except for the expansion sweep, which picks
//! failed items up again).

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;

use crate::core::ItemStatus;
use crate::errors::DeckflowError;
use crate::events::{EventSink, NoOpEventSink, ToastHub, ToastKind};
use crate::service::GenerationService;

/// Default concurrency ceiling for slide content generation.
pub const DEFAULT_CONTENT_CONCURRENCY: usize = 3;

/// Default concurrency ceiling for outline expansion.
pub const DEFAULT_EXPAND_CONCURRENCY: usize = 5;

/// The per-item operation the executor fans out.
#[async_trait]
pub trait ItemTask: Send + Sync {
    /// Runs the operation for one item index.
    async fn run(
        &self,
        session_id: &str,
        index: usize,
        context: Option<&Value>,
    ) -> Result<Value, DeckflowError>;

    /// Short noun for this task's output, used in notifications.
    fn noun(&self) -> &'static str;
}

/// Per-slide content generation.
pub struct SlideContentTask {
    service: Arc<dyn GenerationService>,
}

impl SlideContentTask {
    /// Creates the task over the given service.
    #[must_use]
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ItemTask for SlideContentTask {
    async fn run(
        &self,
        session_id: &str,
        index: usize,
        context: Option<&Value>,
    ) -> Result<Value, DeckflowError> {
        self.service.generate_item(session_id, index, context).await
    }

    fn noun(&self) -> &'static str {
        "content"
    }
}

/// Per-slide outline expansion.
pub struct OutlineExpandTask {
    service: Arc<dyn GenerationService>,
}

impl OutlineExpandTask {
    /// Creates the task over the given service.
    #[must_use]
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ItemTask for OutlineExpandTask {
    async fn run(
        &self,
        session_id: &str,
        index: usize,
        _context: Option<&Value>,
    ) -> Result<Value, DeckflowError> {
        self.service.expand_item(session_id, index).await
    }

    fn noun(&self) -> &'static str {
        "expansion"
    }
}

/// Which item statuses a `run_all` sweep picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepPolicy {
    /// Only idle items; failed items wait for an explicit retry.
    #[default]
    IdleOnly,
    /// Idle and failed items; failed items are retried automatically on
    /// every sweep (the outline-expansion variant).
    IdleOrFailed,
}

impl SweepPolicy {
    fn eligible(self, status: ItemStatus) -> bool {
        match self {
            SweepPolicy::IdleOnly => status == ItemStatus::Idle,
            SweepPolicy::IdleOrFailed => {
                matches!(status, ItemStatus::Idle | ItemStatus::Failed)
            }
        }
    }
}

/// One addressable element of a stage's output collection.
#[derive(Debug, Clone, Default)]
pub struct ItemSlot {
    /// Stable index within the collection.
    pub index: usize,
    /// Current status.
    pub status: ItemStatus,
    /// Generated content, present once `Done`.
    pub content: Option<Value>,
    /// Human-readable error, present once `Failed`.
    pub error: Option<String>,
}

/// Derived aggregate progress. Never stored; recomputed from per-item
/// statuses on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Items in `Done` status.
    pub completed: usize,
    /// Collection size.
    pub total: usize,
    /// Rounded completion percentage.
    pub percent: u32,
}

/// Bounded-concurrency sub-task executor over a fixed item collection.
pub struct ItemExecutor {
    task: Arc<dyn ItemTask>,
    policy: SweepPolicy,
    events: Arc<dyn EventSink>,
    toasts: ToastHub,
    session_id: Option<String>,
    generation: u64,
    items: Vec<ItemSlot>,
}

impl ItemExecutor {
    /// Creates an executor for the given task and sweep policy.
    #[must_use]
    pub fn new(task: Arc<dyn ItemTask>, policy: SweepPolicy) -> Self {
        Self {
            task,
            policy,
            events: Arc::new(NoOpEventSink),
            toasts: ToastHub::default(),
            session_id: None,
            generation: 0,
            items: Vec::new(),
        }
    }

    /// Creates an executor for slide content generation.
    #[must_use]
    pub fn for_content(service: Arc<dyn GenerationService>) -> Self {
        Self::new(Arc::new(SlideContentTask::new(service)), SweepPolicy::IdleOnly)
    }

    /// Creates an executor for outline expansion.
    #[must_use]
    pub fn for_expansion(service: Arc<dyn GenerationService>) -> Self {
        Self::new(
            Arc::new(OutlineExpandTask::new(service)),
            SweepPolicy::IdleOrFailed,
        )
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Resets the executor for a new collection of `count` items.
    ///
    /// All items start `Idle` with no content or error. Bumps the
    /// generation counter so outcomes still in flight from the previous
    /// collection are dropped when they resolve.
    pub fn initialize(&mut self, count: usize, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
        self.generation += 1;
        self.items = (0..count)
            .map(|index| ItemSlot {
                index,
                ..ItemSlot::default()
            })
            .collect();
        tracing::debug!(count, generation = self.generation, "executor initialized");
    }

    /// Runs the per-item operation for a single index.
    ///
    /// No-op if no session is set, the index is out of range, or the item
    /// is not `Idle`. Terminal items go through [`Self::retry_one`], which
    /// resets them first.
    pub async fn run_one(&mut self, index: usize, context: Option<Value>) {
        let Some(session_id) = self.session_id.clone() else {
            tracing::warn!(index, "run_one ignored: no session");
            return;
        };
        let Some(status) = self.items.get(index).map(|slot| slot.status) else {
            tracing::warn!(index, "run_one ignored: index out of range");
            return;
        };
        if !status.may_transition(ItemStatus::Running) {
            tracing::warn!(index, status = %status, "run_one ignored: not idle");
            return;
        }

        let generation = self.generation;
        self.mark_running(index);
        let outcome = self.task.run(&session_id, index, context.as_ref()).await;
        self.apply(generation, index, outcome);
    }

    /// Runs every eligible item, at most `limit` concurrently.
    ///
    /// Eligible items are dispatched in index order, partitioned into
    /// batches of at most `limit`; the next batch starts only after every
    /// call of the previous batch has settled.
    pub async fn run_all(&mut self, limit: usize) {
        let Some(session_id) = self.session_id.clone() else {
            tracing::warn!("run_all ignored: no session");
            return;
        };
        let limit = limit.max(1);
        let eligible: Vec<usize> = self
            .items
            .iter()
            .filter(|slot| self.policy.eligible(slot.status))
            .map(|slot| slot.index)
            .collect();

        let generation = self.generation;
        for batch in eligible.chunks(limit) {
            for &index in batch {
                self.mark_running(index);
            }
            let calls = batch.iter().map(|&index| {
                let task = Arc::clone(&self.task);
                let session_id = session_id.clone();
                async move { (index, task.run(&session_id, index, None).await) }
            });
            for (index, outcome) in join_all(calls).await {
                self.apply(generation, index, outcome);
            }
        }
    }

    /// Resets a terminal item to `Idle` and re-runs it.
    ///
    /// Only legal from `Failed` or `Done`; otherwise a logged no-op.
    pub async fn retry_one(&mut self, index: usize, context: Option<Value>) {
        let Some(slot) = self.items.get_mut(index) else {
            tracing::warn!(index, "retry_one ignored: index out of range");
            return;
        };
        if !slot.status.is_terminal() {
            tracing::warn!(index, status = %slot.status, "retry_one ignored: not terminal");
            return;
        }
        slot.status = ItemStatus::Idle;
        slot.content = None;
        slot.error = None;
        self.run_one(index, context).await;
    }

    /// Merges caller-edited content into an item, for manual editing after
    /// generation.
    pub fn update_content(&mut self, index: usize, content: Value) {
        let Some(slot) = self.items.get_mut(index) else {
            return;
        };
        match (&mut slot.content, content) {
            (Some(Value::Object(existing)), Value::Object(update)) => {
                existing.extend(update);
            }
            (current, update) => *current = Some(update),
        }
    }

    /// Returns derived progress over the collection.
    #[must_use]
    pub fn progress(&self) -> Progress {
        let total = self.items.len();
        let completed = self
            .items
            .iter()
            .filter(|slot| slot.status == ItemStatus::Done)
            .count();
        let percent = if total == 0 {
            0
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
            {
                ((completed as f64 / total as f64) * 100.0).round() as u32
            }
        };
        Progress {
            completed,
            total,
            percent,
        }
    }

    /// Returns true if any item is currently `Running`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.items
            .iter()
            .any(|slot| slot.status == ItemStatus::Running)
    }

    /// Returns true if every item is `Done` (and the collection is
    /// non-empty).
    #[must_use]
    pub fn all_completed(&self) -> bool {
        !self.items.is_empty()
            && self
                .items
                .iter()
                .all(|slot| slot.status == ItemStatus::Done)
    }

    /// Returns the item slots.
    #[must_use]
    pub fn items(&self) -> &[ItemSlot] {
        &self.items
    }

    /// Returns one item slot, if the index is in range.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&ItemSlot> {
        self.items.get(index)
    }

    /// Returns per-item statuses in index order.
    #[must_use]
    pub fn statuses(&self) -> Vec<ItemStatus> {
        self.items.iter().map(|slot| slot.status).collect()
    }

    /// Returns the toast hub for presentation-layer consumption.
    #[must_use]
    pub fn toasts(&self) -> &ToastHub {
        &self.toasts
    }

    /// Returns the current initialization generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn mark_running(&mut self, index: usize) {
        if let Some(slot) = self.items.get_mut(index) {
            // A failed item picked up by an IdleOrFailed sweep passes
            // through Idle on its way back to Running.
            if slot.status == ItemStatus::Failed {
                slot.status = ItemStatus::Idle;
            }
            slot.status = ItemStatus::Running;
            slot.error = None;
        }
    }

    /// Applies a settled outcome, dropping it if the collection was
    /// reinitialized after dispatch.
    pub(crate) fn apply(
        &mut self,
        generation: u64,
        index: usize,
        outcome: Result<Value, DeckflowError>,
    ) {
        if generation != self.generation {
            tracing::debug!(index, generation, "dropping stale item outcome");
            return;
        }
        let noun = self.task.noun();
        let Some(slot) = self.items.get_mut(index) else {
            return;
        };
        match outcome {
            Ok(content) => {
                slot.status = ItemStatus::Done;
                slot.content = Some(content);
                self.toasts.push(
                    format!("Slide {} {noun} ready", index + 1),
                    ToastKind::Success,
                );
                self.events
                    .try_emit("item.done", Some(serde_json::json!({ "index": index })));
            }
            Err(err) => {
                let message = err.to_string();
                slot.status = ItemStatus::Failed;
                slot.error = Some(message.clone());
                self.toasts.push(
                    format!("Slide {} {noun} failed", index + 1),
                    ToastKind::Error,
                );
                self.events.try_emit(
                    "item.failed",
                    Some(serde_json::json!({ "index": index, "error": message })),
                );
                tracing::warn!(index, error = %message, "item failed");
            }
        }
    }
}
