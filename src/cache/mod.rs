//! Per-stage result cache enabling resumption without recomputation.
//!
//! One slot per stage holds a deep-copied snapshot of that stage's last
//! successful result. Clearing a slot clears every later slot too, since
//! downstream results are invalid once an upstream input changes. The cache
//! is pure bookkeeping; it never calls the service.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::core::Stage;
use crate::utils::iso_timestamp;

/// A cached stage result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedStep {
    /// Deep-copied result payload.
    pub payload: Value,
    /// Session id current at the time of saving.
    pub session_id: String,
    /// ISO 8601 timestamp of the save.
    pub saved_at: String,
}

/// Best-effort bundle of cached results for a stage prefix.
///
/// Stages without a cache entry are omitted, never defaulted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CacheBundle {
    /// Cached payloads, keyed by stage, in stage order.
    pub steps: BTreeMap<Stage, Value>,
    /// Remembered session id, if the intent slot was ever saved.
    pub session_id: Option<String>,
}

/// Human-facing digest of one cache slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSummary {
    /// The slot's stage.
    pub stage: Stage,
    /// Whether the slot is populated.
    pub present: bool,
    /// When the slot was saved.
    pub saved_at: Option<String>,
    /// Short description of the payload, when one can be derived.
    pub detail: Option<String>,
}

/// Keyed store of completed stage results, one slot per stage.
#[derive(Debug, Clone, Default)]
pub struct StepCache {
    slots: BTreeMap<Stage, CachedStep>,
    session_id: Option<String>,
}

impl StepCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a deep, isolated copy of a stage result.
    ///
    /// Mutations to the caller's value after saving never affect the stored
    /// snapshot. Saving the intent slot records the session id, anchoring
    /// session identity to the first stage.
    pub fn save(&mut self, stage: Stage, payload: &Value, session_id: &str) {
        if stage == Stage::Intent {
            self.session_id = Some(session_id.to_string());
        }
        self.slots.insert(
            stage,
            CachedStep {
                payload: payload.clone(),
                session_id: session_id.to_string(),
                saved_at: iso_timestamp(),
            },
        );
        tracing::debug!(stage = %stage, "step cache: saved");
    }

    /// Returns the cached payload for a stage, if present.
    #[must_use]
    pub fn load(&self, stage: Stage) -> Option<&Value> {
        self.slots.get(&stage).map(|step| &step.payload)
    }

    /// Returns the full cached step for a stage, if present.
    #[must_use]
    pub fn step(&self, stage: Stage) -> Option<&CachedStep> {
        self.slots.get(&stage)
    }

    /// Returns true if the stage's slot is populated.
    #[must_use]
    pub fn has(&self, stage: Stage) -> bool {
        self.slots.contains_key(&stage)
    }

    /// Returns the remembered session id.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Clears the given stage's slot and every later stage's slot.
    ///
    /// Clearing the intent slot also forgets the remembered session id.
    pub fn clear_from(&mut self, stage: Stage) {
        self.slots.retain(|&slot, _| slot < stage);
        if stage == Stage::Intent {
            self.session_id = None;
        }
        tracing::debug!(stage = %stage, "step cache: cleared from");
    }

    /// Clears every slot and the remembered session id.
    pub fn clear_all(&mut self) {
        self.clear_from(Stage::Intent);
    }

    /// Returns whatever is cached for stages up to and including `stage`.
    #[must_use]
    pub fn restore_up_to(&self, stage: Stage) -> CacheBundle {
        let steps = self
            .slots
            .iter()
            .filter(|(&slot, _)| slot <= stage)
            .map(|(&slot, step)| (slot, step.payload.clone()))
            .collect();
        CacheBundle {
            steps,
            session_id: self.session_id.clone(),
        }
    }

    /// Returns a per-slot digest for cache inspection displays.
    #[must_use]
    pub fn summary(&self) -> Vec<SlotSummary> {
        Stage::ALL
            .iter()
            .map(|&stage| {
                let step = self.slots.get(&stage);
                SlotSummary {
                    stage,
                    present: step.is_some(),
                    saved_at: step.map(|s| s.saved_at.clone()),
                    detail: step.and_then(|s| slot_detail(stage, &s.payload)),
                }
            })
            .collect()
    }
}

fn slot_detail(stage: Stage, payload: &Value) -> Option<String> {
    match stage {
        Stage::Outline => payload
            .get("slides")
            .and_then(Value::as_array)
            .map(|slides| format!("{} slides", slides.len())),
        Stage::Content => payload
            .get("pages")
            .and_then(Value::as_array)
            .map(|pages| format!("{} pages", pages.len())),
        _ => None,
    }
}
