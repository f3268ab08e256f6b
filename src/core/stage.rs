//! Pipeline stages and the stage transition function.
//!
//! The generation pipeline is a fixed, ordered chain of five stages. A
//! stage's output is the required input of the next; re-running a stage is
//! always safe from the client's perspective.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One ordered phase of the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Intent extraction from the user's free-text request.
    Intent,
    /// Visual style selection.
    Style,
    /// Outline synthesis (deck title plus ordered slide descriptors).
    Outline,
    /// Per-slide content drafting.
    Content,
    /// Final deck rendering.
    Render,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Stage; 5] = [
        Stage::Intent,
        Stage::Style,
        Stage::Outline,
        Stage::Content,
        Stage::Render,
    ];

    /// Returns the zero-based position of this stage in the chain.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Stage::Intent => 0,
            Stage::Style => 1,
            Stage::Outline => 2,
            Stage::Content => 3,
            Stage::Render => 4,
        }
    }

    /// Returns the next stage in the chain, or `None` after [`Stage::Render`].
    #[must_use]
    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    /// Returns the previous stage in the chain, or `None` before
    /// [`Stage::Intent`].
    #[must_use]
    pub fn prev(self) -> Option<Stage> {
        self.index().checked_sub(1).map(|i| Stage::ALL[i])
    }

    /// Returns the wire name of this stage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Intent => "intent",
            Stage::Style => "style",
            Stage::Outline => "outline",
            Stage::Content => "content",
            Stage::Render => "render",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown stage name.
#[derive(Debug, Clone, Error)]
#[error("Unknown stage: {0}")]
pub struct UnknownStageError(pub String);

impl FromStr for Stage {
    type Err = UnknownStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intent" => Ok(Stage::Intent),
            "style" => Ok(Stage::Style),
            "outline" => Ok(Stage::Outline),
            "content" => Ok(Stage::Content),
            "render" => Ok(Stage::Render),
            other => Err(UnknownStageError(other.to_string())),
        }
    }
}

/// Outcome of one stage dispatch, as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageEvent {
    /// The stage completed and produced its result.
    Completed,
    /// The service needs user-supplied answers before the stage can finish.
    InputRequested,
    /// The call failed; the stage is left retryable.
    Failed,
}

/// Observable position of the pipeline between `advance` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelinePhase {
    /// No stage has been dispatched yet.
    NotStarted,
    /// The named stage is current and may be dispatched.
    InStage(Stage),
    /// The named stage is suspended awaiting user answers.
    AwaitingInput(Stage),
    /// The chain has finished (last stage or a stop-at target completed).
    Complete,
}

impl PipelinePhase {
    /// Returns the stage this phase refers to, if any.
    #[must_use]
    pub fn stage(self) -> Option<Stage> {
        match self {
            PipelinePhase::InStage(s) | PipelinePhase::AwaitingInput(s) => Some(s),
            PipelinePhase::NotStarted | PipelinePhase::Complete => None,
        }
    }

    /// Returns true if the chain has finished.
    #[must_use]
    pub fn is_complete(self) -> bool {
        matches!(self, PipelinePhase::Complete)
    }
}

/// Computes the phase that follows `event` being observed at `stage`.
///
/// `stop_at` short-circuits the chain: once the named stage completes the
/// pipeline is considered finished even though later stages exist. Input
/// requests and failures never advance the stage.
#[must_use]
pub fn transition(stage: Stage, event: StageEvent, stop_at: Option<Stage>) -> PipelinePhase {
    match event {
        StageEvent::InputRequested => PipelinePhase::AwaitingInput(stage),
        StageEvent::Failed => PipelinePhase::InStage(stage),
        StageEvent::Completed => {
            if stop_at == Some(stage) {
                return PipelinePhase::Complete;
            }
            match stage.next() {
                Some(next) => PipelinePhase::InStage(next),
                None => PipelinePhase::Complete,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stage_order() {
        assert_eq!(Stage::Intent.next(), Some(Stage::Style));
        assert_eq!(Stage::Style.next(), Some(Stage::Outline));
        assert_eq!(Stage::Outline.next(), Some(Stage::Content));
        assert_eq!(Stage::Content.next(), Some(Stage::Render));
        assert_eq!(Stage::Render.next(), None);
        assert_eq!(Stage::Intent.prev(), None);
        assert_eq!(Stage::Render.prev(), Some(Stage::Content));
    }

    #[test]
    fn test_stage_roundtrip() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
        assert!("3.1".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_ordering_follows_chain() {
        assert!(Stage::Intent < Stage::Style);
        assert!(Stage::Outline < Stage::Render);
    }

    #[test]
    fn test_transition_table_exhaustive() {
        for stage in Stage::ALL {
            // Input requests and failures never move the stage.
            assert_eq!(
                transition(stage, StageEvent::InputRequested, None),
                PipelinePhase::AwaitingInput(stage)
            );
            assert_eq!(
                transition(stage, StageEvent::Failed, None),
                PipelinePhase::InStage(stage)
            );

            // Completion advances to the next stage, or finishes the chain.
            let expected = match stage.next() {
                Some(next) => PipelinePhase::InStage(next),
                None => PipelinePhase::Complete,
            };
            assert_eq!(transition(stage, StageEvent::Completed, None), expected);
        }
    }

    #[test]
    fn test_transition_stop_at_short_circuits() {
        let phase = transition(Stage::Outline, StageEvent::Completed, Some(Stage::Outline));
        assert_eq!(phase, PipelinePhase::Complete);

        // A stop-at for a different stage does not short-circuit.
        let phase = transition(Stage::Style, StageEvent::Completed, Some(Stage::Outline));
        assert_eq!(phase, PipelinePhase::InStage(Stage::Outline));
    }

    #[test]
    fn test_phase_accessors() {
        assert_eq!(PipelinePhase::InStage(Stage::Style).stage(), Some(Stage::Style));
        assert_eq!(PipelinePhase::AwaitingInput(Stage::Intent).stage(), Some(Stage::Intent));
        assert_eq!(PipelinePhase::Complete.stage(), None);
        assert!(PipelinePhase::Complete.is_complete());
        assert!(!PipelinePhase::NotStarted.is_complete());
    }
}
