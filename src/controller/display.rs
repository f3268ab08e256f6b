//! Derived, human-facing status labels.
//!
//! A pure lookup over `(phase, sub-state, hints)`. It never feeds back
//! into the transition logic and holds no state of its own.

use crate::core::{InteractionState, PipelinePhase, Stage};

/// Presence flags derived from service-reported hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayHints {
    /// The service recommended a page count that is being confirmed.
    pub page_count_recommended: bool,
    /// The style result exists but the outline does not yet.
    pub style_ready_without_outline: bool,
}

/// Computes the status label for the given pipeline position.
#[must_use]
pub fn status_label(
    phase: PipelinePhase,
    interaction: Option<&InteractionState>,
    hints: DisplayHints,
) -> &'static str {
    let stage = match phase {
        PipelinePhase::NotStarted => return "Ready",
        PipelinePhase::Complete => return "Done",
        PipelinePhase::InStage(stage) | PipelinePhase::AwaitingInput(stage) => stage,
    };

    match stage {
        Stage::Intent => intent_label(phase, interaction, hints),
        Stage::Style => {
            if hints.style_ready_without_outline && matches!(phase, PipelinePhase::InStage(_)) {
                "Style ready, waiting to continue..."
            } else {
                "Designing style..."
            }
        }
        Stage::Outline => "Generating outline...",
        Stage::Content => "Generating slide content...",
        Stage::Render => "Rendering deck...",
    }
}

fn intent_label(
    phase: PipelinePhase,
    interaction: Option<&InteractionState>,
    hints: DisplayHints,
) -> &'static str {
    match interaction {
        Some(InteractionState::ConfirmingPageCount) => "Confirming page count with the model...",
        Some(
            InteractionState::AwaitingConfigDecision
            | InteractionState::AdjustingConfiguration
            | InteractionState::AwaitingFinalConfirmation,
        ) => "Waiting for user confirmation...",
        _ if hints.page_count_recommended => "Confirming page count with the model...",
        _ if matches!(phase, PipelinePhase::AwaitingInput(_)) => "Waiting for user confirmation...",
        _ => "Understanding intent...",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_terminal_labels() {
        let hints = DisplayHints::default();
        assert_eq!(status_label(PipelinePhase::NotStarted, None, hints), "Ready");
        assert_eq!(status_label(PipelinePhase::Complete, None, hints), "Done");
    }

    #[test]
    fn test_plain_stage_labels() {
        let hints = DisplayHints::default();
        assert_eq!(
            status_label(PipelinePhase::InStage(Stage::Intent), None, hints),
            "Understanding intent..."
        );
        assert_eq!(
            status_label(PipelinePhase::InStage(Stage::Style), None, hints),
            "Designing style..."
        );
        assert_eq!(
            status_label(PipelinePhase::InStage(Stage::Outline), None, hints),
            "Generating outline..."
        );
        assert_eq!(
            status_label(PipelinePhase::InStage(Stage::Content), None, hints),
            "Generating slide content..."
        );
        assert_eq!(
            status_label(PipelinePhase::InStage(Stage::Render), None, hints),
            "Rendering deck..."
        );
    }

    #[test]
    fn test_intent_sub_state_labels() {
        let hints = DisplayHints::default();
        let phase = PipelinePhase::AwaitingInput(Stage::Intent);

        assert_eq!(
            status_label(phase, Some(&InteractionState::ConfirmingPageCount), hints),
            "Confirming page count with the model..."
        );
        assert_eq!(
            status_label(phase, Some(&InteractionState::AwaitingConfigDecision), hints),
            "Waiting for user confirmation..."
        );
        assert_eq!(
            status_label(phase, Some(&InteractionState::AdjustingConfiguration), hints),
            "Waiting for user confirmation..."
        );
        // Unknown sub-states fall back to the generic awaiting label.
        let other = InteractionState::Other("mystery".to_string());
        assert_eq!(
            status_label(phase, Some(&other), hints),
            "Waiting for user confirmation..."
        );
    }

    #[test]
    fn test_page_count_hint_overrides_generic_wait() {
        let hints = DisplayHints {
            page_count_recommended: true,
            ..DisplayHints::default()
        };
        assert_eq!(
            status_label(PipelinePhase::InStage(Stage::Intent), None, hints),
            "Confirming page count with the model..."
        );
    }

    #[test]
    fn test_style_ready_label() {
        let hints = DisplayHints {
            style_ready_without_outline: true,
            ..DisplayHints::default()
        };
        assert_eq!(
            status_label(PipelinePhase::InStage(Stage::Style), None, hints),
            "Style ready, waiting to continue..."
        );
        // The awaiting variant keeps the in-progress label.
        assert_eq!(
            status_label(PipelinePhase::AwaitingInput(Stage::Style), None, hints),
            "Designing style..."
        );
    }
}
