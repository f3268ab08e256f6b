//! End-to-end controller scenarios against a scripted service.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use crate::core::{InteractionState, PipelinePhase, Stage};
use crate::errors::DeckflowError;
use crate::service::{
    Outline, OutlineSlide, Question, StageArtifacts, StageResponse, StyleBundle,
};
use crate::testing::ScriptedService;

use super::{AdvanceInput, AdvanceOutcome, PipelineController};

fn controller_over(service: &Arc<ScriptedService>) -> PipelineController {
    PipelineController::new(Arc::clone(service) as Arc<_>)
}

fn intent_artifacts() -> StageArtifacts {
    StageArtifacts {
        intent: Some(json!({"subject": "hydraulics", "page_count": 5})),
        ..StageArtifacts::default()
    }
}

#[tokio::test]
async fn test_needs_input_then_answer_advances() {
    let service = Arc::new(ScriptedService::new());
    service.push_response(StageResponse::NeedsInput {
        stage: Stage::Intent,
        interaction: Some(InteractionState::ConfirmingPageCount),
        questions: vec![Question::new("page_count", "How many slides?")],
        partial_intent: Some(json!({"subject": "hydraulics"})),
    });
    service.push_response(StageResponse::Completed {
        reached: Stage::Intent,
        artifacts: intent_artifacts(),
    });

    let mut controller = controller_over(&service);

    let outcome = controller
        .advance(AdvanceInput::new().with_user_text("deck about hydraulics"))
        .await
        .unwrap();
    match outcome {
        AdvanceOutcome::NeedsInput { stage, questions, .. } => {
            assert_eq!(stage, Stage::Intent);
            assert_eq!(questions.len(), 1);
            assert_eq!(questions[0].key, "page_count");
        }
        other => panic!("expected NeedsInput, got {other:?}"),
    }
    assert_eq!(controller.phase(), PipelinePhase::AwaitingInput(Stage::Intent));
    assert_eq!(
        controller.interaction(),
        Some(&InteractionState::ConfirmingPageCount)
    );

    let outcome = controller
        .advance(AdvanceInput::new().with_answer("page_count", json!(5)))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        AdvanceOutcome::Completed {
            reached: Stage::Intent,
            done: false
        }
    );

    // Questions are cleared, the phase moves to the next stage, and the
    // completed stage's result landed in its cache slot.
    assert!(controller.questions().is_empty());
    assert!(controller.interaction().is_none());
    assert_eq!(controller.phase(), PipelinePhase::InStage(Stage::Style));
    assert!(controller.cache().has(Stage::Intent));
    assert_eq!(controller.cache().session_id(), Some("sess-1"));

    // The answer was forwarded on the second dispatch.
    let requests = service.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].answers.get("page_count"), Some(&json!(5)));
}

#[tokio::test]
async fn test_answers_accumulate_across_calls() {
    let service = Arc::new(ScriptedService::new());
    for _ in 0..2 {
        service.push_response(StageResponse::NeedsInput {
            stage: Stage::Intent,
            interaction: None,
            questions: vec![],
            partial_intent: None,
        });
    }

    let mut controller = controller_over(&service);
    controller
        .advance(AdvanceInput::new().with_answer("audience", json!("engineers")))
        .await
        .unwrap();
    controller
        .advance(AdvanceInput::new().with_answer("page_count", json!(8)))
        .await
        .unwrap();

    let requests = service.requests();
    assert_eq!(requests[1].answers.get("audience"), Some(&json!("engineers")));
    assert_eq!(requests[1].answers.get("page_count"), Some(&json!(8)));
}

#[tokio::test]
async fn test_stage_never_regresses_without_resume() {
    let service = Arc::new(ScriptedService::new());
    service.push_response(StageResponse::NeedsInput {
        stage: Stage::Intent,
        interaction: Some(InteractionState::ConfirmingPageCount),
        questions: vec![Question::new("page_count", "How many slides?")],
        partial_intent: None,
    });
    service.push_response(StageResponse::Completed {
        reached: Stage::Intent,
        artifacts: intent_artifacts(),
    });
    service.push_response(StageResponse::Completed {
        reached: Stage::Style,
        artifacts: StageArtifacts::default(),
    });
    service.push_response(StageResponse::NeedsInput {
        stage: Stage::Outline,
        interaction: None,
        questions: vec![],
        partial_intent: None,
    });
    service.push_response(StageResponse::Completed {
        reached: Stage::Content,
        artifacts: StageArtifacts::default(),
    });

    let mut controller = controller_over(&service);
    let mut highest = 0;
    for _ in 0..5 {
        controller.advance(AdvanceInput::new()).await.unwrap();
        let index = controller
            .stage()
            .map_or(Stage::ALL.len(), Stage::index);
        assert!(index >= highest, "stage regressed from {highest} to {index}");
        highest = index;
    }
    assert_eq!(controller.phase(), PipelinePhase::InStage(Stage::Render));
}

#[tokio::test]
async fn test_chained_completion_caches_every_artifact() {
    let service = Arc::new(ScriptedService::new());
    service.push_response(StageResponse::Completed {
        reached: Stage::Outline,
        artifacts: StageArtifacts {
            intent: Some(json!({"subject": "hydraulics"})),
            style: Some(StyleBundle {
                config: json!({"theme": "slate"}),
                samples: vec![],
            }),
            outline: Some(Outline {
                deck_title: "Hydraulics".into(),
                slides: vec![OutlineSlide::new("Overview"), OutlineSlide::new("Pumps")],
            }),
            content: None,
        },
    });

    let mut controller = controller_over(&service);
    let outcome = controller.advance(AdvanceInput::new()).await.unwrap();

    assert_eq!(
        outcome,
        AdvanceOutcome::Completed {
            reached: Stage::Outline,
            done: false
        }
    );
    assert_eq!(controller.phase(), PipelinePhase::InStage(Stage::Content));
    assert!(controller.cache().has(Stage::Intent));
    assert!(controller.cache().has(Stage::Style));
    assert!(controller.cache().has(Stage::Outline));
    assert!(!controller.cache().has(Stage::Content));
    assert_eq!(
        controller.results().outline.as_ref().map(|o| o.slides.len()),
        Some(2)
    );
}

#[tokio::test]
async fn test_stop_at_marks_run_done() {
    let service = Arc::new(ScriptedService::new());
    service.push_response(StageResponse::Completed {
        reached: Stage::Outline,
        artifacts: StageArtifacts::default(),
    });

    let mut controller = controller_over(&service);
    let outcome = controller
        .advance(AdvanceInput::new().with_stop_at(Stage::Outline))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AdvanceOutcome::Completed {
            reached: Stage::Outline,
            done: true
        }
    );
    assert_eq!(controller.phase(), PipelinePhase::Complete);
    assert_eq!(service.requests()[0].stop_at, Some(Stage::Outline));
}

#[tokio::test]
async fn test_session_create_failure_is_fatal_and_sends_nothing() {
    let service = Arc::new(ScriptedService::new());
    service.fail_session_create("backend unreachable");

    let mut controller = controller_over(&service);
    let err = controller.advance(AdvanceInput::new()).await.unwrap_err();

    assert!(matches!(err, DeckflowError::SessionCreate(_)));
    assert!(service.requests().is_empty());
    assert_eq!(controller.session_id(), None);
    assert_eq!(controller.phase(), PipelinePhase::NotStarted);
    assert!(!controller.is_busy());
}

#[tokio::test]
async fn test_stage_error_leaves_state_unchanged() {
    let service = Arc::new(ScriptedService::new());
    service.push_response(StageResponse::Completed {
        reached: Stage::Intent,
        artifacts: intent_artifacts(),
    });
    service.push_response(StageResponse::Failed {
        message: "style model overloaded".into(),
    });
    service.push_response(StageResponse::Completed {
        reached: Stage::Style,
        artifacts: StageArtifacts::default(),
    });

    let mut controller = controller_over(&service);
    controller.advance(AdvanceInput::new()).await.unwrap();
    let phase_before = controller.phase();

    let err = controller.advance(AdvanceInput::new()).await.unwrap_err();
    assert!(matches!(err, DeckflowError::Service(_)));
    assert!(err.is_retryable());
    assert_eq!(controller.phase(), phase_before);
    assert!(controller.cache().has(Stage::Intent));

    // Retrying the identical call succeeds without any manual repair.
    let outcome = controller.advance(AdvanceInput::new()).await.unwrap();
    assert_eq!(
        outcome,
        AdvanceOutcome::Completed {
            reached: Stage::Style,
            done: false
        }
    );
}

#[tokio::test]
async fn test_resume_reuses_cached_session_and_results() {
    let service = Arc::new(ScriptedService::new());
    service.push_response(StageResponse::Completed {
        reached: Stage::Style,
        artifacts: StageArtifacts {
            intent: Some(json!({"subject": "hydraulics"})),
            style: Some(StyleBundle::default()),
            ..StageArtifacts::default()
        },
    });

    let mut first = controller_over(&service);
    first.advance(AdvanceInput::new()).await.unwrap();
    let cache = first.cache().clone();

    // A fresh controller seeded with the cache resumes at the outline stage
    // without creating a second session.
    service.push_response(StageResponse::Completed {
        reached: Stage::Outline,
        artifacts: StageArtifacts::default(),
    });
    let mut second = controller_over(&service);
    second.seed_cache(cache);
    let outcome = second
        .advance(AdvanceInput::new().resuming_at(Stage::Outline))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        AdvanceOutcome::Completed {
            reached: Stage::Outline,
            done: false
        }
    );
    assert_eq!(service.sessions_created(), 1);
    assert_eq!(second.session_id(), Some("sess-1"));
    assert!(second.results().intent.is_some());
    assert!(second.results().style.is_some());
}

#[tokio::test]
async fn test_invalidate_from_intent_forgets_session() {
    let service = Arc::new(ScriptedService::new());
    service.push_response(StageResponse::Completed {
        reached: Stage::Intent,
        artifacts: intent_artifacts(),
    });
    service.push_response(StageResponse::Completed {
        reached: Stage::Intent,
        artifacts: intent_artifacts(),
    });

    let mut controller = controller_over(&service);
    controller.advance(AdvanceInput::new()).await.unwrap();
    assert_eq!(controller.session_id(), Some("sess-1"));

    controller.invalidate_from(Stage::Intent);
    assert!(!controller.cache().has(Stage::Intent));
    assert_eq!(controller.session_id(), None);

    // The next advance starts a brand-new session.
    controller.advance(AdvanceInput::new()).await.unwrap();
    assert_eq!(controller.session_id(), Some("sess-2"));
}

#[tokio::test]
async fn test_accept_defaults_and_style_override_forwarded() {
    let service = Arc::new(ScriptedService::new());
    service.push_response(StageResponse::Completed {
        reached: Stage::Intent,
        artifacts: StageArtifacts::default(),
    });

    let mut controller = controller_over(&service);
    controller
        .advance(
            AdvanceInput::new()
                .accepting_defaults()
                .with_style_override("minimal-dark"),
        )
        .await
        .unwrap();

    let request = &service.requests()[0];
    assert!(request.accept_defaults);
    assert_eq!(request.style_override.as_deref(), Some("minimal-dark"));
}

#[tokio::test]
async fn test_reset_clears_run_state() {
    let service = Arc::new(ScriptedService::new());
    service.push_response(StageResponse::Completed {
        reached: Stage::Intent,
        artifacts: intent_artifacts(),
    });

    let mut controller = controller_over(&service);
    controller
        .advance(AdvanceInput::new().with_answer("page_count", json!(5)))
        .await
        .unwrap();

    controller.reset(false);
    assert_eq!(controller.phase(), PipelinePhase::NotStarted);
    assert_eq!(controller.session_id(), None);
    assert!(controller.answers().is_empty());
    assert!(controller.results().intent.is_none());
    // The cache survives a soft reset.
    assert!(controller.cache().has(Stage::Intent));

    controller.reset(true);
    assert!(!controller.cache().has(Stage::Intent));
}

#[tokio::test]
async fn test_final_stage_completion_finishes_the_run() {
    let service = Arc::new(ScriptedService::new());
    service.push_response(StageResponse::Completed {
        reached: Stage::Render,
        artifacts: StageArtifacts::default(),
    });

    let mut controller = controller_over(&service);
    let outcome = controller.advance(AdvanceInput::new()).await.unwrap();

    assert_eq!(
        outcome,
        AdvanceOutcome::Completed {
            reached: Stage::Render,
            done: true
        }
    );
    assert_eq!(controller.phase(), PipelinePhase::Complete);
    assert_eq!(controller.display_status(), "Done");
}

#[tokio::test]
async fn test_health_probe_passes_through() {
    let service = Arc::new(ScriptedService::new());
    let controller = controller_over(&service);

    let health = controller.check_health().await.unwrap();
    assert_eq!(health["status"], json!("ok"));
}
