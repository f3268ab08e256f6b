//! # Deckflow
//!
//! Client-side orchestration for a staged, server-backed slide deck
//! generator. The remote service does the generative work; this crate
//! drives the stage chain, pauses it for user input, caches stage results
//! for resumption, and fans out per-slide work under a concurrency ceiling.
//!
//! - **Stage pipeline controller**: an explicit state machine over the
//!   intent → style → outline → content → render chain, with interactive
//!   sub-states and a stop-at directive
//! - **Step cache**: deep-copied per-stage results with downstream
//!   invalidation and resume-from-prefix
//! - **Item executor**: bounded-concurrency per-slide generation with
//!   per-item status and selective retry
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use deckflow::prelude::*;
//!
//! let service = Arc::new(HttpGenerationService::new(HttpConfig::from_env())?);
//! let mut controller = PipelineController::new(service.clone());
//!
//! let mut outcome = controller
//!     .advance(AdvanceInput::new().with_user_text("a deck about hydraulics"))
//!     .await?;
//! while let AdvanceOutcome::NeedsInput { questions, .. } = outcome {
//!     let answers = collect_answers(&questions);
//!     outcome = controller.advance(AdvanceInput { answers, ..Default::default() }).await?;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cache;
pub mod controller;
pub mod core;
pub mod editor;
pub mod errors;
pub mod events;
pub mod executor;
pub mod observability;
pub mod progress;
pub mod service;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cache::{CacheBundle, CachedStep, SlotSummary, StepCache};
    pub use crate::controller::{
        status_label, AdvanceInput, AdvanceOutcome, DisplayHints, PipelineController,
        StageResults,
    };
    pub use crate::core::{
        transition, InteractionState, ItemStatus, PipelinePhase, Stage, StageEvent,
    };
    pub use crate::editor::OutlineEditor;
    pub use crate::errors::DeckflowError;
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, MessageLog, NoOpEventSink, Toast,
        ToastHub, ToastKind,
    };
    pub use crate::executor::{
        ItemExecutor, ItemSlot, ItemTask, OutlineExpandTask, Progress, SlideContentTask,
        SweepPolicy,
    };
    pub use crate::progress::{ProgressGauge, SimulatedProgress};
    pub use crate::service::{
        coerce_answer, DeckContent, GenerationService, InputShape, Outline, OutlineSlide,
        Question, SessionSnapshot, StageArtifacts, StageRequest, StageResponse, StyleBundle,
    };
    pub use crate::utils::{generate_uuid, iso_timestamp};

    #[cfg(feature = "http")]
    pub use crate::service::{HttpConfig, HttpGenerationService};
}
