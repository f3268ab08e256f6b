//! The external generation-service boundary.
//!
//! The remote service actually performs each stage's computation; this
//! module only defines the request/response contract. Any transport
//! satisfies it — an HTTP implementation is provided behind the `http`
//! feature.

mod questions;
mod types;

#[cfg(feature = "http")]
mod http;

pub use questions::{coerce_answer, InputShape, Question};
pub use types::{
    DeckContent, Outline, OutlineSlide, SessionSnapshot, StageArtifacts, StageRequest,
    StageResponse, StyleBundle,
};

#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpGenerationService};

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::DeckflowError;

/// Request/response boundary to the remote generative service.
///
/// Every method is a suspension point. Stage calls are idempotent from the
/// client's perspective: re-invoking with the same session and inputs is
/// safe to retry.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Creates a new session and returns its identifier.
    async fn create_session(&self) -> Result<String, DeckflowError>;

    /// Fetches the server-side view of a session.
    async fn fetch_session(&self, session_id: &str) -> Result<SessionSnapshot, DeckflowError>;

    /// Runs or advances a stage.
    ///
    /// A service-reported logical error is returned as
    /// [`StageResponse::Failed`]; an `Err` means the call itself did not
    /// complete.
    async fn run_stage(&self, request: &StageRequest) -> Result<StageResponse, DeckflowError>;

    /// Generates content for a single slide.
    async fn generate_item(
        &self,
        session_id: &str,
        index: usize,
        context: Option<&Value>,
    ) -> Result<Value, DeckflowError>;

    /// Expands a single outline slide into detailed bullets.
    async fn expand_item(&self, session_id: &str, index: usize) -> Result<Value, DeckflowError>;

    /// Replaces the session's outline slides with an edited sequence.
    async fn update_outline(
        &self,
        session_id: &str,
        slides: &[OutlineSlide],
    ) -> Result<(), DeckflowError>;

    /// Probes service liveness.
    async fn health(&self) -> Result<Value, DeckflowError>;
}
