//! Reqwest-backed implementation of the generation service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::core::{InteractionState, Stage};
use crate::errors::DeckflowError;
use crate::service::{
    DeckContent, GenerationService, Outline, OutlineSlide, Question, SessionSnapshot,
    StageArtifacts, StageRequest, StageResponse, StyleBundle,
};

/// Configuration for the HTTP service client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the service, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpConfig {
    /// Creates a configuration for the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(300),
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads the base URL from `DECKFLOW_API_BASE`, if set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("DECKFLOW_API_BASE").ok().map(Self::new)
    }
}

/// HTTP client for the generation service.
pub struct HttpGenerationService {
    config: HttpConfig,
    client: reqwest::Client,
}

impl HttpGenerationService {
    /// Creates a client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DeckflowError::Transport`] if the underlying client cannot
    /// be constructed.
    pub fn new(config: HttpConfig) -> Result<Self, DeckflowError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DeckflowError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// Returns the URL of the session's server-side log stream.
    #[must_use]
    pub fn logs_url(&self, session_id: &str) -> String {
        format!("{}/api/logs/{session_id}", self.config.base_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    async fn get_json(&self, path: &str) -> Result<Value, DeckflowError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| DeckflowError::Transport(e.to_string()))?;
        Self::read_json(response).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, DeckflowError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| DeckflowError::Transport(e.to_string()))?;
        Self::read_json(response).await
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, DeckflowError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeckflowError::Transport(format!("HTTP {status}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|e| DeckflowError::Transport(e.to_string()))
    }
}

/// Wire shape of the session-creation response. Older deployments used
/// different field names for the id.
#[derive(Debug, Deserialize)]
struct CreateSessionWire {
    session_id: Option<String>,
    #[serde(rename = "sessionId")]
    session_id_camel: Option<String>,
    session: Option<String>,
}

impl CreateSessionWire {
    fn into_id(self) -> Option<String> {
        self.session_id.or(self.session_id_camel).or(self.session)
    }
}

/// Wire shape of the workflow run request body.
#[derive(Debug, Serialize)]
struct RunRequestWire<'a> {
    session_id: &'a str,
    user_text: Option<&'a str>,
    answers: &'a serde_json::Map<String, Value>,
    auto_fill_defaults: bool,
    stop_at: Option<Stage>,
    style_name: Option<&'a str>,
}

/// Wire shape of the workflow run response.
#[derive(Debug, Deserialize)]
struct RunResponseWire {
    status: String,
    stage: Option<Stage>,
    #[serde(default)]
    questions: Vec<Question>,
    intent: Option<Value>,
    style_config: Option<Value>,
    #[serde(default)]
    style_samples: Vec<Value>,
    outline: Option<Outline>,
    deck_content: Option<DeckContent>,
    interaction_stage: Option<InteractionState>,
    message: Option<String>,
}

/// Wire shape of per-item generate/expand responses.
#[derive(Debug, Deserialize)]
struct ItemResponseWire {
    #[serde(default)]
    ok: bool,
    content: Option<Value>,
    slide: Option<Value>,
    error: Option<String>,
}

/// Wire shape of mutation acknowledgements (outline update).
#[derive(Debug, Deserialize)]
struct AckWire {
    #[serde(default)]
    ok: bool,
    error: Option<String>,
}

fn interpret_run_response(wire: RunResponseWire) -> Result<StageResponse, DeckflowError> {
    match wire.status.as_str() {
        "need_user_input" => Ok(StageResponse::NeedsInput {
            stage: wire.stage.unwrap_or(Stage::Intent),
            interaction: wire.interaction_stage,
            questions: wire.questions,
            partial_intent: wire.intent,
        }),
        "ok" => {
            let reached = wire
                .stage
                .ok_or_else(|| DeckflowError::service("ok response without a stage tag"))?;
            let style = wire.style_config.map(|config| StyleBundle {
                config,
                samples: wire.style_samples,
            });
            Ok(StageResponse::Completed {
                reached,
                artifacts: StageArtifacts {
                    intent: wire.intent,
                    style,
                    outline: wire.outline,
                    content: wire.deck_content,
                },
            })
        }
        "error" => Ok(StageResponse::Failed {
            message: wire.message.unwrap_or_else(|| "workflow error".to_string()),
        }),
        other => Err(DeckflowError::service(format!(
            "unknown response status: {other}"
        ))),
    }
}

fn interpret_ack(wire: AckWire) -> Result<(), DeckflowError> {
    if wire.ok {
        Ok(())
    } else {
        Err(DeckflowError::Service(
            wire.error.unwrap_or_else(|| "update failed".to_string()),
        ))
    }
}

fn interpret_item_response(wire: ItemResponseWire) -> Result<Value, DeckflowError> {
    if wire.ok {
        wire.content
            .or(wire.slide)
            .ok_or_else(|| DeckflowError::service("ok item response without content"))
    } else {
        Err(DeckflowError::Service(
            wire.error.unwrap_or_else(|| "generation failed".to_string()),
        ))
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn create_session(&self) -> Result<String, DeckflowError> {
        let value = self
            .post_json("/api/session", &Value::Object(serde_json::Map::new()))
            .await?;
        let wire: CreateSessionWire = serde_json::from_value(value)?;
        wire.into_id()
            .ok_or_else(|| DeckflowError::service("session response without an id"))
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionSnapshot, DeckflowError> {
        let raw = self.get_json(&format!("/api/session/{session_id}")).await?;
        let stage = raw
            .get("stage")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());
        let interaction = raw
            .get("interaction_stage")
            .and_then(Value::as_str)
            .map(|s| InteractionState::from(s.to_string()));
        Ok(SessionSnapshot {
            session_id: session_id.to_string(),
            stage,
            interaction,
            raw,
        })
    }

    async fn run_stage(&self, request: &StageRequest) -> Result<StageResponse, DeckflowError> {
        let body = serde_json::to_value(RunRequestWire {
            session_id: &request.session_id,
            user_text: request.user_text.as_deref(),
            answers: &request.answers,
            auto_fill_defaults: request.accept_defaults,
            stop_at: request.stop_at,
            style_name: request.style_override.as_deref(),
        })?;
        let value = self.post_json("/api/workflow/run", &body).await?;
        let wire: RunResponseWire = serde_json::from_value(value)?;
        interpret_run_response(wire)
    }

    async fn generate_item(
        &self,
        session_id: &str,
        index: usize,
        context: Option<&Value>,
    ) -> Result<Value, DeckflowError> {
        let body = serde_json::json!({
            "session_id": session_id,
            "slide_index": index,
            "context": context,
        });
        let value = self.post_json("/api/workflow/slide/generate", &body).await?;
        let wire: ItemResponseWire = serde_json::from_value(value)?;
        interpret_item_response(wire)
    }

    async fn expand_item(&self, session_id: &str, index: usize) -> Result<Value, DeckflowError> {
        let body = serde_json::json!({
            "session_id": session_id,
            "slide_index": index,
        });
        let value = self.post_json("/api/workflow/outline/expand", &body).await?;
        let wire: ItemResponseWire = serde_json::from_value(value)?;
        interpret_item_response(wire)
    }

    async fn update_outline(
        &self,
        session_id: &str,
        slides: &[OutlineSlide],
    ) -> Result<(), DeckflowError> {
        let body = serde_json::json!({
            "session_id": session_id,
            "slides": slides,
        });
        let value = self.post_json("/api/workflow/outline/update", &body).await?;
        let wire: AckWire = serde_json::from_value(value)?;
        interpret_ack(wire)
    }

    async fn health(&self) -> Result<Value, DeckflowError> {
        self.get_json("/api/health").await
    }
}
