//! Request and response types for the generation service boundary.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{InteractionState, Stage};
use crate::service::Question;

/// Input to one stage dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRequest {
    /// Session the stage runs under.
    pub session_id: String,
    /// Free-text request; only meaningful when starting the intent stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_text: Option<String>,
    /// Running answer map, forwarded verbatim.
    #[serde(default)]
    pub answers: Map<String, Value>,
    /// Accept service defaults for all pending questions.
    #[serde(default)]
    pub accept_defaults: bool,
    /// Stop the chain once this stage completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_at: Option<Stage>,
    /// Explicit style selection, used only when the style stage is bypassed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_override: Option<String>,
}

impl StageRequest {
    /// Creates a request for the given session.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_text: None,
            answers: Map::new(),
            accept_defaults: false,
            stop_at: None,
            style_override: None,
        }
    }

    /// Sets the free-text request.
    #[must_use]
    pub fn with_user_text(mut self, text: impl Into<String>) -> Self {
        self.user_text = Some(text.into());
        self
    }

    /// Sets the answer map.
    #[must_use]
    pub fn with_answers(mut self, answers: Map<String, Value>) -> Self {
        self.answers = answers;
        self
    }

    /// Sets the stop-at directive.
    #[must_use]
    pub fn with_stop_at(mut self, stage: Stage) -> Self {
        self.stop_at = Some(stage);
        self
    }
}

/// One slide descriptor within an outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineSlide {
    /// Slide title.
    pub title: String,
    /// Bullet points; may be empty before expansion.
    #[serde(default)]
    pub bullets: Vec<String>,
    /// Layout/type tag, when the service assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide_type: Option<String>,
    /// Fields this client does not model, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OutlineSlide {
    /// Creates a slide with the given title and no bullets.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bullets: Vec::new(),
            slide_type: None,
            extra: Map::new(),
        }
    }
}

/// Outline stage result: deck title plus an ordered slide sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Title of the deck.
    #[serde(alias = "title")]
    pub deck_title: String,
    /// Ordered slide descriptors.
    #[serde(default)]
    pub slides: Vec<OutlineSlide>,
}

/// Style stage result: the chosen configuration plus sample slides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleBundle {
    /// Chosen style configuration, forwarded as-is.
    pub config: Value,
    /// Sample slides rendered in the chosen style.
    #[serde(default)]
    pub samples: Vec<Value>,
}

/// Content stage result: assembled per-page deck content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckContent {
    /// Title of the deck.
    pub deck_title: String,
    /// Page payloads, one per slide.
    #[serde(default)]
    pub pages: Vec<Value>,
}

/// Artifacts carried by a completed-stage response.
///
/// A single response may carry results for several stages when the service
/// ran a chain; the controller caches every artifact present under its
/// owning stage. Nothing here is ever defaulted: absent means the service
/// did not produce it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageArtifacts {
    /// Structured intent (the intent stage's result).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Value>,
    /// Style configuration and samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<StyleBundle>,
    /// Deck outline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<Outline>,
    /// Assembled deck content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<DeckContent>,
}

impl StageArtifacts {
    /// Returns true if no artifact is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intent.is_none()
            && self.style.is_none()
            && self.outline.is_none()
            && self.content.is_none()
    }

    /// Returns the stages for which an artifact is present, in order.
    #[must_use]
    pub fn stages_present(&self) -> Vec<Stage> {
        let mut stages = Vec::new();
        if self.intent.is_some() {
            stages.push(Stage::Intent);
        }
        if self.style.is_some() {
            stages.push(Stage::Style);
        }
        if self.outline.is_some() {
            stages.push(Stage::Outline);
        }
        if self.content.is_some() {
            stages.push(Stage::Content);
        }
        stages
    }
}

/// Outcome of one stage dispatch, as interpreted from the service response.
#[derive(Debug, Clone, PartialEq)]
pub enum StageResponse {
    /// The stage is suspended awaiting answers to the listed questions.
    NeedsInput {
        /// The stage that is suspended (unchanged from dispatch).
        stage: Stage,
        /// Sub-state tag governing what the next submission means.
        interaction: Option<InteractionState>,
        /// Outstanding questions.
        questions: Vec<Question>,
        /// Partial intermediate result, when the service shares one.
        partial_intent: Option<Value>,
    },
    /// The stage (and possibly earlier chained stages) completed.
    Completed {
        /// The furthest stage the service completed.
        reached: Stage,
        /// Results produced, keyed by owning stage.
        artifacts: StageArtifacts,
    },
    /// The service reported a logical error; nothing advanced.
    Failed {
        /// Error message, forwarded verbatim.
        message: String,
    },
}

/// Server-side view of a session, fetched on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub session_id: String,
    /// Stage the server considers current.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Last-known sub-state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction: Option<InteractionState>,
    /// Raw stage payloads as stored server-side.
    #[serde(default)]
    pub raw: Value,
}
