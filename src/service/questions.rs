//! Pending questions and client-side answer coercion.
//!
//! The service describes each outstanding question abstractly; the client
//! round-trips whatever answer map the caller supplies verbatim. The only
//! client-side handling is coercing raw text into the declared input shape
//! (numeric parse, list split-and-trim) before submission.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DeckflowError;

/// Declared shape of a question's expected answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputShape {
    /// Free text.
    #[default]
    Text,
    /// Numeric value.
    Number,
    /// One choice from the enumerated option set.
    Select,
    /// Yes/no.
    Bool,
    /// Comma-delimited list of values.
    List,
    /// Either confirm the proposal as-is or add to it.
    ConfirmOrAdd,
}

/// One outstanding question reported by the service alongside a
/// `needs_input` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Key the answer must be submitted under.
    pub key: String,
    /// Human-facing prompt.
    #[serde(rename = "question")]
    pub prompt: String,
    /// Declared answer shape.
    #[serde(default)]
    pub input_type: InputShape,
    /// Option set for choice shapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Placeholder hint for free-text inputs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Whether an answer is required before the stage can complete.
    ///
    /// Not enforced client-side; the controller forwards whatever is
    /// submitted.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Page count the service recommends, when the question concerns a
    /// page-count conflict.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_count: Option<u32>,
    /// Service-provided explanation for its recommendation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

fn default_required() -> bool {
    true
}

impl Question {
    /// Creates a free-text question.
    #[must_use]
    pub fn new(key: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            prompt: prompt.into(),
            input_type: InputShape::Text,
            options: None,
            placeholder: None,
            required: true,
            recommended_count: None,
            explanation: None,
        }
    }

    /// Sets the input shape.
    #[must_use]
    pub fn with_shape(mut self, shape: InputShape) -> Self {
        self.input_type = shape;
        self
    }

    /// Sets the option set.
    #[must_use]
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    /// Marks the question optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Coerces a raw answer string into this question's declared shape.
    ///
    /// # Errors
    ///
    /// Returns [`DeckflowError::InvalidAnswer`] when the raw text cannot be
    /// parsed as the declared shape.
    pub fn coerce(&self, raw: &str) -> Result<Value, DeckflowError> {
        coerce_answer(self.input_type, raw).map_err(|reason| DeckflowError::InvalidAnswer {
            key: self.key.clone(),
            reason,
        })
    }
}

/// Coerces a raw answer string into the given input shape.
///
/// Text-like shapes pass through unchanged; numbers are parsed, lists are
/// split on commas and trimmed, booleans accept the usual spellings.
///
/// # Errors
///
/// Returns a human-readable reason string when parsing fails.
pub fn coerce_answer(shape: InputShape, raw: &str) -> Result<Value, String> {
    match shape {
        InputShape::Text | InputShape::Select | InputShape::ConfirmOrAdd => {
            Ok(Value::String(raw.to_string()))
        }
        InputShape::Number => {
            let trimmed = raw.trim();
            if let Ok(n) = trimmed.parse::<i64>() {
                return Ok(Value::from(n));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("'{raw}' is not a number"))
        }
        InputShape::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "n" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("'{raw}' is not a yes/no value")),
        },
        InputShape::List => {
            let parts: Vec<Value> = raw
                .split([',', '，'])
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(|p| Value::String(p.to_string()))
                .collect();
            Ok(Value::Array(parts))
        }
    }
}
