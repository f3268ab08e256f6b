//! Error types for deckflow operations.
//!
//! The taxonomy follows the retry posture of each failure: transport and
//! service errors leave the pipeline resumable from its last good state,
//! session-creation failures abort only the `advance` call that needed the
//! session, and answer-coercion errors are reported before anything is sent.

use thiserror::Error;

/// The main error type for deckflow operations.
#[derive(Debug, Error)]
pub enum DeckflowError {
    /// The call to the generation service did not complete.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service reported a logical error; the message is forwarded
    /// verbatim and the stage or item is left retryable.
    #[error("Service error: {0}")]
    Service(String),

    /// Creating a session failed. Fatal to the `advance` call that
    /// required it; a later call may retry.
    #[error("Session creation failed: {0}")]
    SessionCreate(String),

    /// A payload could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A submitted answer does not match its question's declared shape.
    #[error("Invalid answer for '{key}': {reason}")]
    InvalidAnswer {
        /// The question key the answer was submitted under.
        key: String,
        /// Why the coercion failed.
        reason: String,
    },
}

impl DeckflowError {
    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a service-reported error.
    #[must_use]
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }

    /// Creates an invalid-answer error.
    #[must_use]
    pub fn invalid_answer(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAnswer {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// Everything except a malformed payload is retryable; nothing in the
    /// orchestration core is unrecoverable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Serialization(_) | Self::InvalidAnswer { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeckflowError::service("outline synthesis failed");
        assert_eq!(err.to_string(), "Service error: outline synthesis failed");

        let err = DeckflowError::invalid_answer("page_count", "not a number");
        assert_eq!(
            err.to_string(),
            "Invalid answer for 'page_count': not a number"
        );
    }

    #[test]
    fn test_retryability() {
        assert!(DeckflowError::transport("timeout").is_retryable());
        assert!(DeckflowError::service("busy").is_retryable());
        assert!(DeckflowError::SessionCreate("busy".into()).is_retryable());
        assert!(!DeckflowError::invalid_answer("k", "bad").is_retryable());
    }
}
