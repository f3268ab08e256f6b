//! Tracing setup and structured span attributes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Installs a global tracing subscriber with the given filter directive.
///
/// Safe to call more than once; later calls are no-ops. Intended for
/// binaries and example programs, never called by the library itself.
pub fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init()
        .ok();
}

/// Span attributes describing one pipeline run position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowSpanAttributes {
    /// Session ID.
    pub session_id: Option<String>,
    /// Client-side run ID.
    pub run_id: Option<String>,
    /// Stage being dispatched.
    pub stage: Option<String>,
}

impl FlowSpanAttributes {
    /// Creates empty attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session ID.
    #[must_use]
    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    /// Sets the run ID.
    #[must_use]
    pub fn with_run_id(mut self, id: impl Into<String>) -> Self {
        self.run_id = Some(id.into());
        self
    }

    /// Sets the stage.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Converts to a flat attribute map for span annotation.
    #[must_use]
    pub fn as_map(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        if let Some(ref v) = self.session_id {
            attrs.insert("flow.session_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.run_id {
            attrs.insert("flow.run_id".to_string(), v.clone());
        }
        if let Some(ref v) = self.stage {
            attrs.insert("flow.stage".to_string(), v.clone());
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_span_attributes_map() {
        let attrs = FlowSpanAttributes::new()
            .with_session_id("sess-1")
            .with_stage("outline");

        let map = attrs.as_map();
        assert_eq!(map.get("flow.session_id"), Some(&"sess-1".to_string()));
        assert_eq!(map.get("flow.stage"), Some(&"outline".to_string()));
        assert!(!map.contains_key("flow.run_id"));
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing("debug");
        init_tracing("not a real directive ;;;");
    }
}
