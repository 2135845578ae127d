//! Workflow configuration

use crate::domain::ResponderId;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest visit cap that still lets a run reach a responder and synthesis
/// (classify, route, respond, evaluate, synthesize).
pub const MIN_NODE_VISITS: usize = 5;

fn default_max_node_visits() -> usize {
    16
}
fn default_max_total_consultations() -> usize {
    5
}
fn default_max_consultations_per_responder() -> usize {
    2
}
fn default_responder() -> ResponderId {
    ResponderId::News
}
fn default_node_timeout_secs() -> u64 {
    60
}
fn default_request_timeout_secs() -> u64 {
    180
}

/// Engine limits and routing fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Global hard cap on node executions per run
    #[serde(default = "default_max_node_visits")]
    pub max_node_visits: usize,
    /// Responder executions after which the judge is no longer consulted
    #[serde(default = "default_max_total_consultations")]
    pub max_total_consultations: usize,
    /// Executions of one responder after which it is never rerun
    #[serde(default = "default_max_consultations_per_responder")]
    pub max_consultations_per_responder: usize,
    /// Responder for unclassifiable queries
    #[serde(default = "default_responder")]
    pub default_responder: ResponderId,
    /// Time budget for one node (one external call)
    #[serde(default = "default_node_timeout_secs")]
    pub node_timeout_secs: u64,
    /// Time budget for the whole run
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_node_visits: default_max_node_visits(),
            max_total_consultations: default_max_total_consultations(),
            max_consultations_per_responder: default_max_consultations_per_responder(),
            default_responder: default_responder(),
            node_timeout_secs: default_node_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl WorkflowConfig {
    /// Per-node timeout
    #[must_use]
    pub fn node_timeout(&self) -> Duration {
        Duration::from_secs(self.node_timeout_secs)
    }

    /// Whole-run timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for the first bad field
    pub fn validate(&self) -> Result<()> {
        if self.max_node_visits < MIN_NODE_VISITS {
            return Err(invalid(
                "max_node_visits",
                format!("must be at least {MIN_NODE_VISITS}, got {}", self.max_node_visits),
            ));
        }
        if self.max_total_consultations == 0 {
            return Err(invalid("max_total_consultations", "must be greater than 0"));
        }
        if self.max_consultations_per_responder == 0 {
            return Err(invalid(
                "max_consultations_per_responder",
                "must be greater than 0",
            ));
        }
        if self.node_timeout_secs == 0 {
            return Err(invalid("node_timeout_secs", "must be greater than 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("request_timeout_secs", "must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::InvalidConfig {
        field: field.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkflowConfig::default();
        assert_eq!(config.max_total_consultations, 5);
        assert_eq!(config.max_consultations_per_responder, 2);
        assert_eq!(config.default_responder, ResponderId::News);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: WorkflowConfig =
            serde_json::from_str(r#"{"max_node_visits": 30, "default_responder": "health"}"#)
                .unwrap();
        assert_eq!(config.max_node_visits, 30);
        assert_eq!(config.default_responder, ResponderId::Health);
        assert_eq!(config.node_timeout_secs, 60);
    }

    #[test]
    fn test_validate_rejects_small_cap() {
        let config = WorkflowConfig {
            max_node_visits: 4,
            ..Default::default()
        };
        match config.validate() {
            Err(Error::InvalidConfig { field, .. }) => assert_eq!(field, "max_node_visits"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_caps() {
        let config = WorkflowConfig {
            max_consultations_per_responder: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
