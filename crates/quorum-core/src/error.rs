//! Error types for quorum-core
//!
//! Collaborator failures carry their category (classification, responder,
//! evaluation, synthesis). The engine wraps whatever a node raises in
//! [`Error::NodeFailed`] so every abort names the node and the request.
//! Hitting the visit cap is not an error and has no variant here.

use crate::domain::ResponderId;
use thiserror::Error;
use uuid::Uuid;

/// Text returned to callers whenever a run aborts.
pub const FALLBACK_RESPONSE: &str =
    "Sorry, I couldn't complete an answer to your question right now. Please try again in a moment.";

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Topic classifier unreachable or returned an unusable reply
    #[error("classification error: {0}")]
    Classification(String),

    /// A domain responder failed
    #[error("responder '{responder}' failed: {message}")]
    Responder {
        /// Responder that failed
        responder: ResponderId,
        /// Failure description
        message: String,
    },

    /// Completeness judge unreachable or returned an unusable reply
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Synthesis collaborator unreachable or returned an unusable reply
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Graph misconfiguration detected while building a graph
    #[error("graph error: {0}")]
    Graph(String),

    /// Invalid configuration
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig {
        /// Config field name
        field: String,
        /// Detailed message
        message: String,
    },

    /// The caller cancelled the run
    #[error("run cancelled")]
    Cancelled,

    /// A node or the whole run exceeded its time budget
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// A node raised an error; the run was aborted
    #[error("node '{node}' failed (request {request_id}): {source}")]
    NodeFailed {
        /// Node that was running
        node: String,
        /// Request the run belonged to
        request_id: Uuid,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an error raised by a node.
    #[must_use]
    pub fn node_failed(node: impl Into<String>, request_id: Uuid, source: Error) -> Self {
        Error::NodeFailed {
            node: node.into(),
            request_id,
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through node wrappers.
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Error::NodeFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Node id the failure is tagged with, if any.
    #[must_use]
    pub fn node(&self) -> Option<&str> {
        match self {
            Error::NodeFailed { node, .. } => Some(node),
            _ => None,
        }
    }

    /// Whether the run stopped because the caller cancelled it.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Error::Cancelled)
    }
}

/// Trait for user-friendly error messages
///
/// Callers only ever see these texts; raw error details stay in the logs.
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get a suggestion for how to fix the error
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self.root() {
            Error::Cancelled => "The request was cancelled.".to_string(),
            Error::Timeout(_) => {
                "Sorry, answering took too long. Please try again in a moment.".to_string()
            }
            Error::Graph(_) | Error::InvalidConfig { .. } => {
                "The assistant is misconfigured. Please contact the operator.".to_string()
            }
            _ => FALLBACK_RESPONSE.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self.root() {
            Error::Timeout(_) => Some("Try a shorter or more specific question.".to_string()),
            Error::Graph(_) | Error::InvalidConfig { .. } => {
                Some("Run `quorum doctor` to check the configuration.".to_string())
            }
            _ => None,
        }
    }
}
