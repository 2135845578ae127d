use crate::domain::{ResponderId, Topic};
use serde::Serialize;
use uuid::Uuid;

/// Events emitted while a query runs.
///
/// Events carry ids and counters only, never answer text or raw error
/// detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A run has started
    RunStarted {
        /// Request identifier
        request_id: Uuid,
    },
    /// The engine is about to run a node
    NodeStarted {
        /// Request identifier
        request_id: Uuid,
        /// Node id
        node: String,
        /// Visits so far, including this one
        visit: usize,
    },
    /// A responder produced an answer
    ResponderAnswered {
        /// Request identifier
        request_id: Uuid,
        /// Responder that answered
        responder: ResponderId,
    },
    /// The judge's reroute suggestion was accepted
    RerouteAccepted {
        /// Request identifier
        request_id: Uuid,
        /// Responder that will run next
        responder: ResponderId,
    },
    /// A consultation cap forced completion
    HardStop {
        /// Request identifier
        request_id: Uuid,
        /// Total responder executions at the stop
        total_consultations: usize,
    },
    /// The global visit cap redirected the run to synthesis
    CapReached {
        /// Request identifier
        request_id: Uuid,
        /// Node visits at the cap
        visits: usize,
    },
    /// The run produced a final answer
    RunCompleted {
        /// Request identifier
        request_id: Uuid,
        /// Classified topic
        topic: Option<Topic>,
        /// Distinct responders consulted, in order
        agents_consulted: Vec<ResponderId>,
    },
    /// The run aborted
    RunFailed {
        /// Request identifier
        request_id: Uuid,
        /// Node that failed, when known
        node: Option<String>,
    },
    /// The caller cancelled the run
    RunCancelled {
        /// Request identifier
        request_id: Uuid,
    },
}

impl WorkflowEvent {
    /// Request id of any event.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        match self {
            Self::RunStarted { request_id }
            | Self::NodeStarted { request_id, .. }
            | Self::ResponderAnswered { request_id, .. }
            | Self::RerouteAccepted { request_id, .. }
            | Self::HardStop { request_id, .. }
            | Self::CapReached { request_id, .. }
            | Self::RunCompleted { request_id, .. }
            | Self::RunFailed { request_id, .. }
            | Self::RunCancelled { request_id } => *request_id,
        }
    }
}
