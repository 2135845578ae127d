//! Sequential graph execution

use super::definition::{GraphDefinition, Node, Target};
use crate::error::{Error, Result};
use crate::event_bus::{EventBus, WorkflowEvent};
use crate::state::{ExecutionState, HistoryEntry, HistoryKind, StatePatch};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Sequential graph executor
///
/// Runs one node at a time from the entry until [`Target::End`]. After
/// `max_visits` node executions the next node is replaced by the graph's
/// finalizer, and the run ends once the finalizer has run. Hitting the cap
/// is recorded in history, not returned as an error.
#[derive(Debug, Clone)]
pub struct GraphEngine {
    max_visits: usize,
    node_timeout: Duration,
    events: Option<EventBus>,
}

impl GraphEngine {
    /// Engine with a visit cap and a per-node timeout
    #[must_use]
    pub fn new(max_visits: usize, node_timeout: Duration) -> Self {
        Self {
            max_visits,
            node_timeout,
            events: None,
        }
    }

    /// Publish progress events to `bus`
    #[must_use]
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    /// Global visit cap
    #[must_use]
    pub fn max_visits(&self) -> usize {
        self.max_visits
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }

    /// Drive `initial` through `graph`.
    ///
    /// # Errors
    /// - [`Error::Cancelled`] when `cancel` fires; no further node runs
    /// - [`Error::NodeFailed`] wrapping the first node error or node timeout
    pub async fn execute(
        &self,
        graph: &GraphDefinition,
        initial: ExecutionState,
        cancel: &CancellationToken,
    ) -> Result<ExecutionState> {
        let request_id = initial.request_id();
        let mut state = initial;
        let mut current = graph.entry().to_string();
        let mut visits = 0usize;

        loop {
            if cancel.is_cancelled() {
                info!(request_id = %request_id, node = %current, "Run cancelled before node");
                return Err(Error::Cancelled);
            }

            if visits >= self.max_visits && current != graph.finalizer() {
                warn!(
                    request_id = %request_id,
                    visits,
                    skipped = %current,
                    "Visit cap reached, jumping to finalizer"
                );
                state = state.merge(StatePatch::new().with_history(HistoryEntry::new(
                    HistoryKind::CapReached,
                    format!("{visits} node visits; skipped '{current}'"),
                )));
                self.emit(WorkflowEvent::CapReached { request_id, visits });
                current = graph.finalizer().to_string();
            }

            let node = graph
                .node(&current)
                .ok_or_else(|| Error::Graph(format!("unknown node '{current}'")))?;
            visits += 1;
            debug!(request_id = %request_id, node = %current, visits, "Running node");
            self.emit(WorkflowEvent::NodeStarted {
                request_id,
                node: current.clone(),
                visit: visits,
            });

            let seen = state.history().len();
            let patch = self
                .run_node(node, &current, &state, request_id, cancel)
                .await?;
            state = state.merge(patch);
            self.emit_history(&state, seen);

            if current == graph.finalizer() && visits >= self.max_visits {
                break;
            }
            match graph.resolve_next(&current, &state)? {
                Target::End => break,
                Target::Node(next) => current = next,
            }
        }

        debug!(request_id = %request_id, visits, "Run reached end");
        Ok(state)
    }

    async fn run_node(
        &self,
        node: Arc<dyn Node>,
        node_id: &str,
        state: &ExecutionState,
        request_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<StatePatch> {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!(request_id = %request_id, node = %node_id, "Run cancelled during node");
                return Err(Error::Cancelled);
            }
            outcome = tokio::time::timeout(self.node_timeout, node.run(state)) => outcome,
        };

        match outcome {
            Ok(Ok(patch)) => Ok(patch),
            Ok(Err(e)) => {
                error!(request_id = %request_id, node = %node_id, error = %e, "Node failed");
                Err(Error::node_failed(node_id, request_id, e))
            }
            Err(_) => {
                let ms = u64::try_from(self.node_timeout.as_millis()).unwrap_or(u64::MAX);
                error!(request_id = %request_id, node = %node_id, timeout_ms = ms, "Node timed out");
                Err(Error::node_failed(node_id, request_id, Error::Timeout(ms)))
            }
        }
    }

    /// Side-effect notifications for the entries a node just appended
    fn emit_history(&self, state: &ExecutionState, from: usize) {
        if self.events.is_none() {
            return;
        }
        let request_id = state.request_id();
        for entry in state.history().iter().skip(from) {
            let event = match (entry.kind, entry.responder_id) {
                (HistoryKind::ResponderExecuted, Some(responder)) => {
                    WorkflowEvent::ResponderAnswered {
                        request_id,
                        responder,
                    }
                }
                (HistoryKind::RerouteAccepted, Some(responder)) => WorkflowEvent::RerouteAccepted {
                    request_id,
                    responder,
                },
                (HistoryKind::HardStop, _) => WorkflowEvent::HardStop {
                    request_id,
                    total_consultations: state.total_consultations(),
                },
                _ => continue,
            };
            self.emit(event);
        }
    }
}
