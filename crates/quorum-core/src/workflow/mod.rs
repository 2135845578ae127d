//! The assembled query workflow
//!
//! ```text
//! classify ─► route ─► respond ─► evaluate ─┬─ Complete ─► synthesize ─► END
//!                         ▲                  │
//!                         └──── Reroute ─────┘
//! ```

pub mod nodes;

use crate::collaborators::{Classifier, Judge, SynthesisBackend};
use crate::config::WorkflowConfig;
use crate::domain::{ResponderId, Topic};
use crate::error::{Error, Result};
use crate::evaluator::CompletenessEvaluator;
use crate::event_bus::{EventBus, WorkflowEvent};
use crate::graph::{Branch, GraphBuilder, GraphDefinition, GraphEngine, END};
use crate::registry::ResponderRegistry;
use crate::router::Router;
use crate::state::{ExecutionState, HistoryEntry};
use crate::synthesizer::Synthesizer;
use nodes::{
    after_evaluation, ids, ClassifyNode, EvaluateNode, RespondNode, RouteNode, SynthesizeNode,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of one answered query
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// Request identifier
    pub request_id: Uuid,
    /// Final answer
    pub response: String,
    /// Classified topic, or the fallback topic when the output named none
    pub topic: Option<Topic>,
    /// Distinct responders executed, in order of first execution
    pub agents_consulted: Vec<ResponderId>,
    /// Full audit log of the run
    pub history: Vec<HistoryEntry>,
    /// Whether the global visit cap cut the run short
    pub cap_reached: bool,
}

impl QueryOutcome {
    fn from_state(state: ExecutionState) -> Result<Self> {
        let response = state
            .final_response()
            .map(str::to_string)
            .ok_or_else(|| Error::Synthesis("run ended without a final response".to_string()))?;
        Ok(Self {
            request_id: state.request_id(),
            response,
            topic: state.topic(),
            agents_consulted: state.consulted_in_order(),
            history: state.history().to_vec(),
            cap_reached: state.cap_reached(),
        })
    }
}

/// Classifier → router → responder ⇄ evaluator → synthesizer
pub struct QueryWorkflow {
    graph: GraphDefinition,
    engine: GraphEngine,
    config: WorkflowConfig,
    events: EventBus,
}

impl QueryWorkflow {
    /// Start assembling a workflow
    #[must_use]
    pub fn builder() -> QueryWorkflowBuilder {
        QueryWorkflowBuilder::default()
    }

    /// Engine configuration in use
    #[must_use]
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Event bus the workflow publishes to
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Answer one query.
    ///
    /// The run stops as soon as `cancel` fires or the request timeout
    /// elapses; partial state is discarded in both cases.
    ///
    /// # Errors
    /// [`Error::Cancelled`], [`Error::Timeout`], or [`Error::NodeFailed`]
    /// wrapping the collaborator failure that aborted the run
    #[tracing::instrument(skip(self, query, cancel), fields(request_id))]
    pub async fn answer(&self, query: &str, cancel: &CancellationToken) -> Result<QueryOutcome> {
        let initial = ExecutionState::new(query);
        let request_id = initial.request_id();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));

        info!(request_id = %request_id, "Starting run");
        self.events.publish(WorkflowEvent::RunStarted { request_id });

        let run_cancel = cancel.child_token();
        let timeout = self.config.request_timeout();
        let result = match tokio::time::timeout(
            timeout,
            self.engine.execute(&self.graph, initial, &run_cancel),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                run_cancel.cancel();
                Err(Error::Timeout(
                    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        };

        match result.and_then(QueryOutcome::from_state) {
            Ok(outcome) => {
                info!(
                    request_id = %request_id,
                    agents = ?outcome.agents_consulted,
                    cap_reached = outcome.cap_reached,
                    "Run completed"
                );
                self.events.publish(WorkflowEvent::RunCompleted {
                    request_id,
                    topic: outcome.topic,
                    agents_consulted: outcome.agents_consulted.clone(),
                });
                Ok(outcome)
            }
            Err(e) if e.is_cancelled() => {
                info!(request_id = %request_id, "Run cancelled");
                self.events
                    .publish(WorkflowEvent::RunCancelled { request_id });
                Err(e)
            }
            Err(e) => {
                warn!(request_id = %request_id, node = ?e.node(), error = %e, "Run failed");
                self.events.publish(WorkflowEvent::RunFailed {
                    request_id,
                    node: e.node().map(str::to_string),
                });
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for QueryWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryWorkflow")
            .field("graph", &self.graph)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`QueryWorkflow`]
#[derive(Default)]
pub struct QueryWorkflowBuilder {
    config: Option<WorkflowConfig>,
    classifier: Option<Arc<dyn Classifier>>,
    registry: Option<ResponderRegistry>,
    judge: Option<Arc<dyn Judge>>,
    synthesis: Option<Arc<dyn SynthesisBackend>>,
    events: Option<EventBus>,
}

impl QueryWorkflowBuilder {
    /// Engine configuration (defaults when unset)
    #[must_use]
    pub fn config(mut self, config: WorkflowConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Topic classifier
    #[must_use]
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Responders; every id must be registered
    #[must_use]
    pub fn responders(mut self, registry: ResponderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Completeness judge
    #[must_use]
    pub fn judge(mut self, judge: Arc<dyn Judge>) -> Self {
        self.judge = Some(judge);
        self
    }

    /// Synthesis collaborator
    #[must_use]
    pub fn synthesis(mut self, synthesis: Arc<dyn SynthesisBackend>) -> Self {
        self.synthesis = Some(synthesis);
        self
    }

    /// Event bus (a private one when unset)
    #[must_use]
    pub fn event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Validate and assemble.
    ///
    /// # Errors
    /// [`Error::InvalidConfig`] for bad limits, a missing collaborator or
    /// an incomplete registry; [`Error::Graph`] if the graph is malformed
    pub fn build(self) -> Result<QueryWorkflow> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let classifier = self.classifier.ok_or_else(|| missing("classifier"))?;
        let registry = self.registry.ok_or_else(|| missing("responders"))?;
        let judge = self.judge.ok_or_else(|| missing("judge"))?;
        let synthesis = self.synthesis.ok_or_else(|| missing("synthesis"))?;
        registry.ensure_complete()?;

        let evaluator = CompletenessEvaluator::new(
            judge,
            config.max_total_consultations,
            config.max_consultations_per_responder,
        );

        let graph = GraphBuilder::new()
            .add_node(
                ids::CLASSIFY,
                Arc::new(ClassifyNode {
                    classifier,
                    fallback: config.default_responder.topic(),
                }),
            )
            .add_node(
                ids::ROUTE,
                Arc::new(RouteNode {
                    router: Router::new(config.default_responder),
                }),
            )
            .add_node(ids::RESPOND, Arc::new(RespondNode { registry }))
            .add_node(ids::EVALUATE, Arc::new(EvaluateNode { evaluator }))
            .add_node(
                ids::SYNTHESIZE,
                Arc::new(SynthesizeNode {
                    synthesizer: Synthesizer::new(synthesis),
                }),
            )
            .add_edge(ids::CLASSIFY, ids::ROUTE)
            .add_edge(ids::ROUTE, ids::RESPOND)
            .add_edge(ids::RESPOND, ids::EVALUATE)
            .add_conditional_edges(
                ids::EVALUATE,
                Arc::new(after_evaluation),
                [
                    (Branch::Reroute, ids::RESPOND),
                    (Branch::Complete, ids::SYNTHESIZE),
                ],
            )
            .add_edge(ids::SYNTHESIZE, END)
            .set_entry(ids::CLASSIFY)
            .set_finalizer(ids::SYNTHESIZE)
            .build()?;

        let events = self.events.unwrap_or_default();
        let engine = GraphEngine::new(config.max_node_visits, config.node_timeout())
            .with_event_bus(events.clone());

        Ok(QueryWorkflow {
            graph,
            engine,
            config,
            events,
        })
    }
}

fn missing(field: &str) -> Error {
    Error::InvalidConfig {
        field: field.to_string(),
        message: "not set".to_string(),
    }
}
