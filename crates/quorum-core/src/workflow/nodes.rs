//! The five workflow steps

use crate::collaborators::Classifier;
use crate::decode::parse_topic;
use crate::domain::Topic;
use crate::error::{Error, Result};
use crate::evaluator::CompletenessEvaluator;
use crate::graph::{Branch, Node};
use crate::registry::ResponderRegistry;
use crate::router::Router;
use crate::state::{ExecutionState, HistoryEntry, HistoryKind, StatePatch};
use crate::synthesizer::Synthesizer;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Node ids
pub mod ids {
    /// Topic classification
    pub const CLASSIFY: &str = "classify";
    /// Topic → responder
    pub const ROUTE: &str = "route";
    /// Run the current responder
    pub const RESPOND: &str = "respond";
    /// Completeness check
    pub const EVALUATE: &str = "evaluate";
    /// Final answer
    pub const SYNTHESIZE: &str = "synthesize";
}

/// Branch selector for the evaluate node
pub(crate) fn after_evaluation(state: &ExecutionState) -> Branch {
    if state.needs_rerouting() {
        Branch::Reroute
    } else {
        Branch::Complete
    }
}

pub(crate) struct ClassifyNode {
    pub(crate) classifier: Arc<dyn Classifier>,
    /// Topic recorded when the classifier output names none
    pub(crate) fallback: Topic,
}

#[async_trait]
impl Node for ClassifyNode {
    async fn run(&self, state: &ExecutionState) -> Result<StatePatch> {
        let raw = self.classifier.classify(state.query()).await?;
        let (topic, note) = match parse_topic(&raw) {
            Some(topic) => (topic, topic.as_str().to_string()),
            None => {
                info!(
                    request_id = %state.request_id(),
                    fallback = %self.fallback,
                    "Classifier output matched no topic"
                );
                (self.fallback, format!("unrecognized, fell back to {}", self.fallback))
            }
        };
        Ok(StatePatch::new()
            .with_topic(topic)
            .with_history(HistoryEntry::new(HistoryKind::TopicClassified, note)))
    }
}

pub(crate) struct RouteNode {
    pub(crate) router: Router,
}

#[async_trait]
impl Node for RouteNode {
    async fn run(&self, state: &ExecutionState) -> Result<StatePatch> {
        let responder = self.router.route(state.topic());
        let note = match state.topic() {
            Some(topic) => format!("topic {topic}"),
            None => "fallback".to_string(),
        };
        debug!(request_id = %state.request_id(), responder = %responder, "Routed");
        Ok(StatePatch::new()
            .with_current_responder(responder)
            .with_history(HistoryEntry::for_responder(HistoryKind::Routed, responder, note)))
    }
}

pub(crate) struct RespondNode {
    pub(crate) registry: ResponderRegistry,
}

#[async_trait]
impl Node for RespondNode {
    async fn run(&self, state: &ExecutionState) -> Result<StatePatch> {
        let id = state
            .current_responder()
            .ok_or_else(|| Error::Graph("respond reached with no responder selected".to_string()))?;
        let responder = self.registry.get(id).ok_or_else(|| Error::Responder {
            responder: id,
            message: "not registered".to_string(),
        })?;

        let answer = responder.handle(state.query()).await.map_err(|e| match e {
            e @ Error::Responder { .. } => e,
            other => Error::Responder {
                responder: id,
                message: other.to_string(),
            },
        })?;

        info!(
            request_id = %state.request_id(),
            responder = %id,
            consultations = state.total_consultations() + 1,
            "Responder answered"
        );
        Ok(StatePatch::new()
            .with_response(id, answer)
            .with_history(HistoryEntry::for_responder(
                HistoryKind::ResponderExecuted,
                id,
                "answered",
            )))
    }
}

pub(crate) struct EvaluateNode {
    pub(crate) evaluator: CompletenessEvaluator,
}

#[async_trait]
impl Node for EvaluateNode {
    async fn run(&self, state: &ExecutionState) -> Result<StatePatch> {
        self.evaluator.evaluate(state).await
    }
}

pub(crate) struct SynthesizeNode {
    pub(crate) synthesizer: Synthesizer,
}

#[async_trait]
impl Node for SynthesizeNode {
    async fn run(&self, state: &ExecutionState) -> Result<StatePatch> {
        self.synthesizer.synthesize(state).await
    }
}
