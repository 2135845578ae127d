//! Quorum Core - Query Workflow Engine
//!
//! This crate provides the orchestration core for the Quorum question router:
//! - State: per-request execution state merged from partial patches
//! - Graph: validated workflow graphs and the sequential engine that runs them
//! - Decode: defensive parsing of classifier and judge text
//! - Evaluator: the completeness check with its consultation caps
//! - Synthesizer: merging one or more responder answers
//! - Workflow: the assembled classify → route → respond → evaluate → synthesize run
//! - Agents: LLM-backed collaborators
//! - Event bus: side-channel notifications about runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agents;
pub mod collaborators;
pub mod config;
pub mod decode;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod event_bus;
pub mod graph;
pub mod registry;
pub mod router;
pub mod state;
pub mod synthesizer;
pub mod workflow;

pub use agents::{
    llm_registry, llm_workflow, LlmClassifier, LlmJudge, LlmResponder, LlmSettings, LlmSynthesis,
};
pub use collaborators::{
    Classifier, Judge, JudgeRequest, Responder, SynthesisBackend, SynthesisRequest,
};
pub use config::WorkflowConfig;
pub use domain::{ResponderId, Topic};
pub use error::{Error, Result, UserFriendlyError, FALLBACK_RESPONSE};
pub use evaluator::CompletenessEvaluator;
pub use event_bus::{EventBus, WorkflowEvent};
pub use graph::{GraphBuilder, GraphDefinition, GraphEngine};
pub use registry::ResponderRegistry;
pub use router::Router;
pub use state::{ExecutionState, HistoryEntry, HistoryKind, StatePatch};
pub use synthesizer::Synthesizer;
pub use workflow::{QueryOutcome, QueryWorkflow, QueryWorkflowBuilder};
