//! LLM-backed collaborators
//!
//! Each collaborator sends one chat completion through a
//! [`quorum_llm::LlmProvider`] and maps provider failures into its own
//! error category.

mod llm;
mod prompts;

pub use llm::{LlmClassifier, LlmJudge, LlmResponder, LlmSynthesis};

use crate::domain::ResponderId;
use crate::registry::ResponderRegistry;
use crate::workflow::QueryWorkflowBuilder;
use quorum_llm::LlmProvider;
use std::sync::Arc;

/// Model parameters shared by the collaborators
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    /// Model name; `None` means the provider default
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Completion token limit
    pub max_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: None,
            temperature: Some(0.2),
            max_tokens: Some(1024),
        }
    }
}

/// One [`LlmResponder`] per responder id
#[must_use]
pub fn llm_registry(provider: Arc<dyn LlmProvider>, settings: &LlmSettings) -> ResponderRegistry {
    ResponderId::ALL
        .into_iter()
        .fold(ResponderRegistry::new(), |registry, id| {
            registry.with(
                id,
                Arc::new(LlmResponder::new(id, provider.clone(), settings.clone())),
            )
        })
}

/// Workflow builder with every collaborator backed by `provider`
#[must_use]
pub fn llm_workflow(provider: Arc<dyn LlmProvider>, settings: &LlmSettings) -> QueryWorkflowBuilder {
    crate::workflow::QueryWorkflow::builder()
        .classifier(Arc::new(LlmClassifier::new(provider.clone(), settings.clone())))
        .responders(llm_registry(provider.clone(), settings))
        .judge(Arc::new(LlmJudge::new(provider.clone(), settings.clone())))
        .synthesis(Arc::new(LlmSynthesis::new(provider, settings.clone())))
}
