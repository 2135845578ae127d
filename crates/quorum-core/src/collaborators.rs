//! Collaborator capabilities
//!
//! The engine only ever talks to these traits. LLM-backed implementations
//! live in [`crate::agents`]; tests substitute scripted ones.

use crate::domain::ResponderId;
use crate::error::Result;
use async_trait::async_trait;

/// Maps raw query text to classifier output (decoded by the caller)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify a query; the reply is free text
    async fn classify(&self, query: &str) -> Result<String>;
}

/// Domain specialist
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Responder: Send + Sync {
    /// Answer a query
    async fn handle(&self, query: &str) -> Result<String>;
}

/// Input to the completeness judge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeRequest {
    /// Original query
    pub query: String,
    /// Responder whose answer is being judged
    pub current_responder: ResponderId,
    /// That responder's answer
    pub current_answer: String,
    /// Distinct responders consulted so far, in order
    pub consulted: Vec<ResponderId>,
}

/// Decides whether another responder should be consulted
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Judge: Send + Sync {
    /// Returns `complete` or a responder id, as free text
    async fn evaluate(&self, request: JudgeRequest) -> Result<String>;
}

/// Input to the synthesis collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    /// Original query
    pub query: String,
    /// Answers ordered by first consultation
    pub answers: Vec<(ResponderId, String)>,
}

/// Merges several answers into one
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Produce the combined answer
    async fn synthesize(&self, request: SynthesisRequest) -> Result<String>;
}
