//! The provider seam
//!
//! Collaborators hold an `Arc<dyn LlmProvider>` and never see which backend
//! serves them.

use crate::chat::{CompletionRequest, CompletionResponse};
use crate::error::Result;

/// A chat completion backend
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &str;

    /// Model used when a request names none
    fn default_model(&self) -> &str;

    /// Run one completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Cheapest possible round trip, for diagnostics
    async fn probe(&self, model: Option<String>) -> Result<CompletionResponse> {
        let request = CompletionRequest::user_only("Reply with the single word: ok")
            .model(model)
            .sampling(Some(0.0), Some(5));
        self.complete(request).await
    }
}
