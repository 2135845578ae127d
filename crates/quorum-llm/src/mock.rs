//! Mock LLM Provider for testing
//!
//! Replies are served from a queue in call order; once the queue is empty
//! the provider answers with a fixed default text.

use crate::chat::{CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Successful completion with this content
    Text(String),
    /// Provider failure with this message
    Error(String),
}

/// A mock LLM provider that returns queued replies or a default one.
#[derive(Clone)]
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    default_reply: String,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            default_reply: "mock response".to_string(),
        }
    }

    /// Create a provider pre-loaded with text replies.
    #[must_use]
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        for reply in replies {
            provider.push_text(reply);
        }
        provider
    }

    /// Set the reply used once the queue runs dry.
    #[must_use]
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Queue a text reply.
    pub fn push_text(&self, reply: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(MockReply::Text(reply.into()));
    }

    /// Queue a failure.
    pub fn push_error(&self, message: impl Into<String>) {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(MockReply::Error(message.into()));
    }

    /// Requests received so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of completions requested so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn default_model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        let content = match next {
            Some(MockReply::Error(message)) => return Err(Error::Api(message)),
            Some(MockReply::Text(content)) => content,
            None => self.default_reply.clone(),
        };
        Ok(CompletionResponse {
            content,
            model: "mock-model".to_string(),
            usage: None,
            finish_reason: Some("stop".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_default() {
        let provider = MockProvider::with_replies(["first", "second"]).with_default_reply("done");

        let req = || CompletionRequest::user_only("hi");
        assert_eq!(provider.complete(req()).await.unwrap().content, "first");
        assert_eq!(provider.complete(req()).await.unwrap().content, "second");
        assert_eq!(provider.complete(req()).await.unwrap().content, "done");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_queued_error() {
        let provider = MockProvider::new();
        provider.push_error("boom");

        let err = provider
            .complete(CompletionRequest::user_only("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Api(ref m) if m == "boom"));
    }

    #[tokio::test]
    async fn test_records_requests() {
        let provider = MockProvider::new();
        provider
            .complete(CompletionRequest::prompt("be brief", "weather?"))
            .await
            .unwrap();

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[1].content, "weather?");
    }
}
