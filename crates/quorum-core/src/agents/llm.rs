use super::prompts::{
    judge_message, responder_prompt, synthesis_message, CLASSIFIER_PROMPT, JUDGE_PROMPT,
    SYNTHESIS_PROMPT,
};
use super::LlmSettings;
use crate::collaborators::{
    Classifier, Judge, JudgeRequest, Responder, SynthesisBackend, SynthesisRequest,
};
use crate::domain::ResponderId;
use crate::error::{Error, Result};
use async_trait::async_trait;
use quorum_llm::{CompletionRequest, LlmProvider};
use std::sync::Arc;
use tracing::debug;

/// Send one system + user exchange and return the reply text
async fn ask(
    provider: &dyn LlmProvider,
    settings: &LlmSettings,
    system: &str,
    user: String,
) -> quorum_llm::Result<String> {
    let request = CompletionRequest::prompt(system, user)
        .model(settings.model.clone())
        .sampling(settings.temperature, settings.max_tokens);

    let response = provider.complete(request).await?;
    debug!(
        provider = provider.name(),
        model = %response.model,
        tokens = response.usage.as_ref().map(|u| u.total_tokens),
        "Completion received"
    );
    Ok(response.content)
}

/// Topic classifier
pub struct LlmClassifier {
    provider: Arc<dyn LlmProvider>,
    settings: LlmSettings,
}

impl LlmClassifier {
    /// Classifier using `provider`
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, settings: LlmSettings) -> Self {
        Self { provider, settings }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, query: &str) -> Result<String> {
        ask(
            self.provider.as_ref(),
            &self.settings,
            CLASSIFIER_PROMPT,
            query.to_string(),
        )
        .await
        .map_err(|e| Error::Classification(e.to_string()))
    }
}

/// Domain responder answering from the model's own knowledge
pub struct LlmResponder {
    id: ResponderId,
    provider: Arc<dyn LlmProvider>,
    settings: LlmSettings,
}

impl LlmResponder {
    /// Responder `id` using `provider`
    #[must_use]
    pub fn new(id: ResponderId, provider: Arc<dyn LlmProvider>, settings: LlmSettings) -> Self {
        Self {
            id,
            provider,
            settings,
        }
    }
}

#[async_trait]
impl Responder for LlmResponder {
    async fn handle(&self, query: &str) -> Result<String> {
        let answer = ask(
            self.provider.as_ref(),
            &self.settings,
            responder_prompt(self.id),
            query.to_string(),
        )
        .await
        .map_err(|e| Error::Responder {
            responder: self.id,
            message: e.to_string(),
        })?;

        if answer.trim().is_empty() {
            return Err(Error::Responder {
                responder: self.id,
                message: "empty answer".to_string(),
            });
        }
        Ok(answer)
    }
}

/// Completeness judge
pub struct LlmJudge {
    provider: Arc<dyn LlmProvider>,
    settings: LlmSettings,
}

impl LlmJudge {
    /// Judge using `provider`
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, settings: LlmSettings) -> Self {
        Self { provider, settings }
    }
}

#[async_trait]
impl Judge for LlmJudge {
    async fn evaluate(&self, request: JudgeRequest) -> Result<String> {
        let message = judge_message(
            &request.query,
            request.current_responder,
            &request.current_answer,
            &request.consulted,
        );
        ask(self.provider.as_ref(), &self.settings, JUDGE_PROMPT, message)
            .await
            .map_err(|e| Error::Evaluation(e.to_string()))
    }
}

/// Synthesis collaborator
pub struct LlmSynthesis {
    provider: Arc<dyn LlmProvider>,
    settings: LlmSettings,
}

impl LlmSynthesis {
    /// Synthesis using `provider`
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, settings: LlmSettings) -> Self {
        Self { provider, settings }
    }
}

#[async_trait]
impl SynthesisBackend for LlmSynthesis {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<String> {
        let message = synthesis_message(&request.query, &request.answers);
        ask(self.provider.as_ref(), &self.settings, SYNTHESIS_PROMPT, message)
            .await
            .map_err(|e| Error::Synthesis(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_llm::{MockProvider, Role};

    #[tokio::test]
    async fn test_classifier_sends_system_and_query() {
        let provider = MockProvider::with_replies(["sports"]);
        let classifier = LlmClassifier::new(Arc::new(provider.clone()), LlmSettings::default());

        assert_eq!(classifier.classify("Who won?").await.unwrap(), "sports");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert_eq!(requests[0].messages[1].content, "Who won?");
        assert_eq!(requests[0].temperature, Some(0.2));
    }

    #[tokio::test]
    async fn test_provider_errors_keep_category() {
        let provider = MockProvider::new();
        provider.push_error("503");
        provider.push_error("503");
        let provider: Arc<dyn LlmProvider> = Arc::new(provider);

        let err = LlmResponder::new(ResponderId::Stocks, provider.clone(), LlmSettings::default())
            .handle("AAPL?")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Responder {
                responder: ResponderId::Stocks,
                ..
            }
        ));

        let err = LlmJudge::new(provider, LlmSettings::default())
            .evaluate(JudgeRequest {
                query: "q".to_string(),
                current_responder: ResponderId::Stocks,
                current_answer: "a".to_string(),
                consulted: vec![ResponderId::Stocks],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Evaluation(_)));
    }

    #[tokio::test]
    async fn test_responder_rejects_blank_answer() {
        let provider = MockProvider::with_replies(["  "]);
        let err = LlmResponder::new(ResponderId::News, Arc::new(provider), LlmSettings::default())
            .handle("q")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty answer"));
    }

    #[tokio::test]
    async fn test_health_responder_uses_disclaimer_prompt() {
        let provider = MockProvider::with_replies(["Drink water."]);
        LlmResponder::new(ResponderId::Health, Arc::new(provider.clone()), LlmSettings::default())
            .handle("headache?")
            .await
            .unwrap();

        let system = &provider.requests()[0].messages[0].content;
        assert!(system.contains("not medical advice"));
    }
}
