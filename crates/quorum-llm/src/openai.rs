//! OpenAI - async-openai provider
//!
//! Chat completions against the public OpenAI API, any OpenAI-compatible
//! base URL, or an Azure OpenAI deployment.

use crate::chat::{CompletionRequest, CompletionResponse, Message, Role, TokenUsage};
use crate::error::{Error, Result};
use crate::provider::LlmProvider;
use crate::redact::{mask_api_key, redact_api_error};
use async_openai::{
    config::{AzureConfig, OpenAIConfig},
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
    Client,
};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default model for the public OpenAI endpoint
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Azure API version used when none is configured
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-01";

/// Azure OpenAI deployment settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureSettings {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub endpoint: String,
    /// Deployment id (stands in for the model name)
    pub deployment: String,
    /// API version query parameter
    pub api_version: String,
}

/// Where completions are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// api.openai.com, or a compatible server at `base_url`
    OpenAi {
        /// Custom base URL
        base_url: Option<String>,
    },
    /// An Azure OpenAI deployment
    Azure(AzureSettings),
}

/// Configuration for [`OpenAiProvider`]
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API key
    pub api_key: String,
    /// Target endpoint
    pub endpoint: Endpoint,
    /// Model used when a request names none
    pub default_model: String,
    /// Per-request HTTP timeout, also the retry budget
    pub timeout: Duration,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("endpoint", &self.endpoint)
            .field("default_model", &self.default_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    /// Public OpenAI endpoint with `api_key`
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: Endpoint::OpenAi { base_url: None },
            default_model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Reads `OPENAI_API_KEY`, and `OPENAI_BASE_URL` / `OPENAI_MODEL` when set.
    ///
    /// # Errors
    /// [`Error::NotConfigured`] when `OPENAI_API_KEY` is missing or blank
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::NotConfigured("OPENAI_API_KEY not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config = config.with_model(model);
        }
        Ok(config)
    }

    /// Send to an OpenAI-compatible server at `url`
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Endpoint::OpenAi {
            base_url: Some(url.into()),
        };
        self
    }

    /// Send to an Azure deployment; its id becomes the default model
    #[must_use]
    pub fn with_azure(mut self, settings: AzureSettings) -> Self {
        self.default_model = settings.deployment.clone();
        self.endpoint = Endpoint::Azure(settings);
        self
    }

    /// Override the default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Override the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

enum ChatClient {
    OpenAi(Client<OpenAIConfig>),
    Azure(Client<AzureConfig>),
}

/// Chat completions through async-openai
pub struct OpenAiProvider {
    client: ChatClient,
    default_model: String,
}

impl OpenAiProvider {
    /// Build the HTTP client for `config`
    #[must_use]
    pub fn new(config: OpenAiConfig) -> Self {
        // async-openai's own client never times out
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        // transient-error retries end when the timeout budget is spent
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(config.timeout),
            ..Default::default()
        };

        let client = match &config.endpoint {
            Endpoint::Azure(azure) => ChatClient::Azure(Client::build(
                http_client,
                AzureConfig::new()
                    .with_api_base(&azure.endpoint)
                    .with_api_key(&config.api_key)
                    .with_deployment_id(&azure.deployment)
                    .with_api_version(&azure.api_version),
                backoff,
            )),
            Endpoint::OpenAi { base_url } => {
                let mut openai = OpenAIConfig::new().with_api_key(&config.api_key);
                if let Some(base_url) = base_url {
                    openai = openai.with_api_base(base_url);
                }
                ChatClient::OpenAi(Client::build(http_client, openai, backoff))
            }
        };

        Self {
            client,
            default_model: config.default_model,
        }
    }
}

fn to_wire(message: Message) -> ChatCompletionRequestMessage {
    match message.role {
        Role::System => ChatCompletionRequestSystemMessage {
            content: ChatCompletionRequestSystemMessageContent::Text(message.content),
            name: None,
        }
        .into(),
        Role::User => ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(message.content),
            name: None,
        }
        .into(),
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        match self.client {
            ChatClient::OpenAi(_) => "openai",
            ChatClient::Azure(_) => "azure",
        }
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip_all, fields(provider = self.name()))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let wire = CreateChatCompletionRequest {
            model: request.model.unwrap_or_else(|| self.default_model.clone()),
            messages: request.messages.into_iter().map(to_wire).collect(),
            max_completion_tokens: request.max_tokens,
            temperature: request.temperature,
            ..Default::default()
        };
        debug!(model = %wire.model, turns = wire.messages.len(), "Sending chat completion");

        let response = match &self.client {
            ChatClient::OpenAi(client) => client.chat().create(wire).await,
            ChatClient::Azure(client) => client.chat().create(wire).await,
        }
        .map_err(|e: OpenAIError| Error::Api(redact_api_error(&e.to_string())))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("no choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: response.model,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.map(|r| format!("{r:?}").to_lowercase()),
        })
    }
}
