//! Server configuration types

use quorum_core::{LlmSettings, WorkflowConfig};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow cross-origin requests from any origin
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors: true,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

/// LLM configuration
///
/// API keys are never read from here, only from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// `openai`, `azure` or `mock`
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model override; the provider default when unset
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// OpenAI-compatible endpoint override
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub azure: AzureConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
            base_url: None,
            azure: AzureConfig::default(),
        }
    }
}

impl LlmConfig {
    /// Model parameters handed to the collaborators
    pub fn settings(&self) -> LlmSettings {
        let defaults = LlmSettings::default();
        LlmSettings {
            model: self.model.clone(),
            temperature: self.temperature.or(defaults.temperature),
            max_tokens: self.max_tokens.or(defaults.max_tokens),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Azure OpenAI deployment
///
/// `AZURE_OPENAI_ENDPOINT` and `AZURE_OPENAI_DEPLOYMENT_ID` take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub deployment: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            deployment: None,
            api_version: default_api_version(),
        }
    }
}

fn default_api_version() -> String {
    quorum_llm::openai::DEFAULT_AZURE_API_VERSION.to_string()
}
