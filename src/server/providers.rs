//! LLM provider resolution

use super::config::LlmConfig;
use anyhow::{bail, Context, Result};
use quorum_llm::{AzureSettings, LlmProvider, MockProvider, OpenAiConfig, OpenAiProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Build the configured provider. Keys come from the environment only.
pub fn resolve_llm_provider(llm: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let timeout = Duration::from_secs(llm.timeout_secs);

    let provider: Arc<dyn LlmProvider> = match llm.provider.as_str() {
        "openai" => {
            let mut config = OpenAiConfig::from_env()
                .context("OpenAI provider selected")?
                .with_timeout(timeout);
            if let Some(base_url) = &llm.base_url {
                config = config.with_base_url(base_url);
            }
            if let Some(model) = &llm.model {
                config = config.with_model(model);
            }
            info!(model = %config.default_model, "Using OpenAI provider");
            Arc::new(OpenAiProvider::new(config))
        }
        "azure" => {
            let api_key = std::env::var("AZURE_OPENAI_API_KEY")
                .context("Azure provider selected but AZURE_OPENAI_API_KEY is not set")?;
            let endpoint = env_or("AZURE_OPENAI_ENDPOINT", &llm.azure.endpoint)
                .context("Azure endpoint missing: set AZURE_OPENAI_ENDPOINT or [llm.azure] endpoint")?;
            let deployment = env_or("AZURE_OPENAI_DEPLOYMENT_ID", &llm.azure.deployment)
                .context(
                    "Azure deployment missing: set AZURE_OPENAI_DEPLOYMENT_ID or [llm.azure] deployment",
                )?;
            let settings = AzureSettings {
                endpoint,
                deployment,
                api_version: llm.azure.api_version.clone(),
            };
            info!(deployment = %settings.deployment, "Using Azure OpenAI provider");
            let config = OpenAiConfig::new(api_key)
                .with_azure(settings)
                .with_timeout(timeout);
            Arc::new(OpenAiProvider::new(config))
        }
        "mock" => {
            warn!("Using mock LLM provider; answers are placeholders");
            Arc::new(MockProvider::new())
        }
        other => bail!("unknown LLM provider '{other}' (expected openai, azure or mock)"),
    };

    Ok(provider)
}

fn env_or(name: &str, configured: &Option<String>) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| configured.clone())
}
