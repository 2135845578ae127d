//! Configuration loading
//!
//! Later sources override earlier ones: embedded `config/default.toml`,
//! `config/$QUORUM_ENV`, `config/local`, then `QUORUM_*` variables.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load and validate [`AppConfig`]
pub fn load_config() -> Result<AppConfig> {
    let env_name = std::env::var("QUORUM_ENV").unwrap_or_else(|_| "development".to_string());

    let config = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name(&format!("config/{env_name}")).required(false))
        .add_source(File::with_name("config/local").required(false))
        // QUORUM_WORKFLOW__MAX_NODE_VISITS=20
        .add_source(
            Environment::with_prefix("QUORUM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("reading configuration sources")?;

    let app: AppConfig = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;
    app.workflow
        .validate()
        .context("Invalid [workflow] configuration")?;
    Ok(app)
}
