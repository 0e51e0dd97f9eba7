//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::MockConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that override file values.
pub const ENV_API_KEY: &str = "WABIZ_API_KEY";
pub const ENV_ADMIN_KEY: &str = "WABIZ_ADMIN_KEY";
pub const ENV_WEBHOOK_URL: &str = "WABIZ_WEBHOOK_URL";
pub const ENV_OTLP_ENDPOINT: &str = "WABIZ_OTLP_ENDPOINT";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<MockConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => MockConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply overrides looked up through `lookup`.
///
/// An empty `WABIZ_WEBHOOK_URL` clears the configured URL.
pub fn apply_overrides<F>(config: &mut MockConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(ENV_API_KEY) {
        config.auth.api_key = key;
    }
    if let Some(key) = lookup(ENV_ADMIN_KEY) {
        config.auth.admin_key = key;
    }
    if let Some(url) = lookup(ENV_WEBHOOK_URL) {
        config.webhook.url = (!url.is_empty()).then_some(url);
    }
    if let Some(endpoint) = lookup(ENV_OTLP_ENDPOINT) {
        config.tracing.otlp_endpoint = (!endpoint.is_empty()).then_some(endpoint);
    }
}
