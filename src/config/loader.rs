//! Configuration loading from disk and environment.
//!
//! Secrets are expected in the environment; a config file may carry them for
//! local development.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::client::credentials::Secret;
use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const BASE_URL_ENV_VAR: &str = "OTP_BASE_URL";
pub const DIRECTORY_ENV_VAR: &str = "OTP_DIRECTORY";
pub const APPLICATION_ID_ENV_VAR: &str = "OTP_APPLICATION_ID";
pub const APPLICATION_KEY_ENV_VAR: &str = "OTP_APPLICATION_KEY";
pub const API_KEY_ENV_VAR: &str = "OTP_API_KEY";
pub const REMOTE_IP_ENV_VAR: &str = "OTP_REMOTE_IP";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Application ID '{0}' is not an integer")]
    InvalidApplicationId(String),

    #[error("Application ID is not configured")]
    MissingApplicationId,

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

/// Load and validate configuration from a TOML file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// [`load_config`] with variables resolved through `lookup`.
pub fn load_config_with<F>(path: &Path, lookup: F) -> Result<GateConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let content = fs::read_to_string(path)?;
    let mut config: GateConfig = toml::from_str(&content)?;

    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(path = %path.display(), "Configuration loaded");
    Ok(config)
}

/// Build configuration from defaults and the environment only.
pub fn config_from_env() -> Result<GateConfig, ConfigError> {
    let mut config = GateConfig::default();
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay `OTP_*` variables onto `config`; `lookup` resolves a variable name.
pub fn apply_env_overrides<F>(config: &mut GateConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let service = &mut config.service;

    if let Some(url) = lookup(BASE_URL_ENV_VAR) {
        service.base_url = url;
    }
    if let Some(dir) = lookup(DIRECTORY_ENV_VAR) {
        service.directory_name = Some(dir).filter(|d| !d.is_empty());
    }
    if let Some(raw) = lookup(APPLICATION_ID_ENV_VAR) {
        let id = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigError::InvalidApplicationId(raw.clone()))?;
        service.application_id = Some(id);
    }
    if let Some(key) = lookup(APPLICATION_KEY_ENV_VAR) {
        service.application_key = Secret::from(key);
    }
    if let Some(key) = lookup(API_KEY_ENV_VAR) {
        service.api_key = Secret::from(key);
    }
    if let Some(ip) = lookup(REMOTE_IP_ENV_VAR) {
        service.remote_ip = Some(ip).filter(|ip| !ip.is_empty());
    }

    Ok(())
}
