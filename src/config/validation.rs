//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the service origin and credentials are usable
//! - Validate IP-shaped values and timeout ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>

use std::net::IpAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::GateConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service.base_url is empty")]
    MissingBaseUrl,

    #[error("service.base_url '{url}' is invalid: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("service.base_url scheme '{0}' is not http or https")]
    UnsupportedScheme(String),

    #[error("service.application_id is not set")]
    MissingApplicationId,

    #[error("service.application_key is empty")]
    EmptyApplicationKey,

    #[error("service.api_key is empty")]
    EmptyApiKey,

    #[error("service.remote_ip '{0}' is not an IP address")]
    InvalidRemoteIp(String),

    #[error("resolver.ignore entry '{0}' is not an IP address")]
    InvalidIgnoreEntry(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let service = &config.service;

    if service.base_url.trim().is_empty() {
        errors.push(ValidationError::MissingBaseUrl);
    } else {
        match Url::parse(&service.base_url) {
            Ok(url) if url.scheme() != "https" && url.scheme() != "http" => {
                errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
            }
            Ok(_) => {}
            Err(e) => errors.push(ValidationError::InvalidBaseUrl {
                url: service.base_url.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if service.application_id.is_none() {
        errors.push(ValidationError::MissingApplicationId);
    }
    if service.application_key.is_empty() {
        errors.push(ValidationError::EmptyApplicationKey);
    }
    if service.api_key.is_empty() {
        errors.push(ValidationError::EmptyApiKey);
    }

    if let Some(ip) = service.remote_ip.as_deref() {
        if ip.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::InvalidRemoteIp(ip.to_string()));
        }
    }

    for entry in &config.resolver.ignore {
        if entry.parse::<IpAddr>().is_err() {
            errors.push(ValidationError::InvalidIgnoreEntry(entry.clone()));
        }
    }

    if config.timeouts.connect_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
