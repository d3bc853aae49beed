//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML. Key material
//! deserializes into [`Secret`] and is never serialized back out.

use serde::{Deserialize, Serialize};

use crate::client::credentials::Secret;

/// Root configuration for the gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Remote OTP service and credentials.
    pub service: ServiceConfig,

    /// Transport timeouts.
    pub timeouts: TimeoutConfig,

    /// Client-IP resolution options.
    pub resolver: ResolverConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Remote OTP service configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base origin of the service (e.g., "https://otp.example.com").
    pub base_url: String,

    /// Directory used when a request does not name one.
    pub directory_name: Option<String>,

    /// Application ID issued by the service operator.
    pub application_id: Option<i64>,

    /// Application key (signing-string component and response MAC key).
    #[serde(skip_serializing)]
    pub application_key: Secret,

    /// API key (request MAC key).
    #[serde(skip_serializing)]
    pub api_key: Secret,

    /// Default remote IP presented with every signed request.
    pub remote_ip: Option<String>,
}

/// Timeout configuration for outbound calls.
///
/// Unset values leave the transport defaults in place.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: Option<u64>,

    /// Total request timeout in seconds.
    pub request_secs: Option<u64>,
}

/// Client-IP resolver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Skip candidates inside private/reserved ranges.
    pub skip_private: bool,

    /// Addresses never returned (exact string match), e.g. our own proxies.
    pub ignore: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            skip_private: true,
            ignore: Vec::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml() {
        let config: GateConfig = toml::from_str(
            r#"
            [service]
            base_url = "https://otp.example.com"
            application_id = 42
            application_key = "app"
            api_key = "api"
            "#,
        )
        .unwrap();

        assert_eq!(config.service.application_id, Some(42));
        assert_eq!(config.service.application_key.expose(), "app");
        assert!(config.resolver.skip_private);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.timeouts.request_secs.is_none());
    }

    #[test]
    fn test_non_integer_application_id_fails_to_parse() {
        let result: Result<GateConfig, _> = toml::from_str(
            r#"
            [service]
            application_id = "forty-two"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_keys_are_not_serialized() {
        let mut config = GateConfig::default();
        config.service.api_key = Secret::new("top-secret");
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("top-secret"));
        assert!(!rendered.contains("api_key"));
    }
}
