//! Application credentials.
//!
//! # Security
//! - Keys are never logged; `Debug` output is redacted
//! - Key material is zeroed on drop

use std::fmt;

use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

use crate::config::schema::ServiceConfig;
use crate::config::ConfigError;

/// A secret string that redacts itself in `Debug` and wipes on drop.
#[derive(Clone, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Secret)
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Credentials issued out-of-band by the service operator.
#[derive(Clone, Debug)]
pub struct Credentials {
    application_id: i64,
    application_key: Secret,
    api_key: Secret,
}

impl Credentials {
    pub fn new(
        application_id: i64,
        application_key: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            application_id,
            application_key: Secret::new(application_key),
            api_key: Secret::new(api_key),
        }
    }

    /// Build from the `[service]` section. The section must already be validated.
    pub fn from_config(service: &ServiceConfig) -> Result<Self, ConfigError> {
        let application_id = service
            .application_id
            .ok_or(ConfigError::MissingApplicationId)?;

        Ok(Self {
            application_id,
            application_key: service.application_key.clone(),
            api_key: service.api_key.clone(),
        })
    }

    pub fn application_id(&self) -> i64 {
        self.application_id
    }

    /// Key embedded in request signing strings and used to check responses.
    pub fn application_key(&self) -> &str {
        self.application_key.expose()
    }

    /// Key for the request HMAC.
    pub fn api_key(&self) -> &str {
        self.api_key.expose()
    }
}
