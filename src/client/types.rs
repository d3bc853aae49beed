//! Wire types for the OTP service and client error definitions.
//!
//! Request structs serialize in declaration order; that order is the
//! canonical JSON the service recomputes signatures over, so fields must not
//! be reordered.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::signing::ClockError;
pub use crate::signing::Rejection;

/// Authentication state reported by the service.
///
/// The wire form is also the text that takes part in response signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthState {
    /// User authenticated.
    Valid,
    /// Not authenticated, or the response could not be trusted.
    Invalid,
    /// Waiting on the user to approve or enter a code.
    Pending,
    /// User explicitly rejected the request.
    Denied,
    /// Request timed out on the service side.
    Expired,
    /// No such user in the directory.
    NotRegistered,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Valid => "VALID",
            AuthState::Invalid => "INVALID",
            AuthState::Pending => "PENDING",
            AuthState::Denied => "DENIED",
            AuthState::Expired => "EXPIRED",
            AuthState::NotRegistered => "NOT_REGISTERED",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ask the service for the current authentication state of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthorisationStateRequest {
    /// Directory (tenant); the client default is used when `None`.
    pub directory_name: Option<String>,
    pub user_name: String,
    /// Text shown to the user alongside the approval prompt.
    pub description: Option<String>,
    /// Overrides the configured remote IP for this call. Not part of the body.
    #[serde(skip)]
    pub remote_ip: Option<String>,
}

impl AuthorisationStateRequest {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            ..Default::default()
        }
    }
}

/// Enrol a user with the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterUserRequest {
    pub directory_name: Option<String>,
    pub user_name: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl RegisterUserRequest {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            ..Default::default()
        }
    }
}

/// Check a one-time password entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VerifyOtpRequest {
    pub directory_name: Option<String>,
    pub user_name: String,
    #[serde(rename = "OTP")]
    pub otp: String,
    #[serde(skip)]
    pub remote_ip: Option<String>,
}

impl VerifyOtpRequest {
    pub fn new(user_name: impl Into<String>, otp: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            otp: otp.into(),
            ..Default::default()
        }
    }
}

/// Signed envelope returned by the state and verify endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateResponse {
    pub state: AuthState,
    pub signed_response: String,
    pub random_token: String,
    pub signed_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Unsigned reply from the register endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterUserResponse {
    pub state: AuthState,
    /// Shared TOTP secret for authenticator enrolment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
    /// `otpauth://` URI, typically rendered as a QR code by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of a verified call.
///
/// `Unverified` covers every transport, decoding and signature failure; its
/// state is always [`AuthState::Invalid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Verified(StateResponse),
    Unverified(Rejection),
}

impl AuthOutcome {
    /// State the caller should act on.
    pub fn state(&self) -> AuthState {
        match self {
            AuthOutcome::Verified(response) => response.state,
            AuthOutcome::Unverified(_) => AuthState::Invalid,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, AuthOutcome::Verified(_))
    }

    /// True only for a verified `VALID` response.
    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Valid
    }

    pub fn verified(&self) -> Option<&StateResponse> {
        match self {
            AuthOutcome::Verified(response) => Some(response),
            AuthOutcome::Unverified(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            AuthOutcome::Verified(_) => None,
            AuthOutcome::Unverified(rejection) => Some(rejection),
        }
    }
}

/// Errors surfaced to callers.
///
/// Verified operations only return `MissingField` and `Json`; everything
/// else about the service collapses into [`AuthOutcome::Unverified`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// A mandatory request field was empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Request body could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Connection failure or unreadable response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service answered with a non-success status.
    #[error("service returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Client could not be built from configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Request could not be signed because the local clock is unusable.
    #[error("clock error: {0}")]
    Clock(#[from] ClockError),

    /// Blocking adapter could not start its runtime.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_form_matches_display() {
        for state in [
            AuthState::Valid,
            AuthState::Invalid,
            AuthState::Pending,
            AuthState::Denied,
            AuthState::Expired,
            AuthState::NotRegistered,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state));
        }
    }

    #[test]
    fn test_request_field_order_is_canonical() {
        let req = AuthorisationStateRequest {
            directory_name: Some("staff".into()),
            user_name: "alice".into(),
            description: None,
            remote_ip: Some("203.0.113.7".into()),
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"DirectoryName":"staff","UserName":"alice","Description":null}"#
        );
    }

    #[test]
    fn test_verify_request_uses_otp_key() {
        let req = VerifyOtpRequest::new("bob", "123456");
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"DirectoryName":null,"UserName":"bob","OTP":"123456"}"#
        );
    }

    #[test]
    fn test_state_response_decodes() {
        let body = r#"{"State":"PENDING","SignedResponse":"c2ln","RandomToken":"n","SignedTime":5}"#;
        let resp: StateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.state, AuthState::Pending);
        assert_eq!(resp.signed_time, 5);
        assert!(resp.message.is_none());
    }

    #[test]
    fn test_unknown_state_fails_to_decode() {
        let body = r#"{"State":"MAYBE","SignedResponse":"c2ln","RandomToken":"n","SignedTime":5}"#;
        assert!(serde_json::from_str::<StateResponse>(body).is_err());
    }

    #[test]
    fn test_unverified_outcome_is_invalid() {
        let outcome = AuthOutcome::Unverified(Rejection::SignatureMismatch);
        assert_eq!(outcome.state(), AuthState::Invalid);
        assert!(!outcome.is_verified());
        assert!(!outcome.is_authenticated());
        assert_eq!(outcome.rejection(), Some(&Rejection::SignatureMismatch));
    }

    #[test]
    fn test_verified_outcome_carries_service_state() {
        let outcome = AuthOutcome::Verified(StateResponse {
            state: AuthState::Denied,
            signed_response: String::new(),
            random_token: String::new(),
            signed_time: 0,
            message: None,
        });
        assert_eq!(outcome.state(), AuthState::Denied);
        assert!(outcome.is_verified());
        assert!(!outcome.is_authenticated());
    }
}
