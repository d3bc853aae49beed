//! Inbound response verification.
//!
//! A signed envelope is trusted only when both checks pass:
//! 1. `signed_time >= now - FRESHNESS_WINDOW_SECS` (no ceiling on future times)
//! 2. `signed_response == base64(HMAC-SHA256(application_key,
//!    "{identity}:{state}:{random_token}:{signed_time}"))`

use thiserror::Error;

use crate::signing::epoch::ClockError;
use crate::signing::mac::{hmac_sha256_base64, signatures_match};

/// Replay window for signed responses, in seconds.
pub const FRESHNESS_WINDOW_SECS: i64 = 300;

/// Why a response was not trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Connection failure or unreadable body.
    #[error("transport failure: {0}")]
    Transport(String),

    /// Service answered with a non-success status.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Body could not be decoded into a signed envelope.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Signed outside the replay window.
    #[error("stale response: signed at {signed_time}, now {now}")]
    Stale { signed_time: i64, now: i64 },

    /// Recomputed signature differs from the one received.
    #[error("response signature mismatch")]
    SignatureMismatch,

    /// Local clock unusable, so freshness cannot be judged.
    #[error("{0}")]
    Clock(#[from] ClockError),
}

impl Rejection {
    /// Short label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::Transport(_) => "transport",
            Rejection::Status(_) => "status",
            Rejection::Malformed(_) => "malformed",
            Rejection::Stale { .. } => "stale",
            Rejection::SignatureMismatch => "signature_mismatch",
            Rejection::Clock(_) => "clock",
        }
    }
}

/// The signed portion of a response envelope.
#[derive(Debug, Clone, Copy)]
pub struct SignedFields<'a> {
    /// User name the call was about.
    pub identity: &'a str,
    /// Textual state, exactly as it appears on the wire.
    pub state: &'a str,
    pub random_token: &'a str,
    pub signed_time: i64,
    pub signed_response: &'a str,
}

/// Signature the service is expected to produce for these fields.
pub fn response_signature(
    application_key: &[u8],
    identity: &str,
    state: &str,
    random_token: &str,
    signed_time: i64,
) -> String {
    let message = format!("{}:{}:{}:{}", identity, state, random_token, signed_time);
    hmac_sha256_base64(application_key, &message)
}

/// Check freshness, then signature.
pub fn verify_envelope(
    fields: &SignedFields<'_>,
    application_key: &[u8],
    now: i64,
) -> Result<(), Rejection> {
    if fields.signed_time < now.saturating_sub(FRESHNESS_WINDOW_SECS) {
        return Err(Rejection::Stale {
            signed_time: fields.signed_time,
            now,
        });
    }

    let expected = response_signature(
        application_key,
        fields.identity,
        fields.state,
        fields.random_token,
        fields.signed_time,
    );

    if signatures_match(&expected, fields.signed_response) {
        Ok(())
    } else {
        Err(Rejection::SignatureMismatch)
    }
}
