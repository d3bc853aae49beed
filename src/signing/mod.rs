//! Request-signing and response-verification protocol.
//!
//! # Data Flow
//! ```text
//! outbound call
//!     → epoch.rs (capture epoch seconds)
//!     → request.rs (signing string → HMAC-SHA256(api key) → base64 request secret)
//!     → transport headers
//!
//! inbound envelope
//!     → response.rs (freshness floor, HMAC-SHA256(application key) recompute)
//!     → mac.rs (constant-time comparison)
//!     → Verified | Rejection
//! ```
//!
//! # Security Constraints
//! - Keys are only ever used as MAC keys; they never appear in logs
//! - The signing string layout is a wire contract and must not drift

pub mod epoch;
pub mod mac;
pub mod request;
pub mod response;

pub use epoch::{epoch_now, ClockError};
pub use request::{sign_request, RequestSignature, SigningInput};
pub use response::{verify_envelope, Rejection, FRESHNESS_WINDOW_SECS};
