//! Signed request client for the remote OTP service.
//!
//! # Data Flow
//! ```text
//! caller request (directory optional)
//!     → otp.rs (default directory, canonical JSON body)
//!     → signing::request (request secret + headers)
//!     → reqwest transport
//!     → signing::response (freshness + signature)
//!     → AuthOutcome::Verified | AuthOutcome::Unverified (state INVALID)
//! ```
//!
//! # Error Contract
//! | Operation | Service failure surfaces as |
//! |---|---|
//! | `request_authorisation_state`, `verify_user_otp` | `AuthOutcome::Unverified` |
//! | `register_user` | `Err(ClientError)` |
//! | `delete_user`, `hello_world` | `false` |

pub mod blocking;
pub mod credentials;
pub mod endpoints;
pub mod otp;
pub mod types;

pub use blocking::BlockingOtpClient;
pub use credentials::{Credentials, Secret};
pub use otp::{ClientSettings, OtpClient};
pub use types::{
    AuthOutcome, AuthState, AuthorisationStateRequest, ClientError, ClientResult, Rejection,
    RegisterUserRequest, RegisterUserResponse, StateResponse, VerifyOtpRequest,
};
