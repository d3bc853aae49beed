//! OTP service integration layer.
//!
//! Two independent pieces:
//! - [`client`]: signs requests to a remote one-time-password service and
//!   verifies that its responses are authentic and fresh; anything that cannot
//!   be verified is reported as [`client::AuthState::Invalid`]
//! - [`security`]: resolves the most trustworthy client IP of an inbound
//!   request from an ordered table of headers, optionally skipping private
//!   and reserved ranges
//!
//! The resolved IP may be handed to the client as the remote IP of a call,
//! where it becomes part of the request signature.

// Core protocol
pub mod client;
pub mod signing;

// Inbound requests
pub mod security;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use client::{AuthOutcome, AuthState, BlockingOtpClient, Credentials, OtpClient};
pub use config::GateConfig;
pub use security::{ClientIp, ClientIpResolver};
