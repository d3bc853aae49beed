//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, `otp_call` spans)
//!     → metrics.rs (counters through the `metrics` facade)
//!
//! Consumers:
//!     → Log aggregation (stdout, JSON lines)
//!     → Whatever metrics recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON optional) for machine parsing
//! - Every outbound call carries a request ID in its span
//! - Keys and request secrets never reach a log line

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
