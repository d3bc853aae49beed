//! Metrics collection.
//!
//! # Metrics
//! - `otp_client_requests_total` (counter): calls by operation, outcome
//! - `otp_client_rejections_total` (counter): untrusted responses by reason
//! - `client_ip_resolutions_total` (counter): resolved addresses by source rule
//!
//! # Design Decisions
//! - Facade only; the embedding application installs the recorder
//! - Labels are static strings, never user input

use metrics::counter;

/// Record the outcome of one outbound call.
pub fn record_call(operation: &'static str, outcome: &'static str) {
    counter!("otp_client_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

/// Record why a response was not trusted.
pub fn record_rejection(reason: &'static str) {
    counter!("otp_client_rejections_total", "reason" => reason).increment(1);
}

/// Record which rule produced a client IP.
pub fn record_ip_resolution(source: &'static str) {
    counter!("client_ip_resolutions_total", "source" => source).increment(1);
}
