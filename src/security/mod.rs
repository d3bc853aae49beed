//! Security subsystem: trusted client-IP resolution.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → middleware.rs (axum layer, reads headers + ConnectInfo)
//!     → client_ip.rs (ordered header rules, candidate filtering)
//!     → ip_range.rs (private / reserved range tables)
//!     → ClientIp request extension
//! ```
//!
//! # Design Decisions
//! - Rule order and range tables are compile-time constants
//! - Unparseable candidates are skipped, never fatal
//! - No trust in client input: the last resort is the peer address

pub mod client_ip;
pub mod ip_range;
pub mod middleware;

pub use client_ip::{
    ClientIp, ClientIpResolver, HeaderRule, HttpRequestSource, RequestSource, StaticRequest,
    ValueFormat, HEADER_RULES, REMOTE_ADDR,
};
pub use ip_range::{is_private, IpRange};
pub use middleware::client_ip_middleware;
