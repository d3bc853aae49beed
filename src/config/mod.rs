//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (OTP_* environment overrides, secrets)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → passed explicitly to OtpClient / ClientIpResolver
//! ```
//!
//! # Design Decisions
//! - No process-wide configuration; callers own the struct
//! - All fields have defaults to allow minimal configs
//! - A non-integer application ID is fatal at load time

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{
    apply_env_overrides, config_from_env, load_config, load_config_with, ConfigError,
};
pub use schema::{GateConfig, ObservabilityConfig, ResolverConfig, ServiceConfig, TimeoutConfig};
pub use validation::{validate_config, ValidationError};
