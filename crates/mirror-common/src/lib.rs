//! # mirror-common
//!
//! Shared utilities: configuration and telemetry.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{ApiConfig, ConfigError, GatewayConfig, MirrorConfig};
pub use telemetry::{init_tracing, init_tracing_with_config, try_init_tracing, TracingConfig};
