//! Client configuration
//!
//! Loads configuration from environment variables (prefix `MIRROR_`),
//! optionally seeded from a `.env` file. Every field has a default so a
//! bare environment works out of the box.

use config::{Config, Environment};
use serde::Deserialize;
use std::time::Duration;

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

/// Top-level client configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MirrorConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Resource endpoint settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the resource endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Gateway connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Discovery path queried for the gateway URL (`ws` response field)
    #[serde(default = "default_discovery_path")]
    pub discovery_path: String,
    /// Keep-alive ping cadence in seconds
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    /// Bounded wait for handing a keep-alive frame to the writer, in seconds
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
    /// Outbound frame queue capacity
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl GatewayConfig {
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    #[must_use]
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            discovery_path: default_discovery_path(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            send_timeout_secs: default_send_timeout(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

impl MirrorConfig {
    /// Load configuration from the environment
    ///
    /// Reads `.env` if present, then environment variables like
    /// `MIRROR_API__BASE_URL` and `MIRROR_GATEWAY__HEARTBEAT_INTERVAL_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(Environment::with_prefix("MIRROR").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

fn default_base_url() -> String {
    "https://api.revolt.chat".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_discovery_path() -> String {
    "/".to_string()
}

fn default_heartbeat_interval() -> u64 {
    20
}

fn default_send_timeout() -> u64 {
    10
}

fn default_outbound_buffer() -> usize {
    64
}
