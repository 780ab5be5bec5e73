//! Agent configuration with validation.

use std::time::Duration;
use thiserror::Error;

/// Latency reported when a probe fails outright.
pub const DEFAULT_PROBE_FAILURE_LATENCY_MS: u64 = 1000;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid hub URL: {0}")]
    InvalidHubUrl(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),
}

/// Validator agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Hub WebSocket endpoint (default: ws://localhost:8081)
    pub hub_url: String,
    /// IP reported in the signup request
    pub advertised_ip: String,
    /// Delay before reconnecting after a lost session (default: 5s)
    pub reconnect_backoff: Duration,
    /// How long to wait for the signup acknowledgement
    pub signup_timeout: Duration,
    /// Per-request HTTP timeout; kept under the hub's reply deadline
    pub probe_timeout: Duration,
    pub probe_failure_latency_ms: u64,
    /// Period of the liveness log line
    pub heartbeat_interval: Duration,
    /// Queued replies waiting to be written to the socket
    pub outbound_buffer: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hub_url: "ws://localhost:8081".to_string(),
            advertised_ip: "127.0.0.1".to_string(),
            reconnect_backoff: Duration::from_secs(5),
            signup_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(8),
            probe_failure_latency_ms: DEFAULT_PROBE_FAILURE_LATENCY_MS,
            heartbeat_interval: Duration::from_secs(10),
            outbound_buffer: 256,
        }
    }
}

impl AgentConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.hub_url.starts_with("ws://") || self.hub_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidHubUrl(format!(
                "{} (expected ws:// or wss://)",
                self.hub_url
            )));
        }

        if self.signup_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "signup_timeout cannot be 0".into(),
            ));
        }

        if self.probe_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "probe_timeout cannot be 0".into(),
            ));
        }

        if self.heartbeat_interval.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "heartbeat_interval cannot be 0".into(),
            ));
        }

        if self.outbound_buffer == 0 {
            return Err(ConfigError::InvalidLimit(
                "outbound_buffer cannot be 0".into(),
            ));
        }

        Ok(())
    }
}
