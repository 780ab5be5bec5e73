//! Hub configuration with validation.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default listening port for validator connections.
pub const DEFAULT_PORT: u16 = 8081;

/// Default reward per check, in lamports.
pub const DEFAULT_REWARD_PER_CHECK: u64 = 100;

/// Latency recorded for a synthesized timeout.
pub const DEFAULT_TIMEOUT_PENALTY_LATENCY_MS: u64 = 1000;

/// Which completed checks earn the per-check reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayoutPolicy {
    /// Only signed replies, received on time on the dispatch connection.
    #[default]
    VerifiedOnly,
    /// Every dispatched check, including synthesized timeouts.
    PayForAttempt,
}

impl PayoutPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutPolicy::VerifiedOnly => "verified-only",
            PayoutPolicy::PayForAttempt => "pay-for-attempt",
        }
    }
}

impl fmt::Display for PayoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayoutPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verified-only" | "verified" => Ok(PayoutPolicy::VerifiedOnly),
            "pay-for-attempt" | "attempt" => Ok(PayoutPolicy::PayForAttempt),
            other => Err(ConfigError::UnknownPayoutPolicy(other.to_string())),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Unknown payout policy: {0}")]
    UnknownPayoutPolicy(String),
}

/// Hub configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port validators connect to (default: 8081)
    pub port: u16,
    /// Period between validation rounds (default: 60s)
    pub round_interval: Duration,
    /// Deadline for each validate request (default: 10s)
    pub request_timeout: Duration,
    /// Payout credited per rewarded check
    pub reward_per_check: u64,
    /// Latency recorded on a synthesized timeout tick
    pub timeout_penalty_latency_ms: u64,
    pub payout_policy: PayoutPolicy,
    /// Largest accepted WebSocket frame in bytes
    pub max_message_size: usize,
    /// Outbound message buffer per connection
    pub outbound_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_PORT,
            round_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            reward_per_check: DEFAULT_REWARD_PER_CHECK,
            timeout_penalty_latency_ms: DEFAULT_TIMEOUT_PENALTY_LATENCY_MS,
            payout_policy: PayoutPolicy::default(),
            max_message_size: 64 * 1024,
            outbound_buffer: 1024,
        }
    }
}

impl HubConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.round_interval.is_zero() {
            return Err(ConfigError::InvalidInterval(
                "round_interval cannot be 0".into(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout cannot be 0".into(),
            ));
        }

        if self.request_timeout >= self.round_interval {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout must be shorter than round_interval".into(),
            ));
        }

        if self.max_message_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_message_size cannot be 0".into(),
            ));
        }

        if self.outbound_buffer == 0 {
            return Err(ConfigError::InvalidLimit(
                "outbound_buffer cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Listener bind address
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
