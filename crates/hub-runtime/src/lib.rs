//! # Hub Runtime Library
//!
//! Environment-driven configuration and logging setup for the `uptime-hub`
//! binary. Exposed as a library so the loading rules can be tested.
//!
//! ## Environment
//!
//! | Variable                  | Meaning                                  |
//! |---------------------------|------------------------------------------|
//! | `UM_HUB_HOST`             | bind address (default `0.0.0.0`)         |
//! | `UM_HUB_PORT`             | listen port (default `8081`)             |
//! | `UM_ROUND_INTERVAL_SECS`  | seconds between rounds (default `60`)    |
//! | `UM_REQUEST_TIMEOUT_MS`   | per-check reply deadline (default `10000`) |
//! | `UM_REWARD_PER_CHECK`     | lamports per rewarded check (default `100`) |
//! | `UM_PAYOUT_POLICY`        | `verified-only` or `pay-for-attempt`     |
//! | `UM_SEED_WEBSITES`        | comma-separated URLs to monitor          |
//! | `RUST_LOG`                | log filter (default `info`)              |

use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use um_03_hub::{ConfigError, HubConfig};

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub hub: HubConfig,
    /// URLs inserted into the store before the first round.
    pub seed_websites: Vec<String>,
}

/// Startup failures.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to install logger: {0}")]
    Logging(String),
}

/// Read configuration from the process environment.
pub fn load_config() -> Result<RuntimeConfig, RuntimeError> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Read configuration through `lookup`. Unparseable values are logged and
/// the default is kept; the result is validated as a whole.
pub fn load_config_from<F>(lookup: F) -> Result<RuntimeConfig, RuntimeError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut hub = HubConfig::default();

    if let Some(host) = lookup("UM_HUB_HOST") {
        match host.parse() {
            Ok(addr) => hub.host = addr,
            Err(_) => warn!(value = %host, "UM_HUB_HOST is not an IP address, using default"),
        }
    }
    if let Some(port) = parse_var(&lookup, "UM_HUB_PORT") {
        hub.port = port;
    }
    if let Some(secs) = parse_var::<u64, _>(&lookup, "UM_ROUND_INTERVAL_SECS") {
        hub.round_interval = Duration::from_secs(secs);
    }
    if let Some(ms) = parse_var::<u64, _>(&lookup, "UM_REQUEST_TIMEOUT_MS") {
        hub.request_timeout = Duration::from_millis(ms);
    }
    if let Some(reward) = parse_var(&lookup, "UM_REWARD_PER_CHECK") {
        hub.reward_per_check = reward;
    }
    if let Some(policy) = lookup("UM_PAYOUT_POLICY") {
        hub.payout_policy = policy.parse()?;
    }

    let seed_websites = lookup("UM_SEED_WEBSITES")
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    hub.validate()?;
    Ok(RuntimeConfig { hub, seed_websites })
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}

/// Install the global fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_logging() -> Result<(), RuntimeError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| RuntimeError::Logging(e.to_string()))
}
