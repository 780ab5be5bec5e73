//! # Validator Agent
//!
//! ```bash
//! # Connect to a local hub, keeping the identity in ./validator.key
//! validator-agent
//!
//! # Remote hub with a key supplied by the environment
//! PRIVATE_KEY='[12, 34, ...]' validator-agent --hub-url ws://hub.example.com:8081
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use shared_crypto::{load_or_generate, parse_key_material, Ed25519KeyPair};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use um_04_validator_agent::{AgentConfig, HttpProber, ValidatorAgent};

/// Uptime-Mesh validator agent
#[derive(Parser, Debug)]
#[command(name = "validator-agent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Hub WebSocket endpoint
    #[arg(long, env = "UM_HUB_URL", default_value = "ws://localhost:8081")]
    hub_url: String,

    /// Secret key as a JSON byte array or hex (32-byte seed or 64-byte keypair)
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Key file used when no key is given; created on first run
    #[arg(long, env = "UM_KEY_FILE", default_value = "validator.key")]
    key_file: PathBuf,

    /// IP address reported to the hub
    #[arg(long, env = "UM_ADVERTISED_IP", default_value = "127.0.0.1")]
    advertised_ip: String,

    /// Seconds to wait before reconnecting
    #[arg(long, default_value = "5")]
    reconnect_secs: u64,

    /// HTTP timeout per check, in milliseconds
    #[arg(long, default_value = "8000")]
    probe_timeout_ms: u64,
}

fn load_keypair(args: &Args) -> Result<Ed25519KeyPair> {
    match &args.private_key {
        Some(material) => parse_key_material(material).context("Invalid PRIVATE_KEY"),
        None => load_or_generate(&args.key_file)
            .with_context(|| format!("Failed to load key file {}", args.key_file.display())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let keypair = load_keypair(&args)?;

    let config = AgentConfig {
        hub_url: args.hub_url,
        advertised_ip: args.advertised_ip,
        reconnect_backoff: Duration::from_secs(args.reconnect_secs),
        probe_timeout: Duration::from_millis(args.probe_timeout_ms),
        ..AgentConfig::default()
    };
    let prober = HttpProber::new(config.probe_timeout, config.probe_failure_latency_ms)
        .context("Failed to build HTTP client")?;
    let agent = ValidatorAgent::new(config, keypair, Arc::new(prober))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = tokio::spawn(async move { agent.run(shutdown_rx).await });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(true);
    runner.await?;

    Ok(())
}
