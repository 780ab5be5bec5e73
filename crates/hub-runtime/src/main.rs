//! # Uptime-Mesh Hub
//!
//! ## Startup Sequence
//!
//! 1. Install logging
//! 2. Load configuration from the environment
//! 3. Seed the store with `UM_SEED_WEBSITES`
//! 4. Bind the validator listener (fatal on failure)
//! 5. Serve and run rounds until Ctrl+C

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::info;

use hub_runtime::{init_logging, load_config};
use um_03_hub::{HubServer, InMemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = load_config().context("Invalid hub configuration")?;
    info!(
        bind = %config.hub.bind_addr(),
        round_interval_secs = config.hub.round_interval.as_secs(),
        request_timeout_ms = config.hub.request_timeout.as_millis() as u64,
        payout_policy = %config.hub.payout_policy,
        "Hub configuration loaded"
    );

    let store = Arc::new(InMemoryStore::new());
    for url in &config.seed_websites {
        let website = store.add_website(url.clone());
        info!(website_id = %website.id, url = %website.url, "Monitoring website");
    }

    let server = HubServer::bind(config.hub, store)
        .await
        .context("Failed to start hub")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let serving = tokio::spawn(server.run(shutdown_rx));

    info!("Hub is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    let _ = shutdown_tx.send(true);

    serving.await??;
    Ok(())
}
