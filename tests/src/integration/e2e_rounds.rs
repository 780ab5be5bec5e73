//! # Real Agent Against Real Hub
//!
//! ```text
//!   ValidatorAgent ──ws──▶ HubServer ──round_once──▶ InMemoryStore
//!        │                                               ▲
//!        └── HTTP GET ──▶ probe target (/up, /down) ─────┘ ticks + payouts
//! ```

use std::sync::Arc;
use std::time::Duration;

use shared_crypto::Ed25519KeyPair;
use shared_types::TickStatus;
use tokio::sync::watch;
use um_03_hub::{HubConfig, PayoutPolicy};
use um_04_validator_agent::{AgentConfig, HttpProber, ValidatorAgent};

use super::harness::{start_hub, start_target, test_config, wait_until, TestHub};

struct RunningAgent {
    agent: Arc<ValidatorAgent>,
    shutdown: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

impl RunningAgent {
    async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

fn spawn_agent(hub: &TestHub, keypair: Ed25519KeyPair) -> RunningAgent {
    let config = AgentConfig {
        hub_url: hub.ws_url(),
        probe_timeout: Duration::from_millis(300),
        reconnect_backoff: Duration::from_millis(100),
        ..AgentConfig::default()
    };
    let prober = HttpProber::new(config.probe_timeout, config.probe_failure_latency_ms).unwrap();
    let agent = Arc::new(ValidatorAgent::new(config, keypair, Arc::new(prober)).unwrap());
    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn({
        let agent = agent.clone();
        async move { agent.run(shutdown_rx).await }
    });
    RunningAgent {
        agent,
        shutdown,
        handle,
    }
}

#[tokio::test]
async fn test_agent_checks_up_and_down_sites() {
    let target = start_target().await;
    let hub = start_hub(test_config()).await;
    let up = hub.store.add_website(format!("http://{target}/up"));
    let down = hub.store.add_website(format!("http://{target}/down"));

    let running = spawn_agent(&hub, Ed25519KeyPair::generate());
    let service = hub.service.clone();
    assert!(wait_until(|| service.validators().len() == 1, Duration::from_secs(5)).await);
    let agent = running.agent.clone();
    assert!(wait_until(|| agent.state().is_registered(), Duration::from_secs(5)).await);

    let report = hub.service.round_once().await;
    assert_eq!(report.dispatched, 2);
    assert_eq!(report.answered, 2);
    assert_eq!(report.ticks_persisted, 2);

    let ticks = hub.store.ticks();
    let up_tick = ticks.iter().find(|t| t.website_id == up.id).unwrap();
    let down_tick = ticks.iter().find(|t| t.website_id == down.id).unwrap();
    assert_eq!(up_tick.status, TickStatus::Good);
    assert_eq!(down_tick.status, TickStatus::Bad);
    assert!(up_tick.verified && down_tick.verified);
    assert!(down_tick.latency_ms < 1000);

    let validator = hub
        .store
        .validator_by_public_key(&running.agent.public_key())
        .unwrap();
    assert_eq!(validator.pending_payouts, 200);
    assert_eq!(validator.ip, "127.0.0.1");

    running.stop().await;
    hub.stop().await;
}

#[tokio::test]
async fn test_redirect_counts_as_followed_response() {
    let target = start_target().await;
    let hub = start_hub(test_config()).await;
    hub.store.add_website(format!("http://{target}/redirect"));

    let running = spawn_agent(&hub, Ed25519KeyPair::generate());
    let service = hub.service.clone();
    assert!(wait_until(|| service.validators().len() == 1, Duration::from_secs(5)).await);

    hub.service.round_once().await;
    let ticks = hub.store.ticks();
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0].status, TickStatus::Good);

    running.stop().await;
    hub.stop().await;
}

#[tokio::test]
async fn test_unreachable_site_reports_failure_latency() {
    let hub = start_hub(test_config()).await;
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);
    hub.store.add_website(format!("http://{dead_addr}/"));

    let running = spawn_agent(&hub, Ed25519KeyPair::generate());
    let service = hub.service.clone();
    assert!(wait_until(|| service.validators().len() == 1, Duration::from_secs(5)).await);

    hub.service.round_once().await;
    let ticks = hub.store.ticks();
    assert_eq!(ticks[0].status, TickStatus::Bad);
    assert_eq!(ticks[0].latency_ms, 1000);
    // Answered and signed, so it is a verified Bad.
    assert!(ticks[0].verified);

    running.stop().await;
    hub.stop().await;
}

#[tokio::test]
async fn test_restarted_agent_keeps_identity() {
    let target = start_target().await;
    let hub = start_hub(test_config()).await;
    hub.store.add_website(format!("http://{target}/up"));
    let seed = [5u8; 32];

    let first = spawn_agent(&hub, Ed25519KeyPair::from_seed(seed));
    let service = hub.service.clone();
    assert!(wait_until(|| service.validators().len() == 1, Duration::from_secs(5)).await);
    hub.service.round_once().await;
    first.stop().await;
    assert!(wait_until(|| service.validators().is_empty(), Duration::from_secs(5)).await);

    let second = spawn_agent(&hub, Ed25519KeyPair::from_seed(seed));
    assert!(wait_until(|| service.validators().len() == 1, Duration::from_secs(5)).await);
    hub.service.round_once().await;

    assert_eq!(hub.store.validator_count(), 1);
    let ticks = hub.store.ticks();
    assert_eq!(ticks.len(), 2);
    assert_eq!(ticks[0].validator_id, ticks[1].validator_id);
    let validator = hub.store.validator(&ticks[0].validator_id).unwrap();
    assert_eq!(validator.pending_payouts, 200);

    second.stop().await;
    hub.stop().await;
}

#[tokio::test]
async fn test_agent_reconnects_after_hub_restart() {
    let hub = start_hub(test_config()).await;
    let addr = hub.addr;
    let running = spawn_agent(&hub, Ed25519KeyPair::generate());
    let service = hub.service.clone();
    assert!(wait_until(|| service.validators().len() == 1, Duration::from_secs(5)).await);

    hub.stop().await;

    // Same port, fresh hub and store.
    let restarted = start_hub(HubConfig {
        port: addr.port(),
        ..test_config()
    })
    .await;
    let service = restarted.service.clone();
    assert!(wait_until(|| service.validators().len() == 1, Duration::from_secs(5)).await);
    assert_eq!(restarted.store.validator_count(), 1);

    running.stop().await;
    restarted.stop().await;
}

#[tokio::test]
async fn test_pay_for_attempt_end_to_end() {
    let target = start_target().await;
    let hub = start_hub(HubConfig {
        payout_policy: PayoutPolicy::PayForAttempt,
        reward_per_check: 5,
        ..test_config()
    })
    .await;
    hub.store.add_website(format!("http://{target}/down"));

    let running = spawn_agent(&hub, Ed25519KeyPair::generate());
    let service = hub.service.clone();
    assert!(wait_until(|| service.validators().len() == 1, Duration::from_secs(5)).await);

    let report = hub.service.round_once().await;
    assert_eq!(report.payout_total, 5);

    running.stop().await;
    hub.stop().await;
}
