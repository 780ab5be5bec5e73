//! # Misbehaving Validators
//!
//! Hand-driven clients that lie, stay silent, or talk out of turn. The hub
//! must never pay for or record an unauthenticated answer, and must keep
//! serving everyone else.

use std::time::Duration;

use shared_crypto::Ed25519KeyPair;
use shared_types::{CorrelationId, TickStatus};
use um_01_protocol::{HubMessage, SignupRequest, ValidateReply, ValidatorMessage};

use super::harness::{start_hub, test_config, wait_until, RawValidator};

const QUIET: Duration = Duration::from_millis(300);

#[tokio::test]
async fn test_tampered_signup_is_silently_dropped() {
    let hub = start_hub(test_config()).await;
    let mut client = RawValidator::connect(&hub.ws_url()).await;

    let mut request = SignupRequest::signed(&client.keypair, "127.0.0.1");
    request.callback_id = CorrelationId::new();
    client.send(&ValidatorMessage::Signup(request)).await;

    assert!(client.recv(QUIET).await.is_none());
    assert!(hub.service.validators().is_empty());
    assert_eq!(hub.store.validator_count(), 0);

    hub.stop().await;
}

#[tokio::test]
async fn test_signup_with_borrowed_public_key_rejected() {
    let hub = start_hub(test_config()).await;
    let victim = Ed25519KeyPair::generate();
    let mut attacker = RawValidator::connect(&hub.ws_url()).await;

    // Signature is the attacker's own, key claimed is the victim's.
    let mut request = SignupRequest::signed(&attacker.keypair, "127.0.0.1");
    request.public_key = victim.public_key().to_hex();
    attacker.send(&ValidatorMessage::Signup(request)).await;

    assert!(attacker.recv(QUIET).await.is_none());
    assert!(hub.store.validator_by_public_key(&victim.public_key().to_hex()).is_none());

    hub.stop().await;
}

#[tokio::test]
async fn test_malformed_frames_do_not_end_connection() {
    let hub = start_hub(test_config()).await;
    let mut client = RawValidator::connect(&hub.ws_url()).await;

    client.send_text("{{{".to_string()).await;
    client
        .send_text(r#"{"type":"register","data":{}}"#.to_string())
        .await;
    client.send_text(r#"{"type":"signup","data":{}}"#.to_string()).await;

    let validator_id = client.sign_up().await;
    assert!(hub.store.validator(&validator_id).is_some());

    hub.stop().await;
}

#[tokio::test]
async fn test_silent_validator_recorded_as_bad() {
    let hub = start_hub(test_config()).await;
    hub.store.add_website("https://silent.example");
    let mut client = RawValidator::connect(&hub.ws_url()).await;
    let validator_id = client.sign_up().await;

    let report = hub.service.round_once().await;

    assert_eq!(report.timed_out, 1);
    let ticks = hub.store.ticks();
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0].validator_id, validator_id);
    assert_eq!(ticks[0].status, TickStatus::Bad);
    assert_eq!(ticks[0].latency_ms, 1000);
    assert!(!ticks[0].verified);
    assert_eq!(hub.store.validator(&validator_id).unwrap().pending_payouts, 0);

    // The request was still delivered.
    assert!(matches!(
        client.recv(QUIET).await,
        Some(HubMessage::Validate(_))
    ));

    hub.stop().await;
}

#[tokio::test]
async fn test_forged_reply_is_not_accepted() {
    let hub = start_hub(test_config()).await;
    hub.store.add_website("https://forged.example");
    let mut client = RawValidator::connect(&hub.ws_url()).await;
    let validator_id = client.sign_up().await;

    let service = hub.service.clone();
    let round = tokio::spawn(async move { service.round_once().await });

    let Some(HubMessage::Validate(request)) = client.recv(Duration::from_secs(2)).await else {
        panic!("expected validate request");
    };
    let outsider = Ed25519KeyPair::generate();
    let forged = ValidateReply::signed(
        &request,
        TickStatus::Good,
        1,
        Some(validator_id.clone()),
        &outsider,
    );
    client.send(&ValidatorMessage::Validate(forged)).await;

    let report = round.await.unwrap();
    assert_eq!(report.answered, 0);
    assert_eq!(report.timed_out, 1);
    let ticks = hub.store.ticks();
    assert_eq!(ticks[0].status, TickStatus::Bad);
    assert!(!ticks[0].verified);

    hub.stop().await;
}

#[tokio::test]
async fn test_reply_for_another_connection_is_not_accepted() {
    let hub = start_hub(test_config()).await;
    hub.store.add_website("https://hijack.example");

    let mut honest = RawValidator::connect(&hub.ws_url()).await;
    honest.sign_up().await;
    let mut thief = RawValidator::connect(&hub.ws_url()).await;
    thief.sign_up().await;

    let service = hub.service.clone();
    let round = tokio::spawn(async move { service.round_once().await });

    let Some(HubMessage::Validate(stolen)) = honest.recv(Duration::from_secs(2)).await else {
        panic!("expected validate request");
    };
    let Some(HubMessage::Validate(own)) = thief.recv(Duration::from_secs(2)).await else {
        panic!("expected validate request");
    };

    // Thief answers the honest validator's callback with its own valid key,
    // then answers its own request properly.
    let hijack = ValidateReply::signed(&stolen, TickStatus::Bad, 3, None, &thief.keypair);
    thief.send(&ValidatorMessage::Validate(hijack)).await;
    let reply = ValidateReply::signed(&own, TickStatus::Good, 9, None, &thief.keypair);
    thief.send(&ValidatorMessage::Validate(reply)).await;

    let report = round.await.unwrap();
    assert_eq!(report.dispatched, 2);
    assert_eq!(report.answered, 1);
    assert_eq!(report.timed_out, 1);

    hub.stop().await;
}

#[tokio::test]
async fn test_late_reply_is_ignored() {
    let hub = start_hub(test_config()).await;
    hub.store.add_website("https://late.example");
    let mut client = RawValidator::connect(&hub.ws_url()).await;
    client.sign_up().await;

    let report = hub.service.round_once().await;
    assert_eq!(report.timed_out, 1);

    let Some(HubMessage::Validate(request)) = client.recv(QUIET).await else {
        panic!("expected validate request");
    };
    let late = ValidateReply::signed(&request, TickStatus::Good, 4, None, &client.keypair);
    client.send(&ValidatorMessage::Validate(late)).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    let ticks = hub.store.ticks();
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0].status, TickStatus::Bad);

    hub.stop().await;
}

#[tokio::test]
async fn test_disconnect_removes_validator() {
    let hub = start_hub(test_config()).await;
    hub.store.add_website("https://gone.example");
    let mut client = RawValidator::connect(&hub.ws_url()).await;
    client.sign_up().await;
    assert_eq!(hub.service.validators().len(), 1);

    client.close().await;

    let service = hub.service.clone();
    assert!(wait_until(|| service.validators().is_empty(), Duration::from_secs(2)).await);
    assert!(hub.service.round_once().await.is_idle());

    hub.stop().await;
}

#[tokio::test]
async fn test_oversized_frame_closes_connection() {
    let hub = start_hub(um_03_hub::HubConfig {
        max_message_size: 1024,
        ..test_config()
    })
    .await;
    let mut client = RawValidator::connect(&hub.ws_url()).await;
    client.sign_up().await;

    client.send_text("x".repeat(4096)).await;

    let service = hub.service.clone();
    assert!(wait_until(|| service.validators().is_empty(), Duration::from_secs(2)).await);

    hub.stop().await;
}
