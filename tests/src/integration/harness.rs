//! Test fixtures: a hub on an ephemeral port, an HTTP probe target, and a
//! hand-driven validator speaking the wire protocol directly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use futures_util::{SinkExt, StreamExt};
use shared_crypto::Ed25519KeyPair;
use shared_types::ValidatorId;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use um_01_protocol::{decode, encode, HubMessage, SignupRequest, ValidatorMessage};
use um_03_hub::{HubConfig, HubError, HubServer, HubService, InMemoryStore};

// =============================================================================
// HUB
// =============================================================================

/// A running hub bound to 127.0.0.1 on a random port.
pub struct TestHub {
    pub addr: SocketAddr,
    pub store: Arc<InMemoryStore>,
    pub service: Arc<HubService>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<Result<(), HubError>>,
}

/// Config with rounds effectively disabled and a short reply deadline.
pub fn test_config() -> HubConfig {
    HubConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        round_interval: Duration::from_secs(3600),
        request_timeout: Duration::from_millis(500),
        ..HubConfig::default()
    }
}

pub async fn start_hub(config: HubConfig) -> TestHub {
    let store = Arc::new(InMemoryStore::new());
    let server = HubServer::bind(config, store.clone()).await.unwrap();
    let addr = server.local_addr().unwrap();
    let service = server.service();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(server.run(shutdown_rx));

    TestHub {
        addr,
        store,
        service,
        shutdown,
        handle,
    }
}

impl TestHub {
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

// =============================================================================
// PROBE TARGET
// =============================================================================

/// HTTP server with `/up` (200), `/down` (503) and `/redirect` (302 to `/up`).
pub async fn start_target() -> SocketAddr {
    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
        .route(
            "/redirect",
            get(|| async { (StatusCode::FOUND, [("location", "/up")]) }),
        );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// Poll `condition` every 10ms until it holds or `within` elapses.
pub async fn wait_until<F: Fn() -> bool>(condition: F, within: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

// =============================================================================
// RAW VALIDATOR
// =============================================================================

/// A validator driven step by step from the test.
pub struct RawValidator {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    pub keypair: Ed25519KeyPair,
}

impl RawValidator {
    pub async fn connect(url: &str) -> Self {
        Self::connect_with(url, Ed25519KeyPair::generate()).await
    }

    pub async fn connect_with(url: &str, keypair: Ed25519KeyPair) -> Self {
        let (ws, _) = connect_async(url).await.unwrap();
        Self { ws, keypair }
    }

    pub async fn send(&mut self, message: &ValidatorMessage) {
        self.send_text(encode(message).unwrap()).await;
    }

    pub async fn send_text(&mut self, text: String) {
        self.ws.send(Message::Text(text.into())).await.unwrap();
    }

    /// Next protocol message, or `None` if nothing arrives in time.
    pub async fn recv(&mut self, within: Duration) -> Option<HubMessage> {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.ws.next()).await.ok()??;
            match frame {
                Ok(Message::Text(text)) => return Some(decode(text.as_str()).unwrap()),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    /// Complete a signed signup and return the acknowledged id.
    pub async fn sign_up(&mut self) -> ValidatorId {
        let request = SignupRequest::signed(&self.keypair, "127.0.0.1");
        let callback_id = request.callback_id;
        self.send(&ValidatorMessage::Signup(request)).await;

        match self.recv(Duration::from_secs(2)).await {
            Some(HubMessage::Signup(ack)) => {
                assert_eq!(ack.callback_id, callback_id);
                ack.validator_id
            }
            other => panic!("expected signup ack, got {other:?}"),
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
