//! WebSocket transport for validator connections.
//!
//! One task per connection multiplexes inbound frames and the connection's
//! outbound queue onto the socket. Whatever ends the loop (close frame,
//! protocol error, oversized frame, write failure), the connection is removed
//! from the validator registry before the task exits.

use crate::domain::config::HubConfig;
use crate::domain::errors::HubError;
use crate::ports::outbound::MonitorStore;
use crate::service::{wait_for_shutdown, HubService};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use um_01_protocol::encode;

#[derive(Clone)]
struct TransportState {
    service: Arc<HubService>,
    shutdown: watch::Receiver<bool>,
}

/// Routes validator WebSocket upgrades to `service`. Open connections are
/// closed once `shutdown` flips to `true`.
pub fn router(service: Arc<HubService>, shutdown: watch::Receiver<bool>) -> Router {
    Router::new()
        .route("/", get(ws_upgrade))
        .with_state(TransportState { service, shutdown })
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<TransportState>) -> Response {
    let limit = state.service.config().max_message_size;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| handle_socket(state.service, socket, state.shutdown))
}

async fn handle_socket(
    service: Arc<HubService>,
    mut socket: WebSocket,
    mut shutdown: watch::Receiver<bool>,
) {
    let (connection, mut outbound) = service.open_connection();
    let connection_id = connection.id();
    info!(connection_id = %connection_id, "Validator connection opened");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let Some(result) = incoming else { break };
                match result {
                    Ok(Message::Text(text)) => {
                        service.handle_frame(&connection, &text).await;
                    }
                    Ok(Message::Binary(data)) => match String::from_utf8(data) {
                        Ok(text) => service.handle_frame(&connection, &text).await,
                        Err(_) => {
                            debug!(
                                connection_id = %connection_id,
                                "Ignoring non-UTF-8 binary frame"
                            );
                        }
                    },
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = socket.send(Message::Pong(data)).await {
                            warn!(
                                connection_id = %connection_id,
                                error = %e,
                                "Failed to send pong"
                            );
                            break;
                        }
                    }
                    Ok(Message::Pong(_)) => {}
                    Ok(Message::Close(_)) => {
                        debug!(connection_id = %connection_id, "WebSocket close received");
                        break;
                    }
                    Err(e) => {
                        warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
            Some(message) = outbound.recv() => {
                let text = match encode(&message) {
                    Ok(text) => text,
                    Err(e) => {
                        error!(
                            connection_id = %connection_id,
                            error = %e,
                            "Failed to encode message"
                        );
                        continue;
                    }
                };
                if let Err(e) = socket.send(Message::Text(text)).await {
                    warn!(connection_id = %connection_id, error = %e, "Failed to send message");
                    break;
                }
            }
            _ = wait_for_shutdown(&mut shutdown) => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    service.close_connection(connection_id);
    info!(connection_id = %connection_id, "Validator connection closed");
}

/// A bound hub, ready to serve.
pub struct HubServer {
    listener: TcpListener,
    service: Arc<HubService>,
}

impl HubServer {
    /// Validate `config` and bind its listen address.
    pub async fn bind(config: HubConfig, store: Arc<dyn MonitorStore>) -> Result<Self, HubError> {
        config.validate()?;
        let addr = config.bind_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| HubError::Bind { addr, source })?;

        Ok(Self {
            listener,
            service: Arc::new(HubService::new(config, store)),
        })
    }

    /// Actual bound address (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, HubError> {
        self.listener.local_addr().map_err(HubError::Serve)
    }

    pub fn service(&self) -> Arc<HubService> {
        Arc::clone(&self.service)
    }

    /// Accept connections and run rounds until `shutdown` flips to `true`.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), HubError> {
        let addr = self.local_addr()?;
        info!(%addr, "Hub listening for validators");

        let rounds = tokio::spawn(Arc::clone(&self.service).run(shutdown.clone()));

        let app = router(self.service, shutdown.clone());
        let mut server_shutdown = shutdown;
        let served = axum::serve(self.listener, app)
            .with_graceful_shutdown(async move { wait_for_shutdown(&mut server_shutdown).await })
            .await
            .map_err(HubError::Serve);

        if let Err(e) = rounds.await {
            error!(error = %e, "Round scheduler task failed");
        }
        info!("Hub stopped");
        served
    }
}
