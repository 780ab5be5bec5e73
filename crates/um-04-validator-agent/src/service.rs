//! # Validator Agent
//!
//! Holds one session with the hub at a time:
//!
//! 1. connect and send a signed signup,
//! 2. wait for the acknowledgement carrying our validator id,
//! 3. answer each validate request with a signed probe result,
//! 4. on any failure, wait out the backoff and start over.
//!
//! Probes run on their own tasks so a slow website never delays the socket.

use crate::domain::config::AgentConfig;
use crate::domain::errors::AgentError;
use crate::domain::state::{AgentEvent, AgentState};
use crate::ports::outbound::Prober;
use futures_util::{FutureExt, SinkExt, StreamExt};
use parking_lot::RwLock;
use shared_crypto::Ed25519KeyPair;
use shared_types::ValidatorId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use um_01_protocol::{
    decode, encode, HubMessage, SignupRequest, ValidateReply, ValidatorMessage,
};
use um_02_pending_calls::{CallOutcome, PendingCall, PendingCallRegistry};

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The hub closed the connection.
    Closed,
    /// Local shutdown was requested.
    Shutdown,
}

/// The validator side of the protocol.
pub struct ValidatorAgent {
    config: AgentConfig,
    keypair: Arc<Ed25519KeyPair>,
    prober: Arc<dyn Prober>,
    state: RwLock<AgentState>,
    acks: PendingCallRegistry<ValidatorId>,
    checks_answered: Arc<AtomicU64>,
}

impl ValidatorAgent {
    pub fn new(
        config: AgentConfig,
        keypair: Ed25519KeyPair,
        prober: Arc<dyn Prober>,
    ) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self {
            config,
            keypair: Arc::new(keypair),
            prober,
            state: RwLock::new(AgentState::default()),
            acks: PendingCallRegistry::new(),
            checks_answered: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Hex public key identifying this validator.
    pub fn public_key(&self) -> String {
        self.keypair.public_key().to_hex()
    }

    pub fn state(&self) -> AgentState {
        self.state.read().clone()
    }

    pub fn checks_answered(&self) -> u64 {
        self.checks_answered.load(Ordering::Relaxed)
    }

    fn apply(&self, event: AgentEvent) {
        let mut state = self.state.write();
        match state.on(event.clone()) {
            Some(next) => *state = next,
            None => debug!(state = ?*state, event = ?event, "Ignoring invalid state transition"),
        }
    }

    /// Keep a session with the hub alive until `shutdown` is set.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            hub_url = %self.config.hub_url,
            public_key = %self.public_key(),
            "Validator agent starting"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let ended = self.run_session(&mut shutdown).await;
            self.apply(AgentEvent::Lost);

            match ended {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Closed) => warn!("Hub closed the connection"),
                Err(e) => warn!(error = %e, "Hub session ended"),
            }

            info!(
                backoff_secs = self.config.reconnect_backoff.as_secs(),
                "Reconnecting after backoff"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.reconnect_backoff) => {}
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        info!("Validator agent stopped");
    }

    /// Run a single connection from dial to close.
    pub async fn run_session(
        &self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<SessionEnd, AgentError> {
        self.apply(AgentEvent::Dial);

        let connected = tokio::select! {
            result = connect_async(self.config.hub_url.as_str()) => result,
            _ = wait_for_shutdown(shutdown) => return Ok(SessionEnd::Shutdown),
        };
        let (ws_stream, _) = connected.map_err(|e| AgentError::Connect(e.to_string()))?;
        info!(hub_url = %self.config.hub_url, "Connected to hub");

        let (mut write, mut read) = ws_stream.split();
        let (reply_tx, mut reply_rx) =
            mpsc::channel::<ValidatorMessage>(self.config.outbound_buffer);

        let signup = SignupRequest::signed(&self.keypair, self.config.advertised_ip.clone());
        let mut ack = self
            .acks
            .register(signup.callback_id, (), self.config.signup_timeout)?;
        let frame = encode(&ValidatorMessage::Signup(signup))?;
        write
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?;
        self.apply(AgentEvent::SignupSent);
        debug!(callback_id = %ack.id(), "Signup sent");

        let period = self.config.heartbeat_interval;
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut validator_id: Option<ValidatorId> = None;

        loop {
            tokio::select! {
                outcome = &mut ack, if validator_id.is_none() => {
                    validator_id = Some(self.accept_ack(outcome)?);
                }
                frame = read.next() => match frame {
                    None => return Ok(SessionEnd::Closed),
                    Some(Ok(Message::Text(text))) => {
                        self.on_frame(text.as_str(), &mut validator_id, &mut ack, &reply_tx)?;
                    }
                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => self.on_frame(text, &mut validator_id, &mut ack, &reply_tx)?,
                        Err(_) => debug!("Ignoring non-UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        write
                            .send(Message::Pong(data))
                            .await
                            .map_err(|e| AgentError::Transport(e.to_string()))?;
                    }
                    Some(Ok(Message::Close(_))) => return Ok(SessionEnd::Closed),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(AgentError::Transport(e.to_string())),
                },
                Some(message) = reply_rx.recv() => {
                    let frame = encode(&message)?;
                    write
                        .send(Message::Text(frame.into()))
                        .await
                        .map_err(|e| AgentError::Transport(e.to_string()))?;
                }
                _ = heartbeat.tick() => {
                    match &validator_id {
                        Some(id) => info!(
                            validator_id = %id,
                            checks_answered = self.checks_answered(),
                            "Validator agent running"
                        ),
                        None => info!("Validator agent running, awaiting signup acknowledgement"),
                    }
                }
                _ = wait_for_shutdown(shutdown) => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(SessionEnd::Shutdown);
                }
            }
        }
    }

    fn on_frame(
        &self,
        text: &str,
        validator_id: &mut Option<ValidatorId>,
        ack: &mut PendingCall<ValidatorId>,
        replies: &mpsc::Sender<ValidatorMessage>,
    ) -> Result<(), AgentError> {
        self.handle_frame(text, validator_id.as_ref(), replies);
        // An ack resolves `ack` synchronously; take it before the next frame
        // so a request right behind it is not dropped.
        if validator_id.is_none() {
            if let Some(outcome) = ack.now_or_never() {
                *validator_id = Some(self.accept_ack(outcome)?);
            }
        }
        Ok(())
    }

    fn accept_ack(&self, outcome: CallOutcome<ValidatorId>) -> Result<ValidatorId, AgentError> {
        match outcome {
            CallOutcome::Resolved(id) => {
                info!(validator_id = %id, "Signed up with hub");
                self.apply(AgentEvent::Acked(id.clone()));
                Ok(id)
            }
            CallOutcome::TimedOut => Err(AgentError::SignupTimeout(self.config.signup_timeout)),
        }
    }

    /// Route one hub frame. Probes are spawned; their replies come back
    /// through `replies`.
    fn handle_frame(
        &self,
        text: &str,
        validator_id: Option<&ValidatorId>,
        replies: &mpsc::Sender<ValidatorMessage>,
    ) {
        let message = match decode::<HubMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Discarding malformed frame from hub");
                return;
            }
        };

        match message {
            HubMessage::Signup(ack) => {
                self.acks.resolve(&ack.callback_id, ack.validator_id);
            }
            HubMessage::Validate(request) => {
                let Some(validator_id) = validator_id.cloned() else {
                    warn!(
                        callback_id = %request.callback_id,
                        "Ignoring validate request before signup acknowledgement"
                    );
                    return;
                };

                let prober = Arc::clone(&self.prober);
                let keypair = Arc::clone(&self.keypair);
                let answered = Arc::clone(&self.checks_answered);
                let replies = replies.clone();
                tokio::spawn(async move {
                    let result = prober.probe(&request.url).await;
                    debug!(
                        callback_id = %request.callback_id,
                        url = %request.url,
                        status = %result.status,
                        latency_ms = result.latency_ms,
                        "Check complete"
                    );
                    let reply = ValidateReply::signed(
                        &request,
                        result.status,
                        result.latency_ms,
                        Some(validator_id),
                        &keypair,
                    );
                    if replies.send(ValidatorMessage::Validate(reply)).await.is_ok() {
                        answered.fetch_add(1, Ordering::Relaxed);
                    } else {
                        debug!(
                            callback_id = %request.callback_id,
                            "Session gone before reply was sent"
                        );
                    }
                });
            }
        }
    }
}

/// Resolve once the shutdown flag is set or its sender is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
