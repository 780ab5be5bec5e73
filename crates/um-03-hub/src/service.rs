//! # Hub Service
//!
//! Coordinates signup, reply matching and validation rounds. Transport and
//! persistence are injected: frames arrive through [`HubService::handle_frame`]
//! and all durable state goes through the [`MonitorStore`] port.
//!
//! ## Reply authentication
//!
//! A reply is only accepted when
//! 1. its connection completed a signed signup,
//! 2. its signature verifies against that connection's registered key, and
//! 3. its `callbackId` was dispatched on that same connection.
//!
//! The `websiteId` and `validatorId` a reply carries are never trusted; the
//! round already knows which pair each callback belongs to.

use crate::domain::config::HubConfig;
use crate::domain::round::{aggregate_payouts, CheckReply, PairOutcome, RoundReport};
use crate::domain::validator_registry::{
    ConnectionHandle, ConnectionId, RegisteredValidator, ValidatorRegistry,
};
use crate::ports::outbound::MonitorStore;
use chrono::Utc;
use futures::future::join_all;
use shared_crypto::Ed25519PublicKey;
use shared_types::{CorrelationId, Tick, Validator, ValidatorId, Website};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use um_01_protocol::{
    decode, HubMessage, SignupAck, SignupRequest, ValidateReply, ValidateRequest,
    ValidatorMessage,
};
use um_02_pending_calls::{CallOutcome, PendingCallRegistry, ResolveOutcome};

/// What happened to an incoming validate reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyDisposition {
    /// Delivered to the waiting round.
    Accepted,
    /// The connection never completed signup.
    UnregisteredConnection,
    /// Signature does not match the connection's registered key.
    InvalidSignature,
    /// No live call for this callback id (late, duplicate, or never issued).
    UnknownCallback,
    /// The callback is live but was dispatched on another connection.
    WrongConnection,
}

/// Hub coordinator.
pub struct HubService {
    config: HubConfig,
    store: Arc<dyn MonitorStore>,
    validators: ValidatorRegistry,
    pending: PendingCallRegistry<CheckReply, ConnectionId>,
    next_connection_id: AtomicU64,
    rounds_completed: AtomicU64,
}

impl HubService {
    pub fn new(config: HubConfig, store: Arc<dyn MonitorStore>) -> Self {
        Self {
            config,
            store,
            validators: ValidatorRegistry::new(),
            pending: PendingCallRegistry::new(),
            next_connection_id: AtomicU64::new(1),
            rounds_completed: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Active validator connections.
    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    /// Checks currently awaiting a reply.
    pub fn pending_checks(&self) -> usize {
        self.pending.pending_count()
    }

    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed.load(Ordering::Relaxed)
    }

    // =========================================================================
    // CONNECTION LIFECYCLE
    // =========================================================================

    /// Allocate a connection id and its outbound queue.
    ///
    /// The transport drains the returned receiver onto the socket.
    pub fn open_connection(&self) -> (ConnectionHandle, mpsc::Receiver<HubMessage>) {
        let id = ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer);
        (ConnectionHandle::new(id, tx), rx)
    }

    /// Forget a connection. Its in-flight checks are left to time out.
    pub fn close_connection(&self, connection_id: ConnectionId) {
        if let Some(entry) = self.validators.remove(connection_id) {
            info!(
                connection_id = %connection_id,
                validator_id = %entry.validator_id,
                "Validator disconnected"
            );
        }
    }

    // =========================================================================
    // INBOUND MESSAGES
    // =========================================================================

    /// Decode and dispatch one text frame. Malformed frames are dropped.
    pub async fn handle_frame(&self, connection: &ConnectionHandle, text: &str) {
        match decode::<ValidatorMessage>(text) {
            Ok(ValidatorMessage::Signup(request)) => {
                self.handle_signup(connection, request).await;
            }
            Ok(ValidatorMessage::Validate(reply)) => {
                self.handle_validate_reply(connection, reply);
            }
            Err(e) => {
                warn!(
                    connection_id = %connection.id(),
                    error = %e,
                    "Discarding malformed frame"
                );
            }
        }
    }

    /// Register the connection as a validator if the signup is authentic.
    ///
    /// An invalid signature gets no response at all. The validator is keyed by
    /// the canonical lowercase hex of its key, whatever spelling it sent.
    /// Returns the validator id that was acknowledged.
    pub async fn handle_signup(
        &self,
        connection: &ConnectionHandle,
        request: SignupRequest,
    ) -> Option<ValidatorId> {
        if !request.verify() {
            warn!(
                connection_id = %connection.id(),
                public_key = %request.public_key,
                callback_id = %request.callback_id,
                "Rejected signup with invalid signature"
            );
            return None;
        }
        let public_key = match Ed25519PublicKey::from_hex(&request.public_key) {
            Ok(key) => key.to_hex(),
            Err(_) => return None,
        };

        let validator = match self
            .store
            .upsert_validator_by_public_key(
                &public_key,
                &request.ip,
                Validator::UNKNOWN_LOCATION,
            )
            .await
        {
            Ok(validator) => validator,
            Err(e) => {
                error!(
                    connection_id = %connection.id(),
                    public_key = %public_key,
                    error = %e,
                    "Failed to upsert validator"
                );
                return None;
            }
        };

        let ack = HubMessage::Signup(SignupAck {
            validator_id: validator.id.clone(),
            callback_id: request.callback_id,
        });
        if !connection.send(ack, self.config.request_timeout).await {
            warn!(
                connection_id = %connection.id(),
                validator_id = %validator.id,
                "Could not queue signup acknowledgement"
            );
            return None;
        }

        let previous = self.validators.insert(RegisteredValidator {
            validator_id: validator.id.clone(),
            public_key,
            connection: connection.clone(),
        });

        info!(
            connection_id = %connection.id(),
            validator_id = %validator.id,
            ip = %request.ip,
            refreshed = previous.is_some(),
            "Validator signed up"
        );
        Some(validator.id)
    }

    /// Authenticate a reply and hand it to the round waiting on it.
    pub fn handle_validate_reply(
        &self,
        connection: &ConnectionHandle,
        reply: ValidateReply,
    ) -> ReplyDisposition {
        let origin = connection.id();

        let Some(registered) = self.validators.get(origin) else {
            warn!(
                connection_id = %origin,
                callback_id = %reply.callback_id,
                "Reply from connection that has not signed up"
            );
            return ReplyDisposition::UnregisteredConnection;
        };

        if !reply.verify(&registered.public_key) {
            warn!(
                connection_id = %origin,
                validator_id = %registered.validator_id,
                callback_id = %reply.callback_id,
                "Rejected reply with invalid signature"
            );
            return ReplyDisposition::InvalidSignature;
        }

        let check = CheckReply {
            status: reply.status,
            latency_ms: reply.latency_ms,
        };
        match self
            .pending
            .resolve_if(&reply.callback_id, |dispatched_on| *dispatched_on == origin, check)
        {
            ResolveOutcome::Resolved => {
                debug!(
                    connection_id = %origin,
                    callback_id = %reply.callback_id,
                    status = %reply.status,
                    latency_ms = reply.latency_ms,
                    "Reply accepted"
                );
                ReplyDisposition::Accepted
            }
            ResolveOutcome::Unknown => ReplyDisposition::UnknownCallback,
            ResolveOutcome::Rejected => ReplyDisposition::WrongConnection,
        }
    }

    // =========================================================================
    // VALIDATION ROUNDS
    // =========================================================================

    /// Run one round: check every active website from every connected
    /// validator, wait for all of them, then persist and pay.
    pub async fn round_once(&self) -> RoundReport {
        let mut report = RoundReport::default();

        let websites = match self.store.list_active_websites().await {
            Ok(websites) => websites,
            Err(e) => {
                error!(error = %e, "Failed to load websites, skipping round");
                report.store_errors += 1;
                return report;
            }
        };
        let validators = self.validators.snapshot();
        report.websites = websites.len();
        report.validators = validators.len();

        if websites.is_empty() || validators.is_empty() {
            debug!(
                websites = websites.len(),
                validators = validators.len(),
                "Nothing to check this round"
            );
            return report;
        }

        let checks: Vec<_> = websites
            .iter()
            .flat_map(|website| {
                validators
                    .iter()
                    .map(move |validator| self.dispatch_check(website, validator))
            })
            .collect();
        report.dispatched = checks.len();
        info!(
            websites = report.websites,
            validators = report.validators,
            checks = report.dispatched,
            "Validation round started"
        );

        let outcomes = join_all(checks).await;

        let penalty = self.config.timeout_penalty_latency_ms;
        let ticks: Vec<Tick> = outcomes
            .iter()
            .map(|outcome| {
                if outcome.outcome.is_timed_out() {
                    report.timed_out += 1;
                    warn!(
                        website_id = %outcome.website_id,
                        validator_id = %outcome.validator_id,
                        penalty_latency_ms = penalty,
                        "Check timed out, recording Bad tick"
                    );
                } else {
                    report.answered += 1;
                }
                outcome.to_tick(penalty)
            })
            .collect();

        let payouts = aggregate_payouts(
            &ticks,
            self.config.payout_policy,
            self.config.reward_per_check,
        );

        match self.store.append_ticks_batch(ticks).await {
            Ok(written) => report.ticks_persisted = written,
            Err(e) => {
                error!(error = %e, ticks = report.dispatched, "Failed to persist ticks");
                report.store_errors += 1;
            }
        }

        for (validator_id, amount) in payouts {
            match self
                .store
                .increment_validator_payout(&validator_id, amount)
                .await
            {
                Ok(()) => report.payout_total += amount,
                Err(e) => {
                    error!(
                        validator_id = %validator_id,
                        amount = amount,
                        error = %e,
                        "Failed to credit payout"
                    );
                    report.store_errors += 1;
                }
            }
        }

        self.rounds_completed.fetch_add(1, Ordering::Relaxed);
        info!(
            answered = report.answered,
            timed_out = report.timed_out,
            ticks_persisted = report.ticks_persisted,
            payout_total = report.payout_total,
            policy = %self.config.payout_policy,
            "Validation round finished"
        );
        report
    }

    async fn dispatch_check(
        &self,
        website: &Website,
        validator: &RegisteredValidator,
    ) -> PairOutcome {
        let callback_id = CorrelationId::new();
        let connection = &validator.connection;

        let outcome = match self.pending.register(
            callback_id,
            connection.id(),
            self.config.request_timeout,
        ) {
            Ok(call) => {
                let request = HubMessage::Validate(ValidateRequest {
                    url: website.url.clone(),
                    callback_id,
                    website_id: website.id.clone(),
                });
                if !connection.send(request, self.config.request_timeout).await {
                    debug!(
                        connection_id = %connection.id(),
                        callback_id = %callback_id,
                        "Validate request not delivered, waiting out the deadline"
                    );
                }
                call.await
            }
            Err(e) => {
                error!(error = %e, "Failed to register check");
                CallOutcome::TimedOut
            }
        };

        PairOutcome {
            website_id: website.id.clone(),
            validator_id: validator.validator_id.clone(),
            outcome,
            observed_at: Utc::now(),
        }
    }

    /// Run rounds on the configured interval until shutdown.
    ///
    /// The first round starts one interval after launch. Rounds never overlap;
    /// a round that overruns its slot causes the missed slots to be skipped.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.round_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = period.as_secs(),
            timeout_ms = self.config.request_timeout.as_millis() as u64,
            "Validation rounds scheduled"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = self.round_once() => {}
                        _ = wait_for_shutdown(&mut shutdown) => break,
                    }
                }
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        info!("Validation rounds stopped");
    }
}

/// Resolve once the shutdown flag is set or its sender is gone.
pub(crate) async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
