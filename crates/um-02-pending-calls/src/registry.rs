//! Pending call store with per-entry deadline timers.
//!
//! Flow:
//! 1. Caller generates a `CorrelationId`
//! 2. Caller calls `register()` and gets a `PendingCall` handle
//! 3. Caller sends the request carrying the id
//! 4. The reply listener calls `resolve()` (or `resolve_if()`) with the result
//! 5. Caller awaits the handle; it yields `TimedOut` if the deadline fired first

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use shared_types::CorrelationId;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// How a pending call completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    /// A matching reply arrived before the deadline.
    Resolved(T),
    /// The deadline fired first (or the registry went away).
    TimedOut,
}

impl<T> CallOutcome<T> {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, CallOutcome::TimedOut)
    }
}

/// Result of a `resolve` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The live entry was completed with the given value.
    Resolved,
    /// No live entry: already resolved, timed out, cancelled, or never issued.
    Unknown,
    /// A live entry exists but its context did not satisfy the predicate.
    Rejected,
}

/// Errors from registry operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PendingError {
    /// A live entry already uses this id.
    #[error("Correlation id {0} is already pending")]
    DuplicateId(CorrelationId),
}

/// Counters for the registry.
#[derive(Debug, Default)]
pub struct PendingStats {
    /// Total calls registered
    pub total_registered: AtomicU64,
    /// Total calls completed by a reply
    pub total_resolved: AtomicU64,
    /// Total calls completed by their deadline
    pub total_timeouts: AtomicU64,
    /// Replies rejected by a context predicate
    pub total_rejected: AtomicU64,
    /// Replies for ids with no live entry
    pub total_unknown: AtomicU64,
    /// Handles dropped before completion
    pub total_cancelled: AtomicU64,
}

/// A call waiting for its reply.
struct PendingEntry<T, C> {
    sender: oneshot::Sender<CallOutcome<T>>,
    timer: AbortHandle,
    context: C,
    registered_at: Instant,
    timeout: Duration,
}

struct Inner<T, C> {
    pending: DashMap<CorrelationId, PendingEntry<T, C>>,
    stats: PendingStats,
}

impl<T, C> Inner<T, C> {
    fn expire(&self, id: &CorrelationId) {
        if let Some((_, entry)) = self.pending.remove(id) {
            self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
            debug!(
                correlation_id = %id,
                elapsed_ms = entry.registered_at.elapsed().as_millis() as u64,
                timeout_ms = entry.timeout.as_millis() as u64,
                "Pending call timed out"
            );
            // Receiver may already be gone; nothing else to do then.
            let _ = entry.sender.send(CallOutcome::TimedOut);
        }
    }
}

/// Correlation table of outstanding calls.
///
/// `T` is the reply value; `C` is an opaque context stored with each entry
/// and consulted by [`resolve_if`](Self::resolve_if). Cloning yields another
/// handle to the same table.
pub struct PendingCallRegistry<T, C = ()> {
    inner: Arc<Inner<T, C>>,
}

impl<T, C> Clone for PendingCallRegistry<T, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, C> Default for PendingCallRegistry<T, C>
where
    T: Send + 'static,
    C: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C> PendingCallRegistry<T, C>
where
    T: Send + 'static,
    C: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                pending: DashMap::new(),
                stats: PendingStats::default(),
            }),
        }
    }

    /// Register a call and arm its deadline timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn register(
        &self,
        id: CorrelationId,
        context: C,
        timeout: Duration,
    ) -> Result<PendingCall<T, C>, PendingError> {
        let (tx, rx) = oneshot::channel();

        match self.inner.pending.entry(id) {
            Entry::Occupied(_) => return Err(PendingError::DuplicateId(id)),
            Entry::Vacant(slot) => {
                // Spawned while the shard is locked, so the timer cannot
                // observe the table before the entry exists.
                let weak = Arc::downgrade(&self.inner);
                let timer = tokio::spawn(async move {
                    tokio::time::sleep(timeout).await;
                    if let Some(inner) = weak.upgrade() {
                        inner.expire(&id);
                    }
                })
                .abort_handle();

                slot.insert(PendingEntry {
                    sender: tx,
                    timer,
                    context,
                    registered_at: Instant::now(),
                    timeout,
                });
            }
        }

        self.inner
            .stats
            .total_registered
            .fetch_add(1, Ordering::Relaxed);
        debug!(
            correlation_id = %id,
            timeout_ms = timeout.as_millis() as u64,
            "Registered pending call"
        );

        Ok(PendingCall {
            id,
            receiver: rx,
            registry: Arc::downgrade(&self.inner),
            completed: false,
        })
    }

    /// Complete the live entry for `id` with `value`.
    ///
    /// A missing entry is a logged no-op.
    pub fn resolve(&self, id: &CorrelationId, value: T) -> ResolveOutcome {
        self.resolve_if(id, |_| true, value)
    }

    /// Complete the live entry for `id` only if `accept` approves its context.
    ///
    /// A rejected attempt leaves the entry live, so the genuine reply can
    /// still arrive or the deadline can still fire.
    pub fn resolve_if<F>(&self, id: &CorrelationId, accept: F, value: T) -> ResolveOutcome
    where
        F: FnOnce(&C) -> bool,
    {
        let removed = self
            .inner
            .pending
            .remove_if(id, |_, entry| accept(&entry.context));

        match removed {
            Some((_, entry)) => {
                entry.timer.abort();
                let elapsed = entry.registered_at.elapsed();
                if entry.sender.send(CallOutcome::Resolved(value)).is_ok() {
                    self.inner
                        .stats
                        .total_resolved
                        .fetch_add(1, Ordering::Relaxed);
                    debug!(
                        correlation_id = %id,
                        response_time_ms = elapsed.as_millis() as u64,
                        "Resolved pending call"
                    );
                } else {
                    // Handle was dropped between our remove and send.
                    self.inner
                        .stats
                        .total_cancelled
                        .fetch_add(1, Ordering::Relaxed);
                }
                ResolveOutcome::Resolved
            }
            None if self.inner.pending.contains_key(id) => {
                self.inner
                    .stats
                    .total_rejected
                    .fetch_add(1, Ordering::Relaxed);
                warn!(correlation_id = %id, "Reply rejected for pending call");
                ResolveOutcome::Rejected
            }
            None => {
                self.inner
                    .stats
                    .total_unknown
                    .fetch_add(1, Ordering::Relaxed);
                warn!(
                    correlation_id = %id,
                    "Reply for unknown or expired correlation id"
                );
                ResolveOutcome::Unknown
            }
        }
    }

    /// Number of calls still awaiting a reply or deadline.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    pub fn is_pending(&self, id: &CorrelationId) -> bool {
        self.inner.pending.contains_key(id)
    }

    pub fn stats(&self) -> &PendingStats {
        &self.inner.stats
    }
}

/// Handle to a registered call. Resolves to the call's [`CallOutcome`].
pub struct PendingCall<T, C = ()> {
    id: CorrelationId,
    receiver: oneshot::Receiver<CallOutcome<T>>,
    registry: Weak<Inner<T, C>>,
    completed: bool,
}

impl<T, C> PendingCall<T, C> {
    pub fn id(&self) -> CorrelationId {
        self.id
    }
}

impl<T, C> Future for PendingCall<T, C> {
    type Output = CallOutcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(result) => {
                self.completed = true;
                // Sender dropped without sending: the registry is gone.
                Poll::Ready(result.unwrap_or(CallOutcome::TimedOut))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T, C> Drop for PendingCall<T, C> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        if let Some(inner) = self.registry.upgrade() {
            if let Some((_, entry)) = inner.pending.remove(&self.id) {
                entry.timer.abort();
                inner.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(correlation_id = %self.id, "Pending call cancelled");
            }
        }
    }
}
