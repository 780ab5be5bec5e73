//! Live validator connections.
//!
//! One entry per connection that completed a signed signup. Entries are keyed
//! by [`ConnectionId`]; the same validator may be present on several
//! connections at once, and each receives its own checks.

use parking_lot::RwLock;
use shared_types::ValidatorId;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use um_01_protocol::HubMessage;

/// Hub-local id of one accepted WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outbound side of one connection.
///
/// Messages are queued to the connection's writer task. A full queue makes
/// the sender wait for room, up to a deadline.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: mpsc::Sender<HubMessage>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, sender: mpsc::Sender<HubMessage>) -> Self {
        Self { id, sender }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a message, waiting at most `within` for queue space. Returns
    /// `false` if the connection closed or stayed full.
    pub async fn send(&self, message: HubMessage, within: Duration) -> bool {
        matches!(
            tokio::time::timeout(within, self.sender.send(message)).await,
            Ok(Ok(()))
        )
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// A signed-up validator reachable on a specific connection.
#[derive(Debug, Clone)]
pub struct RegisteredValidator {
    pub validator_id: ValidatorId,
    /// Hex public key proven at signup; replies on this connection are
    /// verified against it.
    pub public_key: String,
    pub connection: ConnectionHandle,
}

/// Connection-keyed table of active validators.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    entries: RwLock<HashMap<ConnectionId, RegisteredValidator>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh the entry for the validator's connection.
    ///
    /// Returns the previous entry on that connection, if any.
    pub fn insert(&self, validator: RegisteredValidator) -> Option<RegisteredValidator> {
        self.entries
            .write()
            .insert(validator.connection.id(), validator)
    }

    /// Drop the entry for a closed connection.
    pub fn remove(&self, connection_id: ConnectionId) -> Option<RegisteredValidator> {
        self.entries.write().remove(&connection_id)
    }

    pub fn get(&self, connection_id: ConnectionId) -> Option<RegisteredValidator> {
        self.entries.read().get(&connection_id).cloned()
    }

    /// Point-in-time copy used to plan a round.
    pub fn snapshot(&self) -> Vec<RegisteredValidator> {
        let mut validators: Vec<_> = self.entries.read().values().cloned().collect();
        validators.sort_by_key(|v| v.connection.id());
        validators
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(conn: u64, validator: &str) -> (RegisteredValidator, mpsc::Receiver<HubMessage>) {
        let (tx, rx) = mpsc::channel(4);
        (
            RegisteredValidator {
                validator_id: ValidatorId::new(validator),
                public_key: format!("pk-{validator}"),
                connection: ConnectionHandle::new(ConnectionId::new(conn), tx),
            },
            rx,
        )
    }

    #[test]
    fn test_insert_replaces_same_connection() {
        let registry = ValidatorRegistry::new();
        let (first, _rx1) = entry(1, "v-1");
        let (second, _rx2) = entry(1, "v-2");

        assert!(registry.insert(first).is_none());
        let previous = registry.insert(second).unwrap();

        assert_eq!(previous.validator_id.as_str(), "v-1");
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get(ConnectionId::new(1)).unwrap().validator_id.as_str(),
            "v-2"
        );
    }

    #[test]
    fn test_same_validator_on_two_connections() {
        let registry = ValidatorRegistry::new();
        let (a, _rx1) = entry(1, "v-1");
        let (b, _rx2) = entry(2, "v-1");
        registry.insert(a);
        registry.insert(b);

        assert_eq!(registry.len(), 2);
        let ids: Vec<_> = registry
            .snapshot()
            .iter()
            .map(|v| v.connection.id().as_u64())
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_remove_by_connection() {
        let registry = ValidatorRegistry::new();
        let (a, _rx) = entry(7, "v-7");
        registry.insert(a);

        assert!(registry.remove(ConnectionId::new(7)).is_some());
        assert!(registry.remove(ConnectionId::new(7)).is_none());
        assert!(registry.is_empty());
    }

    fn ack(validator: &str) -> HubMessage {
        HubMessage::Signup(um_01_protocol::SignupAck {
            validator_id: ValidatorId::new(validator),
            callback_id: shared_types::CorrelationId::new(),
        })
    }

    #[tokio::test]
    async fn test_send_fails_after_receiver_dropped() {
        let (a, rx) = entry(1, "v-1");
        drop(rx);
        assert!(a.connection.is_closed());
        assert!(!a.connection.send(ack("v-1"), Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_send_waits_for_queue_space() {
        let (a, mut rx) = entry(1, "v-1");
        for _ in 0..4 {
            assert!(a.connection.send(ack("v-1"), Duration::from_secs(1)).await);
        }

        let drain = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let mut received = 0;
            while rx.recv().await.is_some() {
                received += 1;
            }
            received
        });

        assert!(a.connection.send(ack("v-1"), Duration::from_secs(5)).await);
        drop(a);
        assert_eq!(drain.await.unwrap(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_gives_up_when_queue_stays_full() {
        let (a, _rx) = entry(1, "v-1");
        for _ in 0..4 {
            assert!(a.connection.send(ack("v-1"), Duration::from_secs(1)).await);
        }

        let started = tokio::time::Instant::now();
        assert!(!a.connection.send(ack("v-1"), Duration::from_secs(2)).await);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }
}
