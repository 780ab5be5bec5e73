//! Outbound Ports (Driven Ports)
//!
//! The persistence collaborator the hub needs. Schema and storage engine are
//! up to the implementor; the hub only relies on the operations below.

use async_trait::async_trait;
use shared_types::{Tick, Validator, ValidatorId, Website};
use thiserror::Error;

/// Persistence failures. The hub logs these and carries on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Validator not found: {0}")]
    ValidatorNotFound(ValidatorId),

    #[error("Write rejected: {0}")]
    WriteRejected(String),
}

/// Persistence collaborator (Driven Port).
#[async_trait]
pub trait MonitorStore: Send + Sync {
    /// Websites that should be checked this round.
    async fn list_active_websites(&self) -> Result<Vec<Website>, StoreError>;

    /// Return the validator for `public_key`, creating it on first sight.
    ///
    /// Idempotent: the same key always maps to the same validator id.
    async fn upsert_validator_by_public_key(
        &self,
        public_key: &str,
        ip: &str,
        location: &str,
    ) -> Result<Validator, StoreError>;

    /// Append a round's ticks in one batch, skipping duplicates.
    ///
    /// Returns the number of ticks actually written.
    async fn append_ticks_batch(&self, ticks: Vec<Tick>) -> Result<usize, StoreError>;

    /// Add `amount` to a validator's pending payouts.
    async fn increment_validator_payout(
        &self,
        validator_id: &ValidatorId,
        amount: u64,
    ) -> Result<(), StoreError>;
}
