//! In-memory [`MonitorStore`] used by the standalone hub binary and tests.

use crate::ports::outbound::{MonitorStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shared_types::{Tick, Validator, ValidatorId, Website, WebsiteId};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Default)]
struct StoreState {
    websites: Vec<Website>,
    validators: HashMap<ValidatorId, Validator>,
    by_public_key: HashMap<String, ValidatorId>,
    ticks: Vec<Tick>,
    tick_keys: HashSet<(WebsiteId, ValidatorId, DateTime<Utc>)>,
}

/// Process-local store. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start monitoring a URL. Returns the new website.
    pub fn add_website(&self, url: impl Into<String>) -> Website {
        let website = Website::new(url);
        self.state.write().websites.push(website.clone());
        website
    }

    /// Stop checking a website without deleting it.
    pub fn set_website_disabled(&self, id: &WebsiteId, disabled: bool) -> bool {
        let mut state = self.state.write();
        match state.websites.iter_mut().find(|w| &w.id == id) {
            Some(website) => {
                website.disabled = disabled;
                true
            }
            None => false,
        }
    }

    pub fn websites(&self) -> Vec<Website> {
        self.state.read().websites.clone()
    }

    pub fn validator(&self, id: &ValidatorId) -> Option<Validator> {
        self.state.read().validators.get(id).cloned()
    }

    pub fn validator_by_public_key(&self, public_key: &str) -> Option<Validator> {
        let state = self.state.read();
        state
            .by_public_key
            .get(public_key)
            .and_then(|id| state.validators.get(id))
            .cloned()
    }

    pub fn validator_count(&self) -> usize {
        self.state.read().validators.len()
    }

    /// All ticks written so far, in write order.
    pub fn ticks(&self) -> Vec<Tick> {
        self.state.read().ticks.clone()
    }
}

#[async_trait]
impl MonitorStore for InMemoryStore {
    async fn list_active_websites(&self) -> Result<Vec<Website>, StoreError> {
        Ok(self
            .state
            .read()
            .websites
            .iter()
            .filter(|w| !w.disabled)
            .cloned()
            .collect())
    }

    async fn upsert_validator_by_public_key(
        &self,
        public_key: &str,
        ip: &str,
        location: &str,
    ) -> Result<Validator, StoreError> {
        let mut state = self.state.write();
        if let Some(existing) = state
            .by_public_key
            .get(public_key)
            .and_then(|id| state.validators.get(id))
        {
            return Ok(existing.clone());
        }

        let validator = Validator {
            id: ValidatorId::generate(),
            public_key: public_key.to_string(),
            ip: ip.to_string(),
            location: location.to_string(),
            pending_payouts: 0,
        };
        state
            .by_public_key
            .insert(public_key.to_string(), validator.id.clone());
        state
            .validators
            .insert(validator.id.clone(), validator.clone());
        debug!(validator_id = %validator.id, "Created validator record");
        Ok(validator)
    }

    async fn append_ticks_batch(&self, ticks: Vec<Tick>) -> Result<usize, StoreError> {
        let mut state = self.state.write();
        let mut written = 0;
        for tick in ticks {
            if state.tick_keys.insert(tick.dedup_key()) {
                state.ticks.push(tick);
                written += 1;
            }
        }
        Ok(written)
    }

    async fn increment_validator_payout(
        &self,
        validator_id: &ValidatorId,
        amount: u64,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write();
        let validator = state
            .validators
            .get_mut(validator_id)
            .ok_or_else(|| StoreError::ValidatorNotFound(validator_id.clone()))?;
        validator.pending_payouts = validator.pending_payouts.saturating_add(amount);
        Ok(())
    }
}
