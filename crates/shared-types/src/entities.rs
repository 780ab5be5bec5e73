//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `ValidatorId`, `Validator`
//! - **Monitoring**: `WebsiteId`, `Website`
//! - **Results**: `TickStatus`, `Tick`

use crate::errors::EntityError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Record id assigned to a validator by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorId(String);

impl ValidatorId {
    /// Wrap an existing id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validator node known to the hub.
///
/// Created on the first successful signup from a public key and reused by
/// every later signup from the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Validator {
    /// Store-assigned record id.
    pub id: ValidatorId,
    /// Hex-encoded Ed25519 public key (unique, the durable identity).
    pub public_key: String,
    /// IP address the validator advertised at signup.
    pub ip: String,
    /// Free-form location label.
    pub location: String,
    /// Accrued, unsettled payout (lamports). Never decreases in this system.
    pub pending_payouts: u64,
}

impl Validator {
    /// Location recorded when the validator does not report one.
    pub const UNKNOWN_LOCATION: &'static str = "unknown";
}

// =============================================================================
// CLUSTER B: MONITORING
// =============================================================================

/// Record id of a monitored website (owned by the CRUD collaborator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WebsiteId(String);

impl WebsiteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WebsiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A monitored website. The hub only reads `id` and `url` of enabled sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub id: WebsiteId,
    pub url: String,
    #[serde(default)]
    pub disabled: bool,
}

impl Website {
    /// Create an enabled website with a fresh id.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: WebsiteId::generate(),
            url: url.into(),
            disabled: false,
        }
    }
}

// =============================================================================
// CLUSTER C: RESULTS
// =============================================================================

/// Outcome of a single website check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TickStatus {
    /// The site answered with HTTP 200.
    Good,
    /// Any other status code, a probe error, or no reply at all.
    Bad,
}

impl TickStatus {
    /// Classify an HTTP status code. Only an exact 200 is `Good`.
    pub fn from_http_status(code: u16) -> Self {
        if code == 200 {
            TickStatus::Good
        } else {
            TickStatus::Bad
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TickStatus::Good => "Good",
            TickStatus::Bad => "Bad",
        }
    }
}

impl fmt::Display for TickStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TickStatus {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Good" => Ok(TickStatus::Good),
            "Bad" => Ok(TickStatus::Bad),
            other => Err(EntityError::UnknownStatus(other.to_string())),
        }
    }
}

/// One recorded outcome of a (website, validator) check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tick {
    pub website_id: WebsiteId,
    pub validator_id: ValidatorId,
    pub status: TickStatus,
    pub latency_ms: u64,
    pub observed_at: DateTime<Utc>,
    /// `true` only for a signed, on-time reply from the dispatched validator.
    /// Synthesized timeouts are always `false`.
    pub verified: bool,
}

impl Tick {
    /// Key used by stores to skip duplicate ticks.
    pub fn dedup_key(&self) -> (WebsiteId, ValidatorId, DateTime<Utc>) {
        (
            self.website_id.clone(),
            self.validator_id.clone(),
            self.observed_at,
        )
    }
}
