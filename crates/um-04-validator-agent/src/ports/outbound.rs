//! Outbound Ports (Driven Ports)

use async_trait::async_trait;
use shared_types::TickStatus;

/// Outcome of checking one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub status: TickStatus,
    pub latency_ms: u64,
}

impl ProbeResult {
    pub fn good(latency_ms: u64) -> Self {
        Self {
            status: TickStatus::Good,
            latency_ms,
        }
    }

    pub fn bad(latency_ms: u64) -> Self {
        Self {
            status: TickStatus::Bad,
            latency_ms,
        }
    }
}

/// Checks a website (Driven Port).
///
/// Never fails: every problem is folded into a `Bad` result.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeResult;
}
