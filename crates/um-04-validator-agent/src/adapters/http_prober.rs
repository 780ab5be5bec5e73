//! HTTP GET prober.
//!
//! `Good` only for an exact 200. Any other status is `Bad` with the measured
//! latency; a failed request (DNS, refused, TLS, timeout) is `Bad` with the
//! configured failure latency.

use crate::ports::outbound::{ProbeResult, Prober};
use async_trait::async_trait;
use shared_types::TickStatus;
use std::time::{Duration, Instant};
use tracing::debug;

/// Probes websites with a plain GET request.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    failure_latency_ms: u64,
}

impl HttpProber {
    pub fn new(timeout: Duration, failure_latency_ms: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            failure_latency_ms,
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeResult {
        let started = Instant::now();
        match self.client.get(url).send().await {
            Ok(response) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let code = response.status().as_u16();
                debug!(url, code, latency_ms, "Probe answered");
                ProbeResult {
                    status: TickStatus::from_http_status(code),
                    latency_ms,
                }
            }
            Err(e) => {
                debug!(url, error = %e, "Probe failed");
                ProbeResult::bad(self.failure_latency_ms)
            }
        }
    }
}
