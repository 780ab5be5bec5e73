//! # UM-03 Hub - Validator Coordinator
//!
//! Registers validators over WebSocket, fans out a check for every
//! (website, validator) pair each round, collects replies with a hard
//! timeout, then persists the round's ticks in one batch and accrues payouts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          HUB (um-03)                              │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  WebSocket transport (axum)  ── one task pair per connection      │
//! │            │ frames                      ▲ HubMessage             │
//! │            ▼                             │                        │
//! │  ┌────────────────────────────────────────────────────────────┐  │
//! │  │ HubService                                                  │  │
//! │  │   signup ─▶ verify ─▶ store.upsert ─▶ ValidatorRegistry     │  │
//! │  │   reply  ─▶ verify ─▶ PendingCallRegistry.resolve_if        │  │
//! │  │   round  ─▶ fan-out ─▶ join_all ─▶ ticks + payouts ─▶ store │  │
//! │  └────────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────┬───────────────────────────────┘
//!                                    │ MonitorStore port
//!                         persistence collaborator
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use um_03_hub::{HubConfig, HubServer, InMemoryStore};
//!
//! let store = Arc::new(InMemoryStore::new());
//! let server = HubServer::bind(HubConfig::default(), store).await?;
//! server.run(shutdown_rx).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::memory_store::InMemoryStore;
pub use adapters::websocket::{router, HubServer};
pub use domain::config::{ConfigError, HubConfig, PayoutPolicy};
pub use domain::errors::HubError;
pub use domain::round::{CheckReply, PairOutcome, RoundReport};
pub use domain::validator_registry::{
    ConnectionHandle, ConnectionId, RegisteredValidator, ValidatorRegistry,
};
pub use ports::outbound::{MonitorStore, StoreError};
pub use service::{HubService, ReplyDisposition};
