//! # UM-04 Validator Agent
//!
//! Client side of the uptime protocol. Connects to the hub, proves its
//! identity with an Ed25519 signature, then checks whatever websites the hub
//! asks about and signs each answer.
//!
//! ```text
//!   ┌──────────────────────────── ValidatorAgent ────────────────────────────┐
//!   │  socket task ── signup ──▶ hub                                          │
//!   │      │  ◀── ack ───────── (pending-call registry, signup timeout)      │
//!   │      │  ◀── validate ──┐                                                │
//!   │      │                 └─▶ spawned probe ─▶ Prober (HTTP GET)           │
//!   │      └◀── signed reply queue ◀──────────────┘                           │
//!   └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::http_prober::HttpProber;
pub use domain::config::{AgentConfig, ConfigError};
pub use domain::errors::AgentError;
pub use domain::state::{AgentEvent, AgentState};
pub use ports::outbound::{ProbeResult, Prober};
pub use service::{SessionEnd, ValidatorAgent};
