//! # Uptime-Mesh Test Suite
//!
//! Cross-crate scenarios that run a real hub on an ephemeral port.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs      # hub, probe target and raw validator helpers
//!     ├── e2e_rounds.rs   # real agent against real hub
//!     └── adversarial.rs  # forged, silent and misbehaving validators
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p um-tests
//! cargo test -p um-tests integration::adversarial::
//! ```
//!
//! Rounds are driven explicitly with `round_once`; the scheduled interval is
//! set far beyond the test duration.

#![allow(dead_code)]

pub mod integration;
