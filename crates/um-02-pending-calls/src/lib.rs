//! # Pending-Call Registry (UM-02)
//!
//! Correlation table mapping a request id to a waiting caller and a deadline.
//!
//! ```text
//!   register(id, ctx, timeout) ──▶ PendingCall (future)
//!          │                            ▲
//!          ├── resolve(id, value) ──────┤  Resolved(value)
//!          └── deadline timer fires ────┘  TimedOut
//! ```
//!
//! ## Invariants
//!
//! - Exactly one completion per id: whichever of reply or deadline removes
//!   the entry first wins; the other finds nothing and is a no-op.
//! - At most one live entry per id; registering a live id is an error.
//! - No entry or timer outlives its resolution. Dropping a handle before it
//!   completes cancels the entry and aborts its timer.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod registry;

pub use registry::{
    CallOutcome, PendingCall, PendingCallRegistry, PendingError, PendingStats, ResolveOutcome,
};
