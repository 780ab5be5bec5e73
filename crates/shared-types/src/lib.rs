//! # Shared Types Crate
//!
//! Domain entities shared by every Uptime-Mesh crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Entities crossing a crate boundary live here.
//! - **Public Key Is Identity**: A validator is identified durably by its
//!   Ed25519 public key; `ValidatorId` is the record id the store assigns to it.
//! - **Append-Only Ticks**: A `Tick` is never mutated after it is produced.

pub mod correlation;
pub mod entities;
pub mod errors;

pub use correlation::CorrelationId;
pub use entities::*;
pub use errors::*;
