//! # Ports Layer
//!
//! - **Outbound (Driven)**: the persistence collaborator the hub depends on

pub mod outbound;
