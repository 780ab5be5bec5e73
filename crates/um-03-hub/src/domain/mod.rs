//! Domain layer for the hub.
//!
//! Pure state and decision logic; no sockets and no persistence here.

pub mod config;
pub mod errors;
pub mod round;
pub mod validator_registry;
