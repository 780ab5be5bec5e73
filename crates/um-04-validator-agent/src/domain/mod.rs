//! Agent domain: configuration, connection state machine and errors.

pub mod config;
pub mod errors;
pub mod state;
