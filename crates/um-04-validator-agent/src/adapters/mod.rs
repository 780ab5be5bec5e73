//! Adapters for the agent's outbound ports.

pub mod http_prober;
