//! Adapters: the in-memory persistence collaborator and the WebSocket transport.

pub mod memory_store;
pub mod websocket;
