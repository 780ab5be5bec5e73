//! # Ports Layer
//!
//! - **Outbound (Driven)**: how a website is actually checked

pub mod outbound;
