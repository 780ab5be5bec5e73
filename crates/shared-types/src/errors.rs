//! # Error Types
//!
//! Errors raised while parsing shared entity values.

use thiserror::Error;

/// Errors that can occur when building entities from untrusted input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EntityError {
    /// Tick status string is neither `Good` nor `Bad`.
    #[error("Unknown tick status: {0}")]
    UnknownStatus(String),
}
