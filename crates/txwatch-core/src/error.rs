//! Error types for the txwatch pipeline.

use thiserror::Error;

/// Errors that can occur while scanning, storing, or querying.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid hex quantity: {0}")]
    InvalidQuantity(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl IndexError {
    /// Returns `true` if the error means "no such block / no such key".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns `true` if retrying the same request may succeed.
    ///
    /// A block that is not there yet (the scanner caught up with the head)
    /// is retryable as well, and so is a garbled quantity in a node reply.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::NotFound(_) | Self::InvalidQuantity(_))
    }
}
