//! Error types for quake-inventory

use thiserror::Error;

use crate::types::ResourceKind;

/// Errors raised while fetching inventory from the remote system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network-level failure (connect, reset, timeout on the wire)
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote rejected the credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Remote answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Body returned by the remote
        message: String,
    },

    /// Payload could not be decoded
    #[error("malformed inventory payload: {0}")]
    Decode(String),

    /// The caller cancelled the fetch
    #[error("inventory fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Check if error is retryable
    ///
    /// Only a hint for callers; the cache itself never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// Errors that can occur while reading or querying the inventory
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Underlying fetch failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A filter names an attribute the queried kind does not have
    #[error("invalid filter: {kind} has no attribute `{attribute}`")]
    InvalidFilter {
        /// Kind being queried
        kind: ResourceKind,
        /// Offending attribute name
        attribute: String,
    },

    /// A glob value could not be compiled
    #[error("invalid pattern `{pattern}` for `{attribute}`: {reason}")]
    InvalidPattern {
        /// Attribute the pattern applies to
        attribute: String,
        /// Pattern text
        pattern: String,
        /// Parser message
        reason: String,
    },

    /// Filter text could not be parsed
    #[error("malformed filter: {0}")]
    MalformedFilter(String),

    /// Unknown resource kind name
    #[error("unknown resource kind: {0}")]
    UnknownKind(String),

    /// The cache was read before its first successful refresh
    #[error("inventory has not been fetched yet")]
    Uninitialized,
}

impl InventoryError {
    /// Check if the error was caused by the caller's query rather than the remote
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            InventoryError::InvalidFilter { .. }
                | InventoryError::InvalidPattern { .. }
                | InventoryError::MalformedFilter(_)
                | InventoryError::UnknownKind(_)
        )
    }
}
