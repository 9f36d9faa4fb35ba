//! Error types for the template store
//!
//! This module defines the failure kinds surfaced by every store operation.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! Validation failures and backend failures are always distinct variants, so a
//! caller can tell "your data was rejected" apart from "the storage refused".

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Boxed cause carried by [`StoreError::UnknownError`]
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for the template store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend probe failed (permissions, disabled storage, private browsing)
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Persisted or imported bytes are not well-formed JSON
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Well-formed data that fails the record/envelope validator
    #[error("Validation error: {invalid} invalid record(s): {reason}")]
    ValidationError {
        /// Number of records that failed validation (0 for envelope-level failures)
        invalid: usize,
        /// First violation found, for diagnostics
        reason: String,
    },

    /// Backend rejected a write due to size limits
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Any other backend failure, wrapping the original cause
    #[error("Unknown storage error: {source}")]
    UnknownError {
        /// The underlying failure
        #[source]
        source: BoxedCause,
    },

    /// Stored envelope changed since the caller last observed it
    #[error("Version conflict: expected envelope updated at {expected}, found {actual}")]
    VersionConflict {
        /// Envelope timestamp the caller expected
        expected: String,
        /// Envelope timestamp actually stored (empty if nothing stored)
        actual: String,
    },

    /// Configuration file missing fields or holding invalid values
    #[error("Config error: {0}")]
    ConfigError(String),
}

impl StoreError {
    /// Build a validation error
    pub fn validation(invalid: usize, reason: impl Into<String>) -> Self {
        StoreError::ValidationError {
            invalid,
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary backend failure
    pub fn unknown(source: impl Into<BoxedCause>) -> Self {
        StoreError::UnknownError {
            source: source.into(),
        }
    }

    /// True for failures caused by the data rather than the backend
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::ValidationError { .. })
    }

    /// Stable short name of the failure kind, for logs and caller-side messages
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::StorageUnavailable(_) => "StorageUnavailable",
            StoreError::ParseError(_) => "ParseError",
            StoreError::ValidationError { .. } => "ValidationError",
            StoreError::QuotaExceeded(_) => "QuotaExceeded",
            StoreError::UnknownError { .. } => "UnknownError",
            StoreError::VersionConflict { .. } => "VersionConflict",
            StoreError::ConfigError(_) => "ConfigError",
        }
    }
}
