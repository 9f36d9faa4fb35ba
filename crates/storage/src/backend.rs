//! Backend adapter trait
//!
//! The store persists its whole collection under one key of a synchronous
//! key-value byte store. This trait is the narrow capability it depends on.
//! Implementations catch every platform failure (I/O errors, permission
//! problems, size limits) and translate it into a [`BackendError`]; nothing
//! above this layer observes platform-specific errors.

use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Key used by [`Backend::probe`] implementations for their throwaway write
pub const PROBE_KEY: &str = "__stencil_probe__";

/// Result type alias for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Synchronous key-value byte store
///
/// All calls block until complete. There is no suspension and no batching:
/// every write replaces the value under its key in full.
///
/// # Thread Safety
///
/// Backends must be `Send + Sync`; they lock internally per call. Callers get
/// no cross-call atomicity (read-then-write from two writers is last-writer-wins).
pub trait Backend: Send + Sync {
    /// Check that the backend accepts writes
    ///
    /// Attempts a throwaway write and delete. Returns `false` on any failure
    /// (disabled storage, permissions, full quota); leaves no trace on success.
    fn probe(&self) -> bool;

    /// Read the bytes stored under `key`, `None` if absent
    fn read(&self, key: &str) -> BackendResult<Option<Vec<u8>>>;

    /// Replace the bytes stored under `key`
    ///
    /// # Errors
    ///
    /// - `QuotaExceeded` if the write would exceed the backend's size limit
    /// - `Unavailable` if the backend refuses access
    fn write(&self, key: &str, bytes: &[u8]) -> BackendResult<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> BackendResult<()>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn probe(&self) -> bool {
        (**self).probe()
    }

    fn read(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> BackendResult<()> {
        (**self).write(key, bytes)
    }

    fn remove(&self, key: &str) -> BackendResult<()> {
        (**self).remove(key)
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn probe(&self) -> bool {
        (**self).probe()
    }

    fn read(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, bytes: &[u8]) -> BackendResult<()> {
        (**self).write(key, bytes)
    }

    fn remove(&self, key: &str) -> BackendResult<()> {
        (**self).remove(key)
    }
}

/// Typed backend failures
#[derive(Debug, Error)]
pub enum BackendError {
    /// Write rejected because it would exceed the size limit
    #[error("Quota exceeded: {required} bytes required, limit is {limit}")]
    QuotaExceeded {
        /// Bytes the backend would hold after the write
        required: u64,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Backend disabled, missing, or access denied
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Any other I/O failure
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl BackendError {
    /// True if the failure is a size-limit rejection
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, BackendError::QuotaExceeded { .. })
    }

    /// Classify an I/O error from a platform store
    ///
    /// Permission and missing-location failures mean the store is unusable
    /// rather than that a single operation failed.
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound => {
                BackendError::Unavailable(err.to_string())
            }
            _ => BackendError::IoError(err),
        }
    }
}
