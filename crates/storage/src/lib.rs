//! Storage layer for Stencil
//!
//! This crate implements the backend adapter the template store persists through:
//! - Backend: synchronous key-value byte store trait (probe, read, write, remove)
//! - BackendError: typed translation of platform failures (quota, unavailable, I/O)
//! - InMemoryBackend: `parking_lot::RwLock` map with quota and availability switch
//! - FileBackend: one file per key, atomic write-fsync-rename, optional byte limit

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod file;
pub mod memory;

pub use backend::{Backend, BackendError, BackendResult, PROBE_KEY};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
