//! Template store engine for Stencil
//!
//! This crate orchestrates the lower layers:
//! - TemplateStore: load / save / CRUD / import / export over a backend
//! - Migration: version check and upgrade of stored envelopes
//! - Recovery: what to do when stored bytes are corrupt
//! - Config: `stencil.toml` for file-backed stores
//!
//! The engine is the only component that knows about:
//! - The storage key and envelope layout
//! - Validation before every write
//! - Time (through [`Clock`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod import;
pub mod migration;
pub mod recovery;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{StencilConfig, CONFIG_FILE_NAME, DEFAULT_IMPORT_SUFFIX, DEFAULT_STORAGE_KEY};
pub use import::{
    append_records, merge_records, reidentify_duplicates, ImportMode, ImportReport,
};
pub use migration::{compare_versions, MigrationPolicy, VersionBump};
pub use recovery::{Corruption, CorruptionPolicy};
pub use store::TemplateStore;
