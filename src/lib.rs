//! Stencil - Versioned, validated local store for reusable task templates
//!
//! A template is a named blueprint from which tasks are instantiated. Stencil
//! persists the whole collection as one versioned envelope under one key of a
//! key-value backend, validates every record on the way in and out, and
//! migrates old envelopes on read.
//!
//! # Quick Start
//!
//! ```ignore
//! use stencil::{TemplateStore, TemplateDraft, TemplateCategory, ImportMode};
//!
//! // In-memory store (tests, previews)
//! let store = TemplateStore::ephemeral();
//!
//! let t = store.create(TemplateDraft::new("Weekly Report", "Write report", TemplateCategory::Work))?;
//! let task = store.use_template(&t.id)?;
//!
//! // Move templates between stores
//! let json = store.export_json()?;
//! TemplateStore::open("./templates")?.import_json(&json, ImportMode::Merge)?;
//! ```
//!
//! # Architecture
//!
//! - `stencil-core`: record model, envelope, validator, error kinds
//! - `stencil-storage`: backend trait with in-memory and file implementations
//! - `stencil-engine`: the store, migration, corruption recovery, config

pub use stencil_core::*;
pub use stencil_engine::*;
pub use stencil_storage::*;
