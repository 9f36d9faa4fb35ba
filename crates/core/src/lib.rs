//! Core types for Stencil
//!
//! This crate defines the foundational types used throughout the system:
//! - Template: the record model (ids, closed enumerations, drafts, patches)
//! - Envelope: the versioned wrapper persisted as one unit
//! - Timestamps: lenient ISO 8601 reading, RFC 3339 writing
//! - Validator: strict acceptance test for external template JSON
//! - StoreError: the failure kinds every store operation surfaces

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod envelope;
pub mod error;
pub mod template;
pub mod timestamp;
pub mod validate;

pub use envelope::{Envelope, StorageInfo, CURRENT_VERSION};
pub use error::{BoxedCause, Result, StoreError};
pub use template::{
    Frequency, Priority, Recurrence, TaskDraft, Template, TemplateCategory, TemplateDraft,
    TemplateId, TemplatePatch,
};
pub use timestamp::parse_timestamp;
pub use validate::{
    check_envelope, check_record, check_records, check_templates, validate_envelope,
    validate_record, InvalidRecords, Violation,
};
