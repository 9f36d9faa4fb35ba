//! Versioned envelope around the full template collection
//!
//! The envelope, not the individual record, is the unit of persistence and of
//! validation-on-read. It is rewritten as a whole on every mutation.
//!
//! ```text
//! {
//!   "version": "1.0.0",
//!   "records": [ { ...Template... }, ... ],
//!   "updatedAt": "2024-03-01T09:30:00Z"
//! }
//! ```

use crate::template::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version written by this build
pub const CURRENT_VERSION: &str = "1.0.0";

/// Versioned wrapper persisted as a single unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Schema version of `records`
    pub version: String,
    /// The whole collection
    pub records: Vec<Template>,
    /// When the envelope was last written
    #[serde(deserialize_with = "crate::timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

impl Envelope {
    /// Wrap records in an envelope of `version` stamped `now`
    pub fn new(version: impl Into<String>, records: Vec<Template>, now: DateTime<Utc>) -> Self {
        Envelope {
            version: version.into(),
            records,
            updated_at: now,
        }
    }
}

/// Advisory snapshot of what is persisted
///
/// Returned by the store's diagnostic call, which never fails: on any problem
/// the default (zero counts, current version, no timestamp) is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    /// Number of persisted records
    pub count: usize,
    /// Byte length of the persisted envelope
    pub size: usize,
    /// Schema version of the persisted envelope
    pub version: String,
    /// Envelope `updatedAt`, if anything is persisted
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for StorageInfo {
    fn default() -> Self {
        StorageInfo {
            count: 0,
            size: 0,
            version: CURRENT_VERSION.to_string(),
            last_updated: None,
        }
    }
}
