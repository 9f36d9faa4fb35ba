//! Import modes and merge rules
//!
//! Import never silently overwrites existing records unless the caller asks for
//! [`ImportMode::ReplaceAll`]:
//!
//! | Mode | Existing records | Incoming records |
//! |------|------------------|------------------|
//! | `ReplaceAll` | discarded | kept verbatim; repeated ids after the first get a fresh id |
//! | `Merge` | kept | kept; on id collision: fresh id, name suffix, fresh `updatedAt` |
//! | `Append` (default) | kept | every record: fresh id, fresh `createdAt`/`updatedAt` |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use stencil_core::{Template, TemplateId};

/// How an import combines incoming records with the stored collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportMode {
    /// Replace the stored collection with the incoming records
    ReplaceAll,
    /// Union, re-identifying incoming records whose id is already stored
    Merge,
    /// Append every incoming record under a fresh id
    #[default]
    Append,
}

/// Outcome of an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Mode the import ran in
    pub mode: ImportMode,
    /// Number of incoming records written
    pub imported: usize,
    /// Incoming records that received a new id
    pub reidentified: usize,
    /// Size of the collection after the import
    pub total: usize,
}

/// Union `incoming` into `existing`, renaming id collisions
///
/// Returns the merged collection and the number of re-identified records.
pub fn merge_records(
    mut existing: Vec<Template>,
    incoming: Vec<Template>,
    suffix: &str,
    now: DateTime<Utc>,
) -> (Vec<Template>, usize) {
    let mut taken: HashSet<TemplateId> = existing.iter().map(|t| t.id.clone()).collect();
    let mut reidentified = 0;

    existing.reserve(incoming.len());
    for mut record in incoming {
        if taken.contains(&record.id) {
            record.id = fresh_id(&taken);
            record.name.push_str(suffix);
            record.touch(now);
            reidentified += 1;
        }
        taken.insert(record.id.clone());
        existing.push(record);
    }

    (existing, reidentified)
}

/// Append every incoming record under a fresh id and fresh timestamps
pub fn append_records(
    mut existing: Vec<Template>,
    incoming: Vec<Template>,
    now: DateTime<Utc>,
) -> Vec<Template> {
    let mut taken: HashSet<TemplateId> = existing.iter().map(|t| t.id.clone()).collect();

    existing.reserve(incoming.len());
    for mut record in incoming {
        record.id = fresh_id(&taken);
        record.created_at = now;
        record.updated_at = now;
        taken.insert(record.id.clone());
        existing.push(record);
    }

    existing
}

/// Give every repeated id after its first occurrence a fresh id
///
/// Returns the number of records re-identified. Nothing else about the
/// records changes.
pub fn reidentify_duplicates(records: &mut [Template]) -> usize {
    let mut taken: HashSet<TemplateId> = records.iter().map(|t| t.id.clone()).collect();
    let mut seen = HashSet::with_capacity(records.len());
    let mut reidentified = 0;

    for record in records.iter_mut() {
        if !seen.insert(record.id.clone()) {
            record.id = fresh_id(&taken);
            taken.insert(record.id.clone());
            seen.insert(record.id.clone());
            reidentified += 1;
        }
    }

    reidentified
}

fn fresh_id(taken: &HashSet<TemplateId>) -> TemplateId {
    loop {
        let id = TemplateId::generate();
        if !taken.contains(&id) {
            return id;
        }
    }
}
