//! Runtime validator for external template JSON
//!
//! The typed model in [`crate::template`] is how the store works with records;
//! this module is the acceptance test for JSON that arrives from outside the
//! type system (persisted bytes, imports). It is strict: a record either fully
//! satisfies the shape or is rejected. There is no lenient mode.
//!
//! ## Record rules
//!
//! | Field | Rule |
//! |-------|------|
//! | `id` | non-empty string |
//! | `name`, `description`, `taskTitle`, `taskDescription` | string |
//! | `category` | string in the closed category set |
//! | `priority` | absent, `null`, or string in the closed priority set |
//! | `labels` | array of strings |
//! | `dueDate` | present, `null` or string |
//! | `recurrence` | absent, `null`, or a valid recurrence object |
//! | `createdAt`, `updatedAt` | ISO 8601 timestamp string; no offset means UTC |
//! | `usageCount` | non-negative integer |
//! | `isFavorite` | boolean |
//! | `boardId`, `columnId` | absent, `null`, or string |
//!
//! Repeated ids do not invalidate a stored or imported collection; only the
//! write-side gate [`check_templates`] rejects them.

use crate::template::{Frequency, Priority, Template, TemplateCategory};
use crate::timestamp::parse_timestamp;
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

/// First rule a candidate broke
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    /// Candidate is not a JSON object
    #[error("{0} is not an object")]
    NotAnObject(&'static str),

    /// Required field absent
    #[error("missing required field `{0}`")]
    Missing(&'static str),

    /// Field present with the wrong type
    #[error("field `{field}` must be {expected}")]
    WrongType {
        /// Field path
        field: &'static str,
        /// Human description of the accepted type
        expected: &'static str,
    },

    /// Enumerated field outside its closed set
    #[error("field `{field}` has value `{value}` outside the allowed set")]
    NotInSet {
        /// Field path
        field: &'static str,
        /// Offending value
        value: String,
    },

    /// Two records share an id
    #[error("duplicate id `{0}`")]
    DuplicateId(String),

    /// A record inside an envelope failed
    #[error("record {index}: {violation}")]
    Record {
        /// Position of the record in `records`
        index: usize,
        /// What was wrong with it
        violation: Box<Violation>,
    },
}

/// Records rejected by a collection check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{count} invalid record(s), first: {first}")]
pub struct InvalidRecords {
    /// Number of offending records (duplicates count once per extra copy)
    pub count: usize,
    /// First violation, in record order
    pub first: Violation,
}

// ============================================================================
// Predicates
// ============================================================================

/// True if `candidate` is a valid template record
pub fn validate_record(candidate: &Value) -> bool {
    check_record(candidate).is_ok()
}

/// True if `candidate` is a valid envelope whose records all validate
pub fn validate_envelope(candidate: &Value) -> bool {
    check_envelope(candidate).is_ok()
}

// ============================================================================
// Checks
// ============================================================================

/// Check one record, returning the first violation
pub fn check_record(candidate: &Value) -> Result<(), Violation> {
    let obj = candidate
        .as_object()
        .ok_or(Violation::NotAnObject("record"))?;

    let id = required_string(obj, "id")?;
    if id.is_empty() {
        return Err(Violation::WrongType {
            field: "id",
            expected: "a non-empty string",
        });
    }

    for field in ["name", "description", "taskTitle", "taskDescription"] {
        required_string(obj, field)?;
    }

    let category = required_string(obj, "category")?;
    if TemplateCategory::parse(category).is_none() {
        return Err(Violation::NotInSet {
            field: "category",
            value: category.to_string(),
        });
    }

    if let Some(priority) = optional_string(obj, "priority")? {
        if Priority::parse(priority).is_none() {
            return Err(Violation::NotInSet {
                field: "priority",
                value: priority.to_string(),
            });
        }
    }

    let labels = required(obj, "labels")?
        .as_array()
        .ok_or(Violation::WrongType {
            field: "labels",
            expected: "an array",
        })?;
    if !labels.iter().all(Value::is_string) {
        return Err(Violation::WrongType {
            field: "labels",
            expected: "an array of strings",
        });
    }

    match required(obj, "dueDate")? {
        Value::Null | Value::String(_) => {}
        _ => {
            return Err(Violation::WrongType {
                field: "dueDate",
                expected: "null or a string",
            })
        }
    }

    match obj.get("recurrence") {
        None | Some(Value::Null) => {}
        Some(recurrence) => check_recurrence(recurrence)?,
    }

    for field in ["createdAt", "updatedAt"] {
        required_timestamp(obj, field)?;
    }

    if required(obj, "usageCount")?.as_u64().is_none() {
        return Err(Violation::WrongType {
            field: "usageCount",
            expected: "a non-negative integer",
        });
    }

    if !required(obj, "isFavorite")?.is_boolean() {
        return Err(Violation::WrongType {
            field: "isFavorite",
            expected: "a boolean",
        });
    }

    optional_string(obj, "boardId")?;
    optional_string(obj, "columnId")?;

    Ok(())
}

/// Check a sequence of records, counting every offender
///
/// Each record is checked on its own. Repeated ids are not a violation here:
/// stored and imported collections are accepted as long as every record is.
pub fn check_records(records: &[Value]) -> Result<(), InvalidRecords> {
    tally(
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| check_record(record).err().map(|v| (index, v))),
    )
}

/// Check an envelope, returning the first violation
pub fn check_envelope(candidate: &Value) -> Result<(), Violation> {
    let obj = candidate
        .as_object()
        .ok_or(Violation::NotAnObject("envelope"))?;

    required_string(obj, "version")?;
    required_timestamp(obj, "updatedAt")?;

    let records = required(obj, "records")?
        .as_array()
        .ok_or(Violation::WrongType {
            field: "records",
            expected: "an array",
        })?;

    check_records(records).map_err(|invalid| invalid.first)
}

/// Write-side gate for typed records
///
/// Checks every record through its serialized form, so whatever the store
/// writes passes [`check_envelope`] when read back, and additionally rejects
/// repeated ids (each extra copy counts once).
pub fn check_templates(records: &[Template]) -> Result<(), InvalidRecords> {
    let mut seen = HashSet::new();
    tally(records.iter().enumerate().filter_map(|(index, record)| {
        // Templates always serialize; a failure here still counts as invalid.
        let value = serde_json::to_value(record).unwrap_or(Value::Null);
        let violation = match check_record(&value) {
            Err(v) => Some(v),
            Ok(()) if !seen.insert(&record.id) => {
                Some(Violation::DuplicateId(record.id.to_string()))
            }
            Ok(()) => None,
        };
        violation.map(|v| (index, v))
    }))
}

fn tally(offenders: impl Iterator<Item = (usize, Violation)>) -> Result<(), InvalidRecords> {
    let mut count = 0;
    let mut first = None;

    for (index, violation) in offenders {
        count += 1;
        first.get_or_insert(Violation::Record {
            index,
            violation: Box::new(violation),
        });
    }

    match first {
        None => Ok(()),
        Some(first) => Err(InvalidRecords { count, first }),
    }
}

// ============================================================================
// Field helpers
// ============================================================================

fn required<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value, Violation> {
    obj.get(field).ok_or(Violation::Missing(field))
}

fn required_string<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, Violation> {
    required(obj, field)?.as_str().ok_or(Violation::WrongType {
        field,
        expected: "a string",
    })
}

fn optional_string<'a>(
    obj: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, Violation> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Violation::WrongType {
            field,
            expected: "null or a string",
        }),
    }
}

fn required_timestamp(obj: &Map<String, Value>, field: &'static str) -> Result<(), Violation> {
    let raw = required_string(obj, field)?;
    parse_timestamp(raw).map(|_| ()).ok_or(Violation::WrongType {
        field,
        expected: "an ISO 8601 timestamp",
    })
}

fn check_recurrence(candidate: &Value) -> Result<(), Violation> {
    let obj = candidate
        .as_object()
        .ok_or(Violation::NotAnObject("recurrence"))?;

    let frequency = obj
        .get("frequency")
        .ok_or(Violation::Missing("recurrence.frequency"))?
        .as_str()
        .ok_or(Violation::WrongType {
            field: "recurrence.frequency",
            expected: "a string",
        })?;
    if Frequency::parse(frequency).is_none() {
        return Err(Violation::NotInSet {
            field: "recurrence.frequency",
            value: frequency.to_string(),
        });
    }

    let interval = obj
        .get("interval")
        .ok_or(Violation::Missing("recurrence.interval"))?
        .as_u64();
    if !matches!(interval, Some(n) if n >= 1 && n <= u64::from(u32::MAX)) {
        return Err(Violation::WrongType {
            field: "recurrence.interval",
            expected: "a positive integer",
        });
    }

    match obj.get("daysOfWeek") {
        None | Some(Value::Null) => {}
        Some(Value::Array(days)) => {
            if !days.iter().all(|d| matches!(d.as_u64(), Some(n) if n <= 6)) {
                return Err(Violation::WrongType {
                    field: "recurrence.daysOfWeek",
                    expected: "an array of weekday numbers 0-6",
                });
            }
        }
        Some(_) => {
            return Err(Violation::WrongType {
                field: "recurrence.daysOfWeek",
                expected: "an array of weekday numbers 0-6",
            })
        }
    }

    optional_string(obj, "endDate")?;
    Ok(())
}
