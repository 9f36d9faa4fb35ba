//! Recovery policy for corrupt stored data
//!
//! `load` meets two kinds of bad data under the storage key: bytes that are not
//! JSON at all, and JSON that fails the envelope validator. What happens next
//! is a named policy rather than an incidental side effect:
//!
//! | Policy | Unparsable bytes | Invalid envelope |
//! |--------|------------------|------------------|
//! | `ResetOnCorruption` | empty envelope written, `[]` returned | same |
//! | `FailOnCorruption` | `ParseError` | `ValidationError` |
//!
//! Reset is irrecoverable: the discarded data is gone. It exists so that a
//! corrupt store never blocks the user.

use serde::{Deserialize, Serialize};
use stencil_core::StoreError;
use thiserror::Error;

/// What `load` does with stored data that fails to parse or validate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorruptionPolicy {
    /// Discard the data, persist an empty envelope, return an empty collection
    #[default]
    #[serde(rename = "reset")]
    ResetOnCorruption,
    /// Surface the failure and leave the stored bytes untouched
    #[serde(rename = "fail")]
    FailOnCorruption,
}

impl CorruptionPolicy {
    /// Config-file name of the policy
    pub fn as_str(&self) -> &'static str {
        match self {
            CorruptionPolicy::ResetOnCorruption => "reset",
            CorruptionPolicy::FailOnCorruption => "fail",
        }
    }

    /// True if corrupt data is discarded
    pub fn resets(&self) -> bool {
        matches!(self, CorruptionPolicy::ResetOnCorruption)
    }
}

impl std::fmt::Display for CorruptionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why stored data was rejected on read
#[derive(Debug, Error)]
pub enum Corruption {
    /// Bytes are not JSON
    #[error("unparsable: {0}")]
    Unparsable(#[source] serde_json::Error),
    /// JSON that fails the envelope validator
    #[error("invalid ({invalid} bad records): {reason}")]
    Invalid {
        /// Number of invalid records (0 for envelope-level failures)
        invalid: usize,
        /// First violation
        reason: String,
    },
}

impl Corruption {
    /// Short description for logs
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl From<Corruption> for StoreError {
    fn from(corruption: Corruption) -> Self {
        match corruption {
            Corruption::Unparsable(e) => StoreError::ParseError(e),
            Corruption::Invalid { invalid, reason } => StoreError::validation(invalid, reason),
        }
    }
}
