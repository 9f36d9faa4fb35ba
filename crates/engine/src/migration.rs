//! Schema migration policy
//!
//! A migration maps an envelope written under an older schema version to the
//! current shape. It is a pure, total function and idempotent:
//! `migrate(migrate(x)) == migrate(x)`. The store only invokes it on envelopes
//! whose version differs from the current one, then persists the result.
//!
//! There is one schema version today, so [`VersionBump`] only rewrites the
//! version string. New schema versions slot in as new policies without
//! touching the store.

use std::cmp::Ordering;
use stencil_core::{Envelope, CURRENT_VERSION};

/// Order two dotted version strings numerically
///
/// Missing components count as zero (`"1.0" == "1.0.0"`), as does any
/// component that is not a number.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn parts(v: &str) -> Vec<u64> {
        v.trim()
            .split('.')
            .map(|part| part.trim().parse().unwrap_or(0))
            .collect()
    }

    let (a, b) = (parts(a), parts(b));
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| {
            let x = a.get(i).copied().unwrap_or(0);
            let y = b.get(i).copied().unwrap_or(0);
            x.cmp(&y)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Upgrade path from past envelope versions to the current one
pub trait MigrationPolicy: Send + Sync {
    /// Version this policy migrates to
    fn current_version(&self) -> &str;

    /// Map a past-version envelope to the current shape
    fn migrate(&self, envelope: Envelope) -> Envelope;

    /// True if `envelope` is not at [`MigrationPolicy::current_version`]
    fn needs_migration(&self, envelope: &Envelope) -> bool {
        envelope.version != self.current_version()
    }

    /// True if `envelope` was written by a later schema than this policy knows
    fn is_newer(&self, envelope: &Envelope) -> bool {
        compare_versions(&envelope.version, self.current_version()) == Ordering::Greater
    }
}

/// Identity-with-version-bump migration for the single schema version
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionBump;

impl MigrationPolicy for VersionBump {
    fn current_version(&self) -> &str {
        CURRENT_VERSION
    }

    fn migrate(&self, mut envelope: Envelope) -> Envelope {
        envelope.version = CURRENT_VERSION.to_string();
        envelope
    }
}
