//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{json, Value};
use std::ops::Deref;
use std::sync::{Arc, Once};
pub use stencil::*;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Route store logs to the test harness. Filter with `RUST_LOG=stencil=debug`.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fixed start time for every manual clock.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

// ============================================================================
// TestStore - in-memory store with a manual clock
// ============================================================================

/// In-memory template store whose clock only moves when told to.
pub struct TestStore {
    pub store: TemplateStore<InMemoryBackend>,
    pub clock: Arc<ManualClock>,
}

impl TestStore {
    /// Default config, reset-on-corruption.
    pub fn new() -> Self {
        Self::with_backend(InMemoryBackend::new(), StencilConfig::default())
    }

    /// Fail loudly on corrupt data instead of resetting.
    pub fn strict() -> Self {
        let config = StencilConfig {
            on_corruption: CorruptionPolicy::FailOnCorruption,
            ..StencilConfig::default()
        };
        Self::with_backend(InMemoryBackend::new(), config)
    }

    /// Backend that rejects writes pushing it past `bytes`.
    pub fn with_quota(bytes: u64) -> Self {
        Self::with_backend(InMemoryBackend::with_quota(bytes), StencilConfig::default())
    }

    pub fn with_backend(backend: InMemoryBackend, config: StencilConfig) -> Self {
        init_tracing();
        let clock = Arc::new(ManualClock::new(epoch()));
        let store = TemplateStore::with_backend(backend, config).with_clock(clock.clone());
        TestStore { store, clock }
    }

    /// Move the clock forward.
    pub fn tick(&self, seconds: i64) {
        self.clock.advance(Duration::seconds(seconds));
    }

    /// Raw bytes under the storage key.
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.store
            .backend()
            .read(self.store.storage_key())
            .expect("backend read")
    }

    /// Stored envelope as JSON.
    pub fn raw_json(&self) -> Value {
        serde_json::from_slice(&self.raw().expect("envelope present")).expect("stored JSON")
    }

    /// Overwrite the storage key, bypassing the store.
    pub fn write_raw(&self, bytes: &[u8]) {
        self.store
            .backend()
            .write(self.store.storage_key(), bytes)
            .expect("backend write");
    }

    /// Overwrite the storage key with a JSON value.
    pub fn write_json(&self, value: &Value) {
        self.write_raw(&serde_json::to_vec(value).unwrap());
    }
}

impl Deref for TestStore {
    type Target = TemplateStore<InMemoryBackend>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

// ============================================================================
// Fixtures
// ============================================================================

/// The "Weekly Report" template used across scenarios.
pub fn weekly_report() -> TemplateDraft {
    TemplateDraft::new("Weekly Report", "Write report", TemplateCategory::Work)
        .with_priority(Priority::Medium)
        .with_labels(["reports"])
        .with_due_date("+7d")
        .with_recurrence(Recurrence::every(1, Frequency::Weekly))
}

/// A minimal draft with the given name.
pub fn draft(name: &str) -> TemplateDraft {
    TemplateDraft::new(name, format!("{} task", name), TemplateCategory::Other)
}

/// A valid raw record as it appears on the wire.
pub fn record_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "category": "work",
        "taskTitle": format!("{} task", name),
        "taskDescription": "",
        "priority": "high",
        "labels": ["a", "b"],
        "dueDate": null,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-02T00:00:00Z",
        "usageCount": 3,
        "isFavorite": false
    })
}

/// Envelope JSON around raw records.
pub fn envelope_json(version: &str, records: Vec<Value>) -> Value {
    json!({
        "version": version,
        "records": records,
        "updatedAt": "2024-01-02T00:00:00Z"
    })
}
