//! In-memory backend
//!
//! Non-persistent backend for tests and ephemeral stores. It models the two
//! failure modes a platform key-value store has:
//! - a total size quota (keys and values both count), and
//! - an availability switch, for storage that is disabled or denied.
//!
//! All data is lost when the backend is dropped.

use crate::backend::{Backend, BackendError, BackendResult, PROBE_KEY};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory key-value backend
#[derive(Debug)]
pub struct InMemoryBackend {
    data: RwLock<HashMap<String, Vec<u8>>>,
    quota_bytes: Option<u64>,
    available: AtomicBool,
}

impl InMemoryBackend {
    /// Create an empty, unlimited backend
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            quota_bytes: None,
            available: AtomicBool::new(true),
        }
    }

    /// Create an empty backend that rejects writes past `quota_bytes` in total
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// Enable or disable the backend
    ///
    /// While disabled, `probe` returns `false` and every other call fails with
    /// `Unavailable`. Stored data is kept.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Total bytes currently held (keys plus values)
    pub fn used_bytes(&self) -> u64 {
        let data = self.data.read();
        data.iter().map(|(k, v)| entry_size(k, v.len())).sum()
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// True if no keys are held
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn ensure_available(&self) -> BackendResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable("storage is disabled".to_string()))
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn entry_size(key: &str, value_len: usize) -> u64 {
    (key.len() + value_len) as u64
}

impl Backend for InMemoryBackend {
    fn probe(&self) -> bool {
        self.write(PROBE_KEY, PROBE_KEY.as_bytes()).is_ok() && self.remove(PROBE_KEY).is_ok()
    }

    fn read(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        self.ensure_available()?;
        Ok(self.data.read().get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> BackendResult<()> {
        self.ensure_available()?;
        let mut data = self.data.write();

        if let Some(limit) = self.quota_bytes {
            let used: u64 = data
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| entry_size(k, v.len()))
                .sum();
            let required = used + entry_size(key, bytes.len());
            if required > limit {
                return Err(BackendError::QuotaExceeded { required, limit });
            }
        }

        data.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> BackendResult<()> {
        self.ensure_available()?;
        self.data.write().remove(key);
        Ok(())
    }
}
