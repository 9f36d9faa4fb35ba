//! Template store engine
//!
//! [`TemplateStore`] owns the template collection for the duration of each call.
//! Every mutating operation follows read-modify-validate-write:
//!
//! ```text
//!   1. load()        probe, read, parse, validate, migrate
//!   2. modify        in-memory change on an owned Vec<Template>
//!   3. validate      every record, all-or-nothing
//!   4. write         one envelope under one backend key
//! ```
//!
//! There is no partial persistence and no locking across calls. Two mutations
//! issued back-to-back from one thread are serialized by construction; a
//! second writer racing between another caller's load and write silently
//! loses to whichever writes last. [`TemplateStore::save_expecting`] lets a
//! caller detect that race, but nothing in the store requires it.
//!
//! ## Load state machine
//!
//! | Step | Outcome |
//! |------|---------|
//! | probe fails | `StorageUnavailable` |
//! | key absent | `[]` |
//! | bytes not JSON | corruption policy (reset, or `ParseError`) |
//! | envelope invalid | corruption policy (reset, or `ValidationError`) |
//! | old version | migrate, persist, return migrated records |
//! | repeated ids | later copies re-identified, persist, return records |
//! | current version | return records |

use crate::clock::{Clock, SystemClock};
use crate::config::{StencilConfig, CONFIG_FILE_NAME};
use crate::import::{
    append_records, merge_records, reidentify_duplicates, ImportMode, ImportReport,
};
use crate::migration::{MigrationPolicy, VersionBump};
use crate::recovery::{Corruption, CorruptionPolicy};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;
use stencil_core::{
    check_envelope, check_records, check_templates, Envelope, Result, StorageInfo, StoreError,
    TaskDraft, Template, TemplateDraft, TemplateId, TemplatePatch,
};
use stencil_storage::{Backend, BackendError, FileBackend, InMemoryBackend};
use tracing::{debug, info, warn};

const TARGET: &str = "stencil::store";

/// Versioned, validated template collection over a key-value backend
///
/// Backend, clock and migration policy are constructor-supplied so tests can
/// substitute an in-memory backend and a manual clock.
pub struct TemplateStore<B: Backend> {
    backend: B,
    config: StencilConfig,
    migration: Box<dyn MigrationPolicy>,
    clock: Box<dyn Clock>,
}

impl TemplateStore<InMemoryBackend> {
    /// Create a store over a fresh in-memory backend with default config
    ///
    /// Data is lost when the store is dropped.
    pub fn ephemeral() -> Self {
        Self::with_backend(InMemoryBackend::new(), StencilConfig::default())
    }
}

impl TemplateStore<FileBackend> {
    /// Open a file-backed store in `dir`
    ///
    /// Reads `stencil.toml` from the directory, writing the default config
    /// first if none exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unreadable or invalid config file and
    /// `StorageUnavailable` if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        create_store_dir(dir)?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        StencilConfig::write_default_if_missing(&config_path)?;
        let config = StencilConfig::from_file(&config_path)?;
        Self::open_at(dir, config)
    }

    /// Open a file-backed store in `dir` with an explicit config
    ///
    /// The config is written to `stencil.toml`, replacing any existing file.
    pub fn open_with_config(dir: impl AsRef<Path>, config: StencilConfig) -> Result<Self> {
        config.validate()?;
        let dir = dir.as_ref();
        create_store_dir(dir)?;
        config.write_to_file(&dir.join(CONFIG_FILE_NAME))?;
        Self::open_at(dir, config)
    }

    fn open_at(dir: &Path, config: StencilConfig) -> Result<Self> {
        let backend = FileBackend::open(dir)
            .map_err(|e| StoreError::StorageUnavailable(e.to_string()))?
            .with_max_bytes(config.max_bytes);
        info!(
            target: TARGET,
            path = %dir.display(),
            key = %config.storage_key,
            on_corruption = %config.on_corruption,
            "Opened file-backed template store"
        );
        Ok(Self::with_backend(backend, config))
    }
}

fn create_store_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        StoreError::StorageUnavailable(format!(
            "Failed to create store directory '{}': {}",
            dir.display(),
            e
        ))
    })
}

impl<B: Backend> TemplateStore<B> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Create a store over `backend`
    pub fn with_backend(backend: B, config: StencilConfig) -> Self {
        Self {
            backend,
            config,
            migration: Box::new(VersionBump),
            clock: Box::new(SystemClock),
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the migration policy
    pub fn with_migration(mut self, migration: impl MigrationPolicy + 'static) -> Self {
        self.migration = Box::new(migration);
        self
    }

    /// Replace the corruption policy
    pub fn with_corruption_policy(mut self, policy: CorruptionPolicy) -> Self {
        self.config.on_corruption = policy;
        self
    }

    /// The underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Active configuration
    pub fn config(&self) -> &StencilConfig {
        &self.config
    }

    /// Backend key the envelope lives under
    pub fn storage_key(&self) -> &str {
        &self.config.storage_key
    }

    // =========================================================================
    // Load / save
    // =========================================================================

    /// Load the whole collection
    ///
    /// # Errors
    ///
    /// - `StorageUnavailable` if the backend probe fails
    /// - `ParseError` / `ValidationError` for corrupt data under `FailOnCorruption`
    /// - `UnknownError` if the backend read fails
    pub fn load(&self) -> Result<Vec<Template>> {
        self.ensure_available()?;

        let Some(bytes) = self.read_raw()? else {
            debug!(target: TARGET, key = %self.config.storage_key, "No stored templates");
            return Ok(Vec::new());
        };

        let mut envelope = match decode(&bytes) {
            Ok(envelope) => envelope,
            Err(corruption) => return self.recover(corruption),
        };
        let mut rewrite = false;

        if self.migration.needs_migration(&envelope) {
            let from = envelope.version.clone();
            envelope = self.migration.migrate(envelope);
            rewrite = true;
            info!(
                target: TARGET,
                from = %from,
                to = %self.migration.current_version(),
                records = envelope.records.len(),
                "Migrated stored templates"
            );
        }

        let reidentified = reidentify_duplicates(&mut envelope.records);
        if reidentified > 0 {
            rewrite = true;
            warn!(
                target: TARGET,
                reidentified,
                "Stored templates repeated ids; later copies given fresh ids"
            );
        }

        if rewrite {
            self.commit(envelope.records.clone())?;
        }
        Ok(envelope.records)
    }

    /// Replace the whole collection
    ///
    /// All-or-nothing: if any record fails validation nothing is written.
    ///
    /// # Errors
    ///
    /// - `StorageUnavailable` if the backend probe fails
    /// - `ValidationError` with the number of invalid records
    /// - `QuotaExceeded` if the backend rejects the size
    /// - `UnknownError` for any other backend failure
    pub fn save(&self, records: &[Template]) -> Result<()> {
        self.commit(records.to_vec())
    }

    /// [`save`](Self::save), but only if the stored envelope is unchanged
    ///
    /// `expected_updated_at` is the envelope timestamp the caller last observed
    /// (see [`storage_info`](Self::storage_info)). Passing `None` behaves
    /// exactly like `save`.
    ///
    /// # Errors
    ///
    /// `VersionConflict` if the stored envelope has a different timestamp (or
    /// none, or cannot be read); otherwise as `save`.
    pub fn save_expecting(
        &self,
        records: &[Template],
        expected_updated_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        if let Some(expected) = expected_updated_at {
            let actual = self.peek().ok().flatten().map(|env| env.updated_at);
            if actual != Some(expected) {
                warn!(
                    target: TARGET,
                    expected = %expected,
                    "Stored templates changed since last read"
                );
                return Err(StoreError::VersionConflict {
                    expected: expected.to_rfc3339(),
                    actual: actual.map(|a| a.to_rfc3339()).unwrap_or_default(),
                });
            }
        }
        self.save(records)
    }

    // =========================================================================
    // CRUD
    // =========================================================================

    /// Look up one template
    pub fn get(&self, id: &TemplateId) -> Result<Option<Template>> {
        Ok(self.load()?.into_iter().find(|t| t.id == *id))
    }

    /// Create a template from form data
    ///
    /// The new record has a fresh id, `usage_count == 0` and
    /// `created_at == updated_at`.
    pub fn create(&self, draft: TemplateDraft) -> Result<Template> {
        let mut records = self.load()?;
        let template = Template::new(TemplateId::generate(), draft, self.clock.now());
        records.push(template.clone());
        self.commit(records)?;
        debug!(target: TARGET, id = %template.id, name = %template.name, "Template created");
        Ok(template)
    }

    /// Merge `patch` into a template
    ///
    /// Returns `None` (and writes nothing) if no template has `id`.
    pub fn update(&self, id: &TemplateId, patch: TemplatePatch) -> Result<Option<Template>> {
        let mut records = self.load()?;
        let Some(template) = records.iter_mut().find(|t| t.id == *id) else {
            debug!(target: TARGET, id = %id, "Update of unknown template ignored");
            return Ok(None);
        };

        patch.apply_to(template);
        template.touch(self.clock.now());
        let updated = template.clone();

        self.commit(records)?;
        debug!(target: TARGET, id = %id, "Template updated");
        Ok(Some(updated))
    }

    /// Delete a template
    ///
    /// Returns `false` (and writes nothing) if no template has `id`.
    pub fn delete(&self, id: &TemplateId) -> Result<bool> {
        let mut records = self.load()?;
        let before = records.len();
        records.retain(|t| t.id != *id);
        if records.len() == before {
            return Ok(false);
        }

        self.commit(records)?;
        debug!(target: TARGET, id = %id, "Template deleted");
        Ok(true)
    }

    /// Remove the backend key entirely
    pub fn clear(&self) -> Result<()> {
        self.ensure_available()?;
        self.backend
            .remove(&self.config.storage_key)
            .map_err(backend_failure)?;
        info!(target: TARGET, key = %self.config.storage_key, "Template store cleared");
        Ok(())
    }

    // =========================================================================
    // Usage and favorites
    // =========================================================================

    /// Record that a task was created from a template
    ///
    /// A missing id is a logged no-op: usage tracking never blocks task
    /// creation.
    pub fn increment_usage(&self, id: &TemplateId) -> Result<()> {
        self.mutate_one(id, "increment usage of", |t| {
            t.usage_count = t.usage_count.saturating_add(1);
        })
        .map(|_| ())
    }

    /// Flip the favorite flag, returning the new state
    ///
    /// A missing id is a logged no-op returning `false`.
    pub fn toggle_favorite(&self, id: &TemplateId) -> Result<bool> {
        let updated = self.mutate_one(id, "toggle favorite on", |t| {
            t.is_favorite = !t.is_favorite;
        })?;
        Ok(updated.map_or(false, |t| t.is_favorite))
    }

    /// Create-task-from-template: project the template and count the use
    ///
    /// Returns `None` (and writes nothing) if no template has `id`.
    pub fn use_template(&self, id: &TemplateId) -> Result<Option<TaskDraft>> {
        let updated = self.mutate_one(id, "use", |t| {
            t.usage_count = t.usage_count.saturating_add(1);
        })?;
        Ok(updated.map(|t| t.to_task_draft()))
    }

    fn mutate_one(
        &self,
        id: &TemplateId,
        action: &str,
        change: impl FnOnce(&mut Template),
    ) -> Result<Option<Template>> {
        let mut records = self.load()?;
        let Some(template) = records.iter_mut().find(|t| t.id == *id) else {
            warn!(target: TARGET, id = %id, "Cannot {} unknown template", action);
            return Ok(None);
        };

        change(template);
        template.touch(self.clock.now());
        let updated = template.clone();

        self.commit(records)?;
        Ok(Some(updated))
    }

    // =========================================================================
    // Export / import
    // =========================================================================

    /// Snapshot the collection in a freshly stamped envelope
    pub fn export(&self) -> Result<Envelope> {
        let records = self.load()?;
        Ok(self.envelope(records))
    }

    /// [`export`](Self::export) as pretty-printed JSON
    pub fn export_json(&self) -> Result<String> {
        let envelope = self.export()?;
        serde_json::to_string_pretty(&envelope).map_err(StoreError::unknown)
    }

    /// Import an envelope from external JSON
    ///
    /// The envelope is validated first and rejected wholesale if invalid;
    /// older versions are migrated before merging.
    ///
    /// # Errors
    ///
    /// `ValidationError` for an invalid envelope or one written by a newer
    /// schema version (nothing written); otherwise as `load` / `save`.
    pub fn import(&self, envelope: Value, mode: ImportMode) -> Result<ImportReport> {
        let mut incoming = decode_value(envelope).map_err(|corruption| {
            warn!(target: TARGET, cause = %corruption.describe(), "Rejected import");
            StoreError::from(corruption)
        })?;

        if self.migration.is_newer(&incoming) {
            warn!(
                target: TARGET,
                version = %incoming.version,
                supported = %self.migration.current_version(),
                "Rejected import from newer schema"
            );
            return Err(StoreError::validation(
                0,
                format!(
                    "envelope version {} is newer than supported version {}",
                    incoming.version,
                    self.migration.current_version()
                ),
            ));
        }

        if self.migration.needs_migration(&incoming) {
            debug!(target: TARGET, from = %incoming.version, "Migrating imported envelope");
            incoming = self.migration.migrate(incoming);
        }

        let imported = incoming.records.len();
        let now = self.clock.now();
        let (records, reidentified) = match mode {
            ImportMode::ReplaceAll => {
                let reidentified = reidentify_duplicates(&mut incoming.records);
                (incoming.records, reidentified)
            }
            ImportMode::Merge => merge_records(
                self.load()?,
                incoming.records,
                &self.config.import_suffix,
                now,
            ),
            ImportMode::Append => (append_records(self.load()?, incoming.records, now), imported),
        };

        let total = records.len();
        self.commit(records)?;
        info!(
            target: TARGET,
            mode = ?mode,
            imported,
            reidentified,
            total,
            "Templates imported"
        );

        Ok(ImportReport {
            mode,
            imported,
            reidentified,
            total,
        })
    }

    /// [`import`](Self::import) from JSON text
    ///
    /// # Errors
    ///
    /// `ParseError` if `json` is not well-formed; otherwise as `import`.
    pub fn import_json(&self, json: &str, mode: ImportMode) -> Result<ImportReport> {
        let value: Value = serde_json::from_str(json)?;
        self.import(value, mode)
    }

    // =========================================================================
    // Diagnostics (never fail)
    // =========================================================================

    /// Byte length of the persisted envelope, `0` if absent or unreadable
    pub fn storage_size(&self) -> usize {
        match self.backend.read(&self.config.storage_key) {
            Ok(Some(bytes)) => bytes.len(),
            _ => 0,
        }
    }

    /// Advisory summary of what is persisted
    ///
    /// Reports the default (zero counts, no timestamp) on any failure. Never
    /// writes, even when the stored data is corrupt.
    pub fn storage_info(&self) -> StorageInfo {
        let bytes = match self.backend.read(&self.config.storage_key) {
            Ok(Some(bytes)) => bytes,
            _ => return StorageInfo::default(),
        };

        match decode(&bytes) {
            Ok(envelope) => StorageInfo {
                count: envelope.records.len(),
                size: bytes.len(),
                version: envelope.version,
                last_updated: Some(envelope.updated_at),
            },
            Err(_) => StorageInfo::default(),
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_available(&self) -> Result<()> {
        if self.backend.probe() {
            Ok(())
        } else {
            warn!(target: TARGET, "Storage probe failed");
            Err(StoreError::StorageUnavailable(
                "backend rejected probe write".to_string(),
            ))
        }
    }

    fn read_raw(&self) -> Result<Option<Vec<u8>>> {
        self.backend
            .read(&self.config.storage_key)
            .map_err(backend_failure)
    }

    /// Read and decode the stored envelope without probing or recovering
    fn peek(&self) -> Result<Option<Envelope>> {
        match self.read_raw()? {
            None => Ok(None),
            Some(bytes) => decode(&bytes).map(Some).map_err(StoreError::from),
        }
    }

    fn envelope(&self, records: Vec<Template>) -> Envelope {
        Envelope::new(self.migration.current_version(), records, self.clock.now())
    }

    /// Probe, validate all records, write one envelope
    fn commit(&self, records: Vec<Template>) -> Result<()> {
        self.ensure_available()?;

        if let Err(invalid) = check_templates(&records) {
            warn!(
                target: TARGET,
                invalid = invalid.count,
                first = %invalid.first,
                "Refusing to save invalid templates"
            );
            return Err(StoreError::validation(invalid.count, invalid.first.to_string()));
        }

        let envelope = self.envelope(records);
        self.write_envelope(&envelope)?;
        debug!(target: TARGET, records = envelope.records.len(), "Templates saved");
        Ok(())
    }

    fn write_envelope(&self, envelope: &Envelope) -> Result<()> {
        let bytes = serde_json::to_vec(envelope).map_err(StoreError::unknown)?;
        self.backend
            .write(&self.config.storage_key, &bytes)
            .map_err(backend_failure)
    }

    fn recover(&self, corruption: Corruption) -> Result<Vec<Template>> {
        match self.config.on_corruption {
            CorruptionPolicy::ResetOnCorruption => {
                warn!(
                    target: TARGET,
                    key = %self.config.storage_key,
                    cause = %corruption.describe(),
                    "Discarding corrupt stored templates"
                );
                self.write_envelope(&self.envelope(Vec::new()))?;
                Ok(Vec::new())
            }
            CorruptionPolicy::FailOnCorruption => {
                warn!(
                    target: TARGET,
                    key = %self.config.storage_key,
                    cause = %corruption.describe(),
                    "Stored templates are corrupt"
                );
                Err(corruption.into())
            }
        }
    }
}

fn backend_failure(err: BackendError) -> StoreError {
    if err.is_quota_exceeded() {
        StoreError::QuotaExceeded(err.to_string())
    } else {
        StoreError::unknown(err)
    }
}

/// Parse and validate stored bytes
fn decode(bytes: &[u8]) -> std::result::Result<Envelope, Corruption> {
    let value: Value = serde_json::from_slice(bytes).map_err(Corruption::Unparsable)?;
    decode_value(value)
}

/// Validate a JSON envelope and convert it to the typed model
fn decode_value(value: Value) -> std::result::Result<Envelope, Corruption> {
    if let Err(violation) = check_envelope(&value) {
        let invalid = value
            .get("records")
            .and_then(Value::as_array)
            .and_then(|records| check_records(records).err())
            .map_or(0, |invalid| invalid.count);
        return Err(Corruption::Invalid {
            invalid,
            reason: violation.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|e| Corruption::Invalid {
        invalid: 0,
        reason: e.to_string(),
    })
}
