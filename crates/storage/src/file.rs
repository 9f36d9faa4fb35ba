//! Directory-backed backend
//!
//! Each key is one file in the backend directory. Writes are atomic using the
//! write-fsync-rename pattern, so a crash mid-write leaves either the old value
//! or the new one, never a torn file.
//!
//! An optional byte limit caps the total size of all values in the directory,
//! which gives file-backed stores the same quota behavior as a browser store.

use crate::backend::{Backend, BackendError, BackendResult, PROBE_KEY};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of value files
const VALUE_EXT: &str = "kv";

/// Extension of in-flight temp files
const TEMP_EXT: &str = "tmp";

/// Directory-backed key-value backend
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    max_bytes: Option<u64>,
}

impl FileBackend {
    /// Open (creating if needed) a backend rooted at `dir`
    pub fn open(dir: impl AsRef<Path>) -> BackendResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(BackendError::from_io)?;
        Ok(FileBackend {
            dir,
            max_bytes: None,
        })
    }

    /// Cap the total size of stored values
    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Backend directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`
    ///
    /// Characters outside `[A-Za-z0-9._-]` are replaced so keys can never
    /// escape the directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.{}", name, VALUE_EXT))
    }

    /// Total size of value files, excluding `skip`
    fn used_bytes_excluding(&self, skip: &Path) -> io::Result<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path == skip || path.extension().map_or(true, |ext| ext != VALUE_EXT) {
                continue;
            }
            total += fs::metadata(&path)?.len();
        }
        Ok(total)
    }

    /// Write atomically (write-fsync-rename)
    fn persist(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let temp_path = path.with_extension(TEMP_EXT);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        // Atomic rename
        fs::rename(&temp_path, path)?;

        // Sync parent directory
        let dir = File::open(&self.dir)?;
        dir.sync_all()?;

        Ok(())
    }
}

impl Backend for FileBackend {
    fn probe(&self) -> bool {
        self.write(PROBE_KEY, PROBE_KEY.as_bytes()).is_ok() && self.remove(PROBE_KEY).is_ok()
    }

    fn read(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound && self.dir.is_dir() => Ok(None),
            Err(e) => Err(BackendError::from_io(e)),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> BackendResult<()> {
        let path = self.path_for(key);

        if let Some(limit) = self.max_bytes {
            let used = self
                .used_bytes_excluding(&path)
                .map_err(BackendError::from_io)?;
            let required = used + bytes.len() as u64;
            if required > limit {
                return Err(BackendError::QuotaExceeded { required, limit });
            }
        }

        self.persist(&path, bytes).map_err(BackendError::from_io)?;
        debug!(target: "stencil::storage", key, bytes = bytes.len(), "value written");
        Ok(())
    }

    fn remove(&self, key: &str) -> BackendResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound && self.dir.is_dir() => Ok(()),
            Err(e) => Err(BackendError::from_io(e)),
        }
    }
}
