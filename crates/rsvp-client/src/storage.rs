use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use rsvp_core::error::AppError;
use rsvp_core::traits::Storage;

/// Durable [`Storage`] keeping one plain-text file per key in a directory.
///
/// This is what lets a login survive a restart of the CLI. The directory is
/// created on first write. Writes go to an owner-only temp file that is then
/// renamed over the target, so a failed write leaves the previous value.
/// Surrounding whitespace is stripped on read.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AppError::StorageError(format!("Invalid storage key '{key}'")));
        }
        Ok(self.dir.join(key))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value.trim().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::StorageError(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::StorageError(format!("Failed to create {}: {e}", self.dir.display()))
        })?;
        // NamedTempFile is created 0600 on unix.
        let mut file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            AppError::StorageError(format!(
                "Failed to create temp file in {}: {e}",
                self.dir.display()
            ))
        })?;
        let write_err =
            |e: std::io::Error| AppError::StorageError(format!("Failed to write {}: {e}", path.display()));
        file.write_all(value.as_bytes()).map_err(write_err)?;
        file.as_file().sync_all().map_err(write_err)?;
        file.persist(&path).map_err(|e| {
            AppError::StorageError(format!("Failed to replace {}: {}", path.display(), e.error))
        })?;

        tracing::debug!(key, path = %path.display(), "Persisted value");
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageError(format!(
                "Failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}
