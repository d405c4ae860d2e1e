//! Local working directory and temporary partition files

use crate::error::{Error, Result, ResultExt};
use std::path::{Path, PathBuf};
use tracing::warn;

use super::key::file_name;

/// Directory where partition files live between write and upload
#[derive(Debug, Clone)]
pub struct WorkingDir {
    path: PathBuf,
}

impl WorkingDir {
    /// Create the directory if needed
    pub fn prepare(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        std::fs::create_dir_all(&path).map_err(|e| {
            Error::output(format!(
                "Failed to create working directory {}: {e}",
                path.display()
            ))
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Local path for a sequence number
    pub fn file_path(&self, seq: u64) -> PathBuf {
        self.path.join(file_name(seq))
    }

    /// Whether no partition files are left behind
    pub fn is_clean(&self) -> Result<bool> {
        let mut entries = std::fs::read_dir(&self.path)
            .with_context(|| format!("Failed to list {}", self.path.display()))?;
        Ok(!entries.any(|entry| {
            entry
                .map(|e| e.file_name().to_string_lossy().ends_with(".parquet"))
                .unwrap_or(false)
        }))
    }
}

/// A partition file that is deleted when dropped
///
/// `remove` deletes eagerly and reports failures; dropping without calling
/// it (an error path) still deletes the file, logging instead of failing.
#[derive(Debug)]
pub struct TempParquetFile {
    path: PathBuf,
    removed: bool,
}

impl TempParquetFile {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            removed: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now
    pub fn remove(mut self) -> Result<()> {
        self.removed = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::output(format!(
                "Failed to delete {}: {e}",
                self.path.display()
            ))),
        }
    }
}

impl Drop for TempParquetFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to delete local file");
            }
        }
    }
}
