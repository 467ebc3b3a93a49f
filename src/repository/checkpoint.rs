//! Durable ingestion cursor.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::{RepositoryError, Result};

/// Single-value store for the last fully processed source ID.
pub trait CheckpointStore: Send + Sync {
    /// Read the checkpoint. Missing or unreadable state yields `None`.
    fn load(&self) -> Option<u64>;

    /// Replace the checkpoint atomically.
    fn save(&self, id: u64) -> Result<()>;

    /// Forget the checkpoint so the next walk starts from the top.
    fn clear(&self) -> Result<()>;
}

/// Checkpoint kept as a plain-text integer in a file.
///
/// Saves go to a temp file in the same directory which is synced and then
/// renamed over the target, so readers see either the old or the new value.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> Option<u64> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), "Unreadable checkpoint, ignoring: {}", e);
                return None;
            }
        };

        match contents.trim().parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(
                    path = %self.path.display(),
                    "Corrupt checkpoint {:?}, starting from the high-water mark",
                    contents.trim()
                );
                None
            }
        }
    }

    fn save(&self, id: u64) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        write!(tmp, "{}", id)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| RepositoryError::Checkpoint(format!("{}: {}", self.path.display(), e)))?;

        debug!(id, "Checkpoint saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
