//! File-backed session slot.
//!
//! Each key is stored as `<dir>/<key>.json`. Writes go to a temporary sibling
//! first and are renamed into place, so a crash never leaves a torn session.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use webdesk_core::{SessionSlot, SlotError};

/// Session slot persisted as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    /// Create a slot rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the session files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn check_key(key: &str) -> Result<(), SlotError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.contains("..") {
            return Err(SlotError::Unavailable(format!("invalid session key '{}'", key)));
        }
        Ok(())
    }
}

impl SessionSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        Self::check_key(key)?;
        match fs::read_to_string(self.path_for(key)) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        Self::check_key(key)?;
        fs::create_dir_all(&self.dir)?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SlotError> {
        Self::check_key(key)?;
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
