//! Session persistence.
//!
//! The window collection is stored as a JSON array under a single string key
//! of a [`SessionSlot`]. Storage failures never reach the caller: they are
//! logged and the desktop keeps working in memory.

use crate::{WindowId, WindowRecord};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors raised by a durable slot backend.
#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Storage is unavailable: {0}")]
    Unavailable(String),

    #[error("Storage quota exceeded while writing {key} ({bytes} bytes)")]
    QuotaExceeded { key: String, bytes: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A durable string-keyed storage slot.
pub trait SessionSlot: Send {
    /// Read the value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError>;

    /// Delete the value stored under `key`. Deleting a missing key succeeds.
    fn remove(&mut self, key: &str) -> Result<(), SlotError>;
}

/// In-memory slot, optionally limited to a byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    entries: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemorySlot {
    /// Create an empty slot without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty slot that rejects values larger than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            quota: Some(bytes),
        }
    }

    /// Raw access to a stored value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl SessionSlot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), SlotError> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(SlotError::QuotaExceeded {
                    key: key.to_string(),
                    bytes: value.len(),
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SlotError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Serialize the whole collection into the slot.
///
/// Returns whether the session was written; failures are only logged.
pub fn save_session(slot: &mut dyn SessionSlot, key: &str, windows: &[WindowRecord]) -> bool {
    let json = match serde_json::to_string(windows) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to save session: {}", e);
            return false;
        }
    };

    match slot.write(key, &json) {
        Ok(()) => {
            info!("Saved session '{}' with {} windows", key, windows.len());
            true
        }
        Err(e) => {
            error!("Failed to save session: {}", e);
            false
        }
    }
}

/// Read the collection back from the slot.
///
/// A missing, unreadable or malformed session yields an empty collection.
/// Records repeating an id already seen are dropped.
pub fn load_session(slot: &dyn SessionSlot, key: &str) -> Vec<WindowRecord> {
    let json = match slot.read(key) {
        Ok(Some(json)) => json,
        Ok(None) => {
            debug!("No saved session under '{}'", key);
            return Vec::new();
        }
        Err(e) => {
            error!("Failed to load session: {}", e);
            return Vec::new();
        }
    };

    let windows: Vec<WindowRecord> = match serde_json::from_str(&json) {
        Ok(windows) => windows,
        Err(e) => {
            error!("Failed to load session: {}", e);
            return Vec::new();
        }
    };

    let mut seen: HashSet<WindowId> = HashSet::new();
    let total = windows.len();
    let windows: Vec<WindowRecord> = windows.into_iter().filter(|w| seen.insert(w.id)).collect();
    if windows.len() != total {
        warn!(
            "Dropped {} duplicate window records from session '{}'",
            total - windows.len(),
            key
        );
    }

    info!("Loaded session '{}' with {} windows", key, windows.len());
    windows
}

/// Delete the stored session.
///
/// The caller resets its in-memory collection regardless of the outcome.
pub fn clear_session(slot: &mut dyn SessionSlot, key: &str) {
    match slot.remove(key) {
        Ok(()) => info!("Cleared session '{}'", key),
        Err(e) => error!("Failed to clear session: {}", e),
    }
}
