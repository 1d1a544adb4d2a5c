//! Snapshot stores: where a registry's state lives between runs.

use std::cell::RefCell;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::StoreError;
use crate::snapshot::Snapshot;

/// Durable home for a registry snapshot.
pub trait SnapshotStore {
    /// Load the last saved snapshot. `Ok(None)` means nothing was ever saved.
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    /// Replace the stored snapshot as a single all-or-nothing write.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Move an unreadable snapshot out of the way before it is overwritten.
    /// Returns where it was kept, if anywhere.
    fn set_aside(&self) -> Result<Option<PathBuf>, StoreError> {
        Ok(None)
    }
}

/// Pretty-printed JSON file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(snapshot)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // Write beside the target, then rename over it.
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        tracing::debug!("snapshot written to {}", self.path.display());
        Ok(())
    }

    /// Rename the file to `<name>.bak`, replacing any older backup.
    fn set_aside(&self) -> Result<Option<PathBuf>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("gradebook"));
        name.push(".bak");
        let backup = self.path.with_file_name(name);
        std::fs::rename(&self.path, &backup)?;
        Ok(Some(backup))
    }
}

/// In-memory store. Clones share the same slot, so a test can keep a handle
/// and reopen a registry from what it saved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<Snapshot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(snapshot))),
        }
    }

    /// The last saved snapshot, if any.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.slot.borrow().clone()
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        Ok(self.slot.borrow().clone())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.slot.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }
}
