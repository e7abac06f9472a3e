//! Durable storage for loyalty records.
//!
//! The ledger only sees serialized payloads; the backends below decide where
//! they live. Every backend keeps one payload per customer under the fixed
//! [`STORAGE_KEY`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::debug;

/// Key the record is stored under, scoped per customer.
pub const STORAGE_KEY: &str = "loyaltyData";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid customer key '{0}'")]
    InvalidKey(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Key-value slot holding one customer's serialized record.
pub trait Storage {
    /// Read the stored payload, `None` when nothing was ever saved.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the stored payload.
    fn save(&mut self, payload: &str) -> Result<(), StorageError>;
}

/// In-process slot. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with `payload`.
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(payload.into()))),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, StorageError> {
        self.slot
            .lock()
            .map_err(|_| StorageError::Unavailable("memory slot poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.clone())
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        *self.lock()? = Some(payload.to_string());
        Ok(())
    }
}

/// One JSON file per customer: `<root>/<customer>/loyaltyData.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn for_customer(root: impl AsRef<Path>, customer: &str) -> Result<Self, StorageError> {
        let valid = !customer.is_empty()
            && customer != "."
            && customer != ".."
            && !customer.contains(['/', '\\']);
        if !valid {
            return Err(StorageError::InvalidKey(customer.to_string()));
        }

        let path = root
            .as_ref()
            .join(customer)
            .join(format!("{STORAGE_KEY}.json"));
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 bytes are a malformed payload, not an I/O failure
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Ok(Some(String::new())),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&mut self, payload: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Write aside then rename so a crash never leaves a torn record
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload).map_err(|e| self.io_error(e))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }

        debug!(path = %self.path.display(), bytes = payload.len(), "record saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_starts_empty() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn memory_storage_clones_share_slot() {
        let mut writer = MemoryStorage::new();
        let reader = writer.clone();
        writer.save("{}").unwrap();
        assert_eq!(reader.load().unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn file_storage_missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::for_customer(dir.path(), "alice").unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn file_storage_round_trip_creates_customer_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::for_customer(dir.path(), "alice").unwrap();
        storage.save(r#"{"points":1}"#).unwrap();

        assert_eq!(
            storage.path(),
            dir.path().join("alice").join("loyaltyData.json")
        );
        assert!(!storage.path().with_extension("json.tmp").exists());

        let reopened = FileStorage::for_customer(dir.path(), "alice").unwrap();
        assert_eq!(reopened.load().unwrap().as_deref(), Some(r#"{"points":1}"#));
    }

    #[test]
    fn file_storage_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::for_customer(dir.path(), "bob").unwrap();
        storage.save("first").unwrap();
        storage.save("second").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn file_storage_customers_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let mut alice = FileStorage::for_customer(dir.path(), "alice").unwrap();
        let bob = FileStorage::for_customer(dir.path(), "bob").unwrap();
        alice.save("alice's").unwrap();
        assert_eq!(bob.load().unwrap(), None);
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        for key in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                FileStorage::for_customer(dir.path(), key),
                Err(StorageError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn file_storage_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::for_customer(dir.path(), "dave").unwrap();
        // A non-empty directory where the record file should be
        fs::create_dir_all(storage.path().join("blocker")).unwrap();

        assert!(matches!(storage.save("{}"), Err(StorageError::Io { .. })));
        assert!(!storage.path().with_extension("json.tmp").exists());
        assert!(storage.path().is_dir());
    }

    #[test]
    fn file_storage_save_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the customer directory should be
        fs::write(dir.path().join("carol"), "x").unwrap();
        let mut storage = FileStorage::for_customer(dir.path(), "carol").unwrap();
        assert!(matches!(storage.save("{}"), Err(StorageError::Io { .. })));
    }
}
