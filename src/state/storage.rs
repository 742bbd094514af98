//! Durable key/value storage for the persisted session.
//!
//! DESIGN
//! ======
//! The session pair (`adminUser`, `adminToken`) must land and disappear
//! together, so the trait only exposes batch writes and batch removals.
//! `FileStorage` rewrites the whole JSON document through a temp file and a
//! rename, which keeps a crash from leaving one key without the other.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const USER_KEY: &str = "adminUser";
pub const TOKEN_KEY: &str = "adminToken";

/// Errors produced by durable storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage document invalid: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl crate::error::ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_STORAGE_IO",
            Self::Serialize(_) => "E_STORAGE_FORMAT",
        }
    }
}

/// String key/value store that survives process restarts.
pub trait Storage: Send + Sync {
    /// Read one key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write every entry in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    /// Remove every key in one step. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError>;
}

// =============================================================================
// MEMORY
// =============================================================================

/// Process-local storage. Used by tests and the mock mode.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed storage with existing entries.
    #[must_use]
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let map = entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Self { entries: Mutex::new(map) }
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(key)
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set_all(&self, pairs: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for (k, v) in pairs {
            entries.insert((*k).to_owned(), (*v).to_owned());
        }
        Ok(())
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for k in keys {
            entries.remove(*k);
        }
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// JSON-document storage at a fixed path.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, document: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if document.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(document)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, mutate: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut document = self.read_document()?;
        mutate(&mut document);
        self.write_document(&document)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_document()?.remove(key))
    }

    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|document| {
            for (k, v) in entries {
                document.insert((*k).to_owned(), (*v).to_owned());
            }
        })
    }

    fn remove_all(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|document| {
            for k in keys {
                document.remove(*k);
            }
        })
    }
}
