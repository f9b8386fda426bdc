//! Persistence port for the article collection.
//!
//! The collection lives as one JSON blob under one key. The store only ever
//! reads the whole blob and writes the whole blob back.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Key the article collection is persisted under.
pub const ARTICLES_KEY: &str = "anonymous-articles";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Single-key blob storage.
pub trait ArticleStorage: Send + Sync {
    /// The persisted blob, or `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Replace the persisted blob.
    fn save(&self, blob: &str) -> Result<(), StorageError>;
}

/// In-process storage, used by tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blob: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing blob, valid or not.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.blob
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ArticleStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.blob())
    }

    fn save(&self, blob: &str) -> Result<(), StorageError> {
        *self.blob.lock().unwrap_or_else(PoisonError::into_inner) = Some(blob.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    /// Storage for the article collection inside `dir`.
    pub fn articles(dir: impl AsRef<Path>) -> Self {
        Self::new(dir, ARTICLES_KEY)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl ArticleStorage for FileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Writes a sibling temp file and renames it over the target, so a crash
    /// mid-write leaves the previous blob intact.
    fn save(&self, blob: &str) -> Result<(), StorageError> {
        let staging = self.staging_path();
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&staging, blob)?;
            fs::rename(&staging, &self.path)
        };

        write().map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
