//! File-based storage backend for native environments.
//!
//! Each key is persisted as its own JSON file inside a directory, which makes this the
//! durable (`localStorage`) kind when no browser is around.

use super::{StorageError, StorageProvider};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{fs, io::ErrorKind, path::PathBuf};

const FILE_STORAGE_PREFIX: &str = "oauth-";
const STORAGE_FILE_EXTENSION: &str = "json";

/// Durable storage backend that persists values to JSON files on disk.
#[derive(Debug)]
pub struct FileStorage {
    directory: PathBuf,
    lock: Mutex<()>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    value: String,
}

impl FileStorage {
    /// Creates a new instance of [`FileStorage`].
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory where the storage files will be stored. It is created
    ///   on first write.
    pub fn new<P: Into<PathBuf>>(directory: P) -> Self {
        Self {
            directory: directory.into(),
            lock: Mutex::new(()),
        }
    }

    /// The directory holding the storage files.
    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }

    /// Returns `true` if the directory exists or can be created.
    pub fn is_available(&self) -> bool {
        self.ensure_directory().is_ok()
    }

    fn ensure_directory(&self) -> Result<(), StorageError> {
        if self.directory.as_os_str().is_empty() {
            return Ok(()); // current directory
        }
        fs::create_dir_all(&self.directory)?;
        Ok(())
    }

    fn file_path(&self, key: &str) -> PathBuf {
        let sanitized_key = sanitize_key(key);
        self.directory.join(format!(
            "{FILE_STORAGE_PREFIX}{sanitized_key}.{STORAGE_FILE_EXTENSION}"
        ))
    }
}

fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect()
}

impl StorageProvider for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        match fs::read_to_string(self.file_path(key)) {
            Ok(contents) => {
                let stored: StoredValue = serde_json::from_str(&contents)
                    .map_err(|e| StorageError::File(e.to_string()))?;
                Ok(Some(stored.value))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        self.ensure_directory()?;
        let serialized = serde_json::to_string(&StoredValue {
            value: value.to_string(),
        })?;
        fs::write(self.file_path(key), serialized)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        match fs::remove_file(self.file_path(key)) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from(e)),
        }
    }
}
