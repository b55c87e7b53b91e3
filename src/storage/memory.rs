//! In-memory storage backend.

use super::{StorageError, StorageProvider};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

/// Implementation of [`StorageProvider`] that keeps values in process memory.
///
/// Clones share the same underlying map, so a `MemoryStorage` can be handed to several
/// sections and they will observe each other's writes.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Creates a new, empty instance of [`MemoryStorage`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl StorageProvider for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.lock().remove(key);
        Ok(())
    }
}
