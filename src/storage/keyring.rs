//! OS keyring-backed storage for native environments.

use super::{StorageError, StorageProvider};
use ::keyring::Entry;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, hash_map},
    fmt,
    sync::Arc,
};

const KEYRING_STORAGE_PREFIX: &str = "oauth-";

/// Durable [`StorageProvider`] backed by the OS credential store.
///
/// Each key becomes one credential entry under `service_name`. Entries are opened once per
/// key and reused, and clones share them.
#[derive(Clone)]
pub struct KeyringStorage {
    service_name: String,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl KeyringStorage {
    /// Creates a new instance of [`KeyringStorage`].
    pub fn new<T>(service_name: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            service_name: service_name.into(),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The service name credentials are stored under.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    fn with_entry<T>(
        &self,
        key: &str,
        f: impl FnOnce(&Entry) -> Result<T, ::keyring::Error>,
    ) -> Result<Result<T, ::keyring::Error>, StorageError> {
        let mut entries = self.entries.lock();
        let entry = match entries.entry(key.to_string()) {
            hash_map::Entry::Occupied(occupied) => occupied.into_mut(),
            hash_map::Entry::Vacant(vacant) => {
                let name = format!("{}{}", KEYRING_STORAGE_PREFIX, key);
                vacant.insert(Entry::new(&self.service_name, &name)?)
            }
        };
        Ok(f(entry))
    }
}

impl fmt::Debug for KeyringStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyringStorage")
            .field("service_name", &self.service_name)
            .finish()
    }
}

impl StorageProvider for KeyringStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.with_entry(key, Entry::get_password)? {
            Ok(value) => Ok(Some(value)),
            Err(::keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_entry(key, |entry| entry.set_password(value))??;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match self.with_entry(key, Entry::delete_credential)? {
            Ok(()) | Err(::keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
