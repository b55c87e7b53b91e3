use super::{StorageError, StorageHandle};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
#[cfg(feature = "tracing")]
use tracing::error;

/// A storage handle bound to a single key, holding one JSON object.
///
/// Reads never fail: a missing value, a backend read error, or anything that is not a JSON
/// object reads as an empty map, so first-run and corrupted state look the same to callers.
#[derive(Clone)]
pub struct SavedObject {
    storage: StorageHandle,
    storage_name: String,
}

impl SavedObject {
    /// Binds `storage` to `storage_name`.
    pub fn new<T: Into<String>>(storage: StorageHandle, storage_name: T) -> Self {
        Self {
            storage,
            storage_name: storage_name.into(),
        }
    }

    /// The key this object is stored under.
    pub fn storage_key(&self) -> &str {
        &self.storage_name
    }

    /// The backend this object is stored in.
    pub fn storage(&self) -> &StorageHandle {
        &self.storage
    }

    /// Reads the stored object, or an empty map if there is none.
    pub fn get_storage(&self) -> Map<String, Value> {
        let raw = match self.storage.get_item(&self.storage_name) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Map::new(),
            Err(_e) => {
                #[cfg(feature = "tracing")]
                error!("Could not read \"{}\" from storage: {_e}", self.storage_name);
                return Map::new();
            }
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                #[cfg(feature = "tracing")]
                error!("Ignoring malformed value stored under \"{}\"", self.storage_name);
                Map::new()
            }
        }
    }

    /// Replaces the stored object. `value` must serialize to a JSON object.
    pub fn set_storage<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), StorageError> {
        match serde_json::to_value(value)? {
            Value::Object(map) => self.write(&map),
            _ => Err(StorageError::NotAnObject),
        }
    }

    /// Sets a single field of the stored object, keeping the others.
    pub fn update_storage<K: Into<String>>(&self, key: K, value: Value) -> Result<(), StorageError> {
        let mut map = self.get_storage();
        map.insert(key.into(), value);
        self.write(&map)
    }

    /// Removes the stored object. Clearing a missing object is not an error.
    pub fn clear_storage(&self) -> Result<(), StorageError> {
        self.storage.remove_item(&self.storage_name)
    }

    fn write(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(map)?;
        self.storage.set_item(&self.storage_name, &serialized)
    }
}

impl fmt::Debug for SavedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SavedObject")
            .field("storage_name", &self.storage_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageProvider};
    use serde_json::json;
    use std::sync::Arc;

    struct BrokenStorage;

    impl StorageProvider for BrokenStorage {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::WebSys("storage disabled".to_string()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::WebSys("storage disabled".to_string()))
        }

        fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    fn setup() -> (MemoryStorage, SavedObject) {
        let memory = MemoryStorage::new();
        let saved = SavedObject::new(Arc::new(memory.clone()), "test-key");
        (memory, saved)
    }

    #[test]
    fn missing_value_reads_as_empty_object() {
        let (_, saved) = setup();
        assert!(saved.get_storage().is_empty());
    }

    #[test]
    fn malformed_values_read_as_empty_object() {
        let (memory, saved) = setup();
        memory.set_item("test-key", "{not json").unwrap();
        assert!(saved.get_storage().is_empty());
        memory.set_item("test-key", "[1,2,3]").unwrap();
        assert!(saved.get_storage().is_empty());
        memory.set_item("test-key", "\"text\"").unwrap();
        assert!(saved.get_storage().is_empty());
    }

    #[test]
    fn backend_read_errors_read_as_empty_object() {
        let saved = SavedObject::new(Arc::new(BrokenStorage), "test-key");
        assert!(saved.get_storage().is_empty());
        assert!(saved.set_storage(&json!({ "a": "b" })).is_err());
    }

    #[test]
    fn set_get_and_clear() {
        let (memory, saved) = setup();
        saved
            .set_storage(&json!({ "redirectUri": "http://localhost", "scopes": ["openid"] }))
            .unwrap();
        let stored = saved.get_storage();
        assert_eq!(stored["redirectUri"], "http://localhost");
        assert_eq!(stored["scopes"], json!(["openid"]));
        assert!(memory.get_item("test-key").unwrap().is_some());

        saved.clear_storage().unwrap();
        assert!(saved.get_storage().is_empty());
        saved.clear_storage().unwrap();
    }

    #[test]
    fn set_storage_rejects_non_objects() {
        let (_, saved) = setup();
        assert!(matches!(
            saved.set_storage(&json!("just a string")),
            Err(StorageError::NotAnObject)
        ));
    }

    #[test]
    fn update_storage_keeps_other_fields() {
        let (_, saved) = setup();
        saved.set_storage(&json!({ "idToken": "a" })).unwrap();
        saved.update_storage("accessToken", json!("b")).unwrap();
        assert_eq!(
            Value::Object(saved.get_storage()),
            json!({ "idToken": "a", "accessToken": "b" })
        );
    }
}
