//! Storage backends and the keyed view used by the storage manager.
//!
//! Every backend implements [`StorageProvider`], a string key-value contract. Backends are
//! shared between all sections that select the same kind, so they take `&self` and
//! synchronize internally.

use crate::option::StorageType;
use std::sync::Arc;

pub mod cookie;
#[cfg(feature = "native")]
pub mod file;
#[cfg(feature = "keyring")]
pub mod keyring;
pub mod memory;
mod saved_object;
mod util;
#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
pub mod wasm_js;

pub use cookie::{CookieJar, CookieStorage};
#[cfg(feature = "native")]
pub use file::FileStorage;
#[cfg(feature = "keyring")]
pub use keyring::KeyringStorage;
pub use memory::MemoryStorage;
pub use saved_object::SavedObject;
pub use util::{DefaultStorageUtil, StorageUtil};

/// Default key of the `transaction` section.
pub const TRANSACTION_STORAGE_NAME: &str = "okta-transaction-storage";
/// Default key of the `token` section.
pub const TOKEN_STORAGE_NAME: &str = "okta-token-storage";
/// Default key of the `cache` section.
pub const CACHE_STORAGE_NAME: &str = "okta-cache-storage";
/// Default key of the `legacy-pkce` section.
pub const PKCE_STORAGE_NAME: &str = "okta-pkce-storage";

/// A shared handle to a storage backend.
pub type StorageHandle = Arc<dyn StorageProvider>;

/// The error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Neither an explicit storage type nor a usable candidate was found.
    #[error("Unrecognized storage option: no usable storage type was found")]
    NoUsableStorageType,
    /// The backend for a storage type cannot be used in this environment.
    #[error("Storage type \"{0}\" is not available")]
    StorageTypeUnavailable(StorageType),
    /// A value written through a keyed store did not serialize to a JSON object.
    #[error("Stored value must be a JSON object")]
    NotAnObject,
    /// A stored value could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// A value could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A file storage error.
    #[error("File error: {0}")]
    File(String),
    /// An I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// An OS keyring error.
    #[cfg(feature = "keyring")]
    #[error("Keyring error: {0}")]
    Keyring(#[from] ::keyring::Error),
    /// A browser API error.
    #[error("WebSys error: {0}")]
    WebSys(String),
}

#[cfg(all(target_family = "wasm", feature = "wasm-js"))]
impl From<wasm_bindgen::JsValue> for StorageError {
    fn from(err: wasm_bindgen::JsValue) -> Self {
        StorageError::WebSys(format!("{err:?}"))
    }
}

/// Trait for a string key-value storage backend.
pub trait StorageProvider: Send + Sync {
    /// Retrieves a stored value by key.
    ///
    /// # Returns
    /// * `Ok(Some(value))` if the key exists in storage
    /// * `Ok(None)` if the key does not exist
    /// * `Err(StorageError)` if the backend could not be read
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores a value under the given key, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a stored value. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
