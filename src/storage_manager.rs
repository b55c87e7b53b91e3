//! Resolution of per-section storage options into concrete storage handles.

use crate::{
    option::{CookieOptions, StorageManagerOptions, StorageOptions, StorageType},
    storage::{
        CACHE_STORAGE_NAME, PKCE_STORAGE_NAME, SavedObject, StorageError, StorageHandle,
        StorageUtil, TOKEN_STORAGE_NAME, TRANSACTION_STORAGE_NAME,
    },
};
use std::{fmt, sync::Arc};
#[cfg(feature = "tracing")]
use tracing::debug;

/// Section holding the in-flight authorization transaction.
pub const TRANSACTION_SECTION: &str = "transaction";
/// Section holding tokens.
pub const TOKEN_SECTION: &str = "token";
/// Section holding cached HTTP responses.
pub const CACHE_SECTION: &str = "cache";
/// Section holding PKCE metadata in the pre-transaction layout.
pub const LEGACY_PKCE_SECTION: &str = "legacy-pkce";

/// Returns the part of `storage_types` starting at the first occurrence of `anchor`, or
/// `None` if `anchor` is not in the list.
pub fn fallback_chain(storage_types: &[StorageType], anchor: StorageType) -> Option<&[StorageType]> {
    storage_types
        .iter()
        .position(|storage_type| *storage_type == anchor)
        .map(|idx| &storage_types[idx..])
}

/// Picks the storage backend for each section.
///
/// Options are merged from three layers, lowest precedence first: the global
/// [`CookieOptions`], the section's entry in [`StorageManagerOptions`], and the options
/// passed with the call.
#[derive(Clone)]
pub struct StorageManager {
    storage_manager_options: StorageManagerOptions,
    cookie_options: CookieOptions,
    storage_util: Arc<dyn StorageUtil>,
}

impl StorageManager {
    /// Creates a new [`StorageManager`].
    pub fn new(
        storage_manager_options: StorageManagerOptions,
        cookie_options: CookieOptions,
        storage_util: Arc<dyn StorageUtil>,
    ) -> Self {
        Self {
            storage_manager_options,
            cookie_options,
            storage_util,
        }
    }

    /// The per-section configuration.
    pub fn storage_manager_options(&self) -> &StorageManagerOptions {
        &self.storage_manager_options
    }

    /// The global cookie defaults.
    pub fn cookie_options(&self) -> &CookieOptions {
        &self.cookie_options
    }

    /// Effective options for `section_name`. Unknown sections contribute nothing.
    pub fn get_options_for_section(
        &self,
        section_name: &str,
        override_options: Option<&StorageOptions>,
    ) -> StorageOptions {
        let mut options = StorageOptions::from(&self.cookie_options);
        if let Some(section) = self.storage_manager_options.section(section_name) {
            options = options.merge(section);
        }
        if let Some(override_options) = override_options {
            options = options.merge(override_options);
        }
        options
    }

    /// Returns the storage handle described by `options`.
    ///
    /// * `storage_provider` wins outright.
    /// * If `storage_type` appears in `storage_types`, the list from that entry on is probed
    ///   and the explicit type is dropped.
    /// * Otherwise an explicit `storage_type` is used as is, without probing.
    /// * Otherwise the first usable entry of `storage_types` is used.
    ///
    /// # Errors
    ///
    /// [`StorageError::NoUsableStorageType`] if no kind can be determined.
    pub fn get_storage(&self, options: &StorageOptions) -> Result<StorageHandle, StorageError> {
        if let Some(storage_provider) = &options.storage_provider {
            return Ok(storage_provider.clone());
        }

        let mut storage_type = options.storage_type;
        let mut storage_types: &[StorageType] = options.storage_types.as_deref().unwrap_or(&[]);

        // Compatibility: an explicit type found in the list becomes the head of the fallback chain.
        if let (Some(anchor), Some(list)) = (storage_type, options.storage_types.as_deref()) {
            if let Some(chain) = fallback_chain(list, anchor) {
                storage_types = chain;
                storage_type = None;
            }
        }

        let storage_type = match storage_type {
            Some(storage_type) => storage_type,
            None => self
                .storage_util
                .find_storage_type(storage_types)
                .ok_or(StorageError::NoUsableStorageType)?,
        };

        #[cfg(feature = "tracing")]
        debug!("Selected storage type {storage_type}");

        self.storage_util.get_storage_by_type(storage_type, options)
    }

    /// Storage for the in-flight transaction (state, nonce, PKCE verifier, interaction handle).
    pub fn get_transaction_storage(
        &self,
        options: Option<&StorageOptions>,
    ) -> Result<SavedObject, StorageError> {
        self.saved_object(TRANSACTION_SECTION, TRANSACTION_STORAGE_NAME, options)
    }

    /// Storage for access, ID and refresh tokens.
    pub fn get_token_storage(
        &self,
        options: Option<&StorageOptions>,
    ) -> Result<SavedObject, StorageError> {
        self.saved_object(TOKEN_SECTION, TOKEN_STORAGE_NAME, options)
    }

    /// Storage for cached HTTP responses such as the well-known configuration.
    pub fn get_http_cache(&self, options: Option<&StorageOptions>) -> Result<SavedObject, StorageError> {
        self.saved_object(CACHE_SECTION, CACHE_STORAGE_NAME, options)
    }

    /// Storage for PKCE metadata written by older integrations.
    pub fn get_legacy_pkce_storage(
        &self,
        options: Option<&StorageOptions>,
    ) -> Result<SavedObject, StorageError> {
        self.saved_object(LEGACY_PKCE_SECTION, PKCE_STORAGE_NAME, options)
    }

    fn saved_object(
        &self,
        section_name: &str,
        default_key: &str,
        options: Option<&StorageOptions>,
    ) -> Result<SavedObject, StorageError> {
        let options = self.get_options_for_section(section_name, options);
        let storage = self.get_storage(&options)?;
        let storage_key = options
            .storage_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .unwrap_or(default_key);
        Ok(SavedObject::new(storage, storage_key))
    }
}

impl fmt::Debug for StorageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageManager")
            .field("storage_manager_options", &self.storage_manager_options)
            .field("cookie_options", &self.cookie_options)
            .finish()
    }
}
