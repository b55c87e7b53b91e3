use super::{CookieJar, CookieStorage, MemoryStorage, StorageError, StorageHandle};
#[cfg(feature = "native")]
use super::FileStorage;
use crate::option::{StorageOptions, StorageType};
use std::sync::Arc;

/// Capability probing and backend construction for each [`StorageType`].
///
/// The [`StorageManager`](crate::StorageManager) decides *which* kind a section uses;
/// implementations of this trait decide whether a kind is usable in the current environment
/// and build the handle for it.
pub trait StorageUtil: Send + Sync {
    /// Returns `true` if `storage_type` can be used in the current environment.
    fn is_storage_type_available(&self, storage_type: StorageType) -> bool;

    /// Returns the first usable kind of `storage_types`, in order.
    fn find_storage_type(&self, storage_types: &[StorageType]) -> Option<StorageType> {
        storage_types
            .iter()
            .copied()
            .find(|storage_type| self.is_storage_type_available(*storage_type))
    }

    /// Builds the backend handle for `storage_type`. Cookie backends take their attributes
    /// from `options`.
    fn get_storage_by_type(
        &self,
        storage_type: StorageType,
        options: &StorageOptions,
    ) -> Result<StorageHandle, StorageError>;
}

/// [`StorageUtil`] for native environments.
///
/// Holds one shared backend per kind, so every section that selects the same kind shares
/// one store:
///
/// * `cookie` - a [`CookieJar`], with the attributes of the requesting section
/// * `localStorage` - any durable backend, such as a `FileStorage`; memory by default
/// * `sessionStorage` and `memory` - separate [`MemoryStorage`] instances
#[derive(Clone, bon::Builder)]
pub struct DefaultStorageUtil {
    #[builder(default)]
    cookies: CookieJar,
    #[builder(default = Arc::new(MemoryStorage::new()) as StorageHandle)]
    local: StorageHandle,
    #[builder(default)]
    session: MemoryStorage,
    #[builder(default)]
    memory: MemoryStorage,
    /// Kinds reported as unusable regardless of the backend.
    #[builder(default)]
    disabled: Vec<StorageType>,
}

impl DefaultStorageUtil {
    /// Creates a [`DefaultStorageUtil`] where every kind lives in memory.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a [`DefaultStorageUtil`] whose `localStorage` kind persists to `directory`.
    #[cfg(feature = "native")]
    pub fn with_directory<P: Into<std::path::PathBuf>>(directory: P) -> Self {
        Self::builder()
            .local(Arc::new(FileStorage::new(directory)))
            .build()
    }

    /// The cookie jar backing the `cookie` kind.
    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookies
    }
}

impl Default for DefaultStorageUtil {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DefaultStorageUtil {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultStorageUtil")
            .field("disabled", &self.disabled)
            .finish()
    }
}

impl StorageUtil for DefaultStorageUtil {
    fn is_storage_type_available(&self, storage_type: StorageType) -> bool {
        !self.disabled.contains(&storage_type)
    }

    fn get_storage_by_type(
        &self,
        storage_type: StorageType,
        options: &StorageOptions,
    ) -> Result<StorageHandle, StorageError> {
        if !self.is_storage_type_available(storage_type) {
            return Err(StorageError::StorageTypeUnavailable(storage_type));
        }
        Ok(match storage_type {
            StorageType::Cookie => Arc::new(CookieStorage::new(
                self.cookies.clone(),
                options.cookie_options(),
            )),
            StorageType::LocalStorage => self.local.clone(),
            StorageType::SessionStorage => Arc::new(self.session.clone()),
            StorageType::Memory => Arc::new(self.memory.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageProvider;

    #[test]
    fn find_storage_type_skips_disabled_kinds() {
        let util = DefaultStorageUtil::builder()
            .disabled(vec![StorageType::LocalStorage, StorageType::Cookie])
            .build();
        assert_eq!(
            util.find_storage_type(&[
                StorageType::LocalStorage,
                StorageType::Cookie,
                StorageType::SessionStorage,
            ]),
            Some(StorageType::SessionStorage)
        );
        assert_eq!(util.find_storage_type(&[StorageType::LocalStorage]), None);
        assert_eq!(util.find_storage_type(&[]), None);
    }

    #[test]
    fn same_kind_shares_one_backend() {
        let util = DefaultStorageUtil::new();
        let options = StorageOptions::default();
        let a = util
            .get_storage_by_type(StorageType::SessionStorage, &options)
            .unwrap();
        let b = util
            .get_storage_by_type(StorageType::SessionStorage, &options)
            .unwrap();
        a.set_item("key", "value").unwrap();
        assert_eq!(b.get_item("key").unwrap().as_deref(), Some("value"));

        let memory = util
            .get_storage_by_type(StorageType::Memory, &options)
            .unwrap();
        assert_eq!(memory.get_item("key").unwrap(), None);
    }

    #[test]
    fn cookie_backend_uses_section_attributes() {
        let util = DefaultStorageUtil::new();
        let options = StorageOptions::builder().secure(true).path("/app").build();
        let cookie = util
            .get_storage_by_type(StorageType::Cookie, &options)
            .unwrap();
        cookie.set_item("c", "v").unwrap();
        let written = util.cookie_jar().get("c").unwrap();
        assert_eq!(written.options.secure, Some(true));
        assert_eq!(written.options.path.as_deref(), Some("/app"));
    }

    #[test]
    fn disabled_kind_cannot_be_built() {
        let util = DefaultStorageUtil::builder()
            .disabled(vec![StorageType::Cookie])
            .build();
        assert!(matches!(
            util.get_storage_by_type(StorageType::Cookie, &StorageOptions::default()),
            Err(StorageError::StorageTypeUnavailable(StorageType::Cookie))
        ));
    }

    #[cfg(feature = "native")]
    #[test]
    fn local_storage_persists_to_directory() {
        let dir = crate::storage::file::tests::temp_directory();
        let util = DefaultStorageUtil::with_directory(dir.clone());
        let local = util
            .get_storage_by_type(StorageType::LocalStorage, &StorageOptions::default())
            .unwrap();
        local.set_item("durable", "yes").unwrap();
        assert_eq!(
            FileStorage::new(dir.clone())
                .get_item("durable")
                .unwrap()
                .as_deref(),
            Some("yes")
        );
        let _ = std::fs::remove_dir_all(dir);
    }
}
