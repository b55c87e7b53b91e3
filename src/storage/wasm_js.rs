//! Browser storage backends.
//!
//! This module provides `localStorage`, `sessionStorage` and `document.cookie` backends and a
//! [`StorageUtil`] that probes which of them the current page may use.

use super::{
    MemoryStorage, StorageError, StorageHandle, StorageProvider, StorageUtil,
    cookie::{decode_cookie_value, encode_cookie_value, set_cookie_string},
};
use crate::option::{CookieOptions, StorageOptions, StorageType};
use chrono::{TimeZone, Utc};
use std::sync::Arc;
#[cfg(feature = "tracing")]
use tracing::error;
use wasm_bindgen::JsCast;
use web_sys::{HtmlDocument, Storage};

const PROBE_KEY: &str = "oauth-storage-probe";

/// Which Web Storage area a [`WebStorage`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebStorageArea {
    /// `window.localStorage`
    Local,
    /// `window.sessionStorage`
    Session,
}

/// Implementation of [`StorageProvider`] over the Web Storage API.
#[derive(Debug, Clone, Copy)]
pub struct WebStorage {
    area: WebStorageArea,
}

impl WebStorage {
    /// Creates a [`WebStorage`] over `window.localStorage`.
    pub fn local() -> Self {
        Self {
            area: WebStorageArea::Local,
        }
    }

    /// Creates a [`WebStorage`] over `window.sessionStorage`.
    pub fn session() -> Self {
        Self {
            area: WebStorageArea::Session,
        }
    }

    fn storage(&self) -> Result<Storage, StorageError> {
        let window = gloo_utils::window();
        let storage = match self.area {
            WebStorageArea::Local => window.local_storage(),
            WebStorageArea::Session => window.session_storage(),
        };
        match storage {
            Ok(Some(storage)) => Ok(storage),
            Ok(None) => Err(StorageError::WebSys(format!(
                "{:?} storage not available",
                self.area
            ))),
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!("Could not find {:?} storage: {e:?}", self.area);
                Err(e.into())
            }
        }
    }
}

impl StorageProvider for WebStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.storage()?.get_item(key)?)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?.set_item(key, value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.storage()?.remove_item(key)?;
        Ok(())
    }
}

/// Implementation of [`StorageProvider`] over `document.cookie`.
#[derive(Debug, Clone)]
pub struct DocumentCookieStorage {
    options: CookieOptions,
}

impl DocumentCookieStorage {
    /// Creates a cookie backend writing cookies with the given attributes.
    pub fn new(options: CookieOptions) -> Self {
        Self { options }
    }

    fn document() -> Result<HtmlDocument, StorageError> {
        gloo_utils::document()
            .dyn_into::<HtmlDocument>()
            .map_err(|_| StorageError::WebSys("document is not an HtmlDocument".to_string()))
    }
}

impl StorageProvider for DocumentCookieStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let cookies = Self::document()?.cookie()?;
        let value = cookies.split(';').find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            (name == key).then(|| value.to_string())
        });
        match value {
            Some(value) => decode_cookie_value(&value).map(Some),
            None => Ok(None),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let cookie = set_cookie_string(key, &encode_cookie_value(value), &self.options);
        Self::document()?.set_cookie(&cookie)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let options = CookieOptions {
            expires: Utc.timestamp_opt(0, 0).single(),
            ..self.options.clone()
        };
        Self::document()?.set_cookie(&set_cookie_string(key, "", &options))?;
        Ok(())
    }
}

/// [`StorageUtil`] for browsers.
///
/// Availability of each kind is probed with a write/remove round trip, which fails when
/// storage is disabled or the page runs in a restricted embedding context.
#[derive(Debug, Clone, Default)]
pub struct WebStorageUtil {
    memory: MemoryStorage,
}

impl WebStorageUtil {
    /// Creates a new instance of [`WebStorageUtil`].
    pub fn new() -> Self {
        Self::default()
    }

    fn probe(storage: &dyn StorageProvider) -> bool {
        storage.set_item(PROBE_KEY, PROBE_KEY).is_ok()
            && matches!(storage.get_item(PROBE_KEY), Ok(Some(value)) if value == PROBE_KEY)
            && storage.remove_item(PROBE_KEY).is_ok()
    }
}

impl StorageUtil for WebStorageUtil {
    fn is_storage_type_available(&self, storage_type: StorageType) -> bool {
        match storage_type {
            StorageType::Cookie => Self::probe(&DocumentCookieStorage::new(CookieOptions::default())),
            StorageType::LocalStorage => Self::probe(&WebStorage::local()),
            StorageType::SessionStorage => Self::probe(&WebStorage::session()),
            StorageType::Memory => true,
        }
    }

    fn get_storage_by_type(
        &self,
        storage_type: StorageType,
        options: &StorageOptions,
    ) -> Result<StorageHandle, StorageError> {
        Ok(match storage_type {
            StorageType::Cookie => Arc::new(DocumentCookieStorage::new(options.cookie_options())),
            StorageType::LocalStorage => Arc::new(WebStorage::local()),
            StorageType::SessionStorage => Arc::new(WebStorage::session()),
            StorageType::Memory => Arc::new(self.memory.clone()),
        })
    }
}
