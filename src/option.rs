//! Storage configuration types.
//!
//! Options are layered: the global [`CookieOptions`], the per-section entries of
//! [`StorageManagerOptions`], and the options passed with a single call. The
//! [`StorageManager`](crate::StorageManager) merges them into one effective
//! [`StorageOptions`] value with [`StorageOptions::merge`].

use crate::storage::StorageHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};

const COOKIE_LABEL: &str = "cookie";
const LOCAL_STORAGE_LABEL: &str = "localStorage";
const SESSION_STORAGE_LABEL: &str = "sessionStorage";
const MEMORY_LABEL: &str = "memory";

/// The kind of physical storage backing a section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageType {
    /// Browser cookies, or a cookie jar on native targets.
    Cookie,
    /// Durable key-value storage.
    LocalStorage,
    /// Key-value storage scoped to the current session.
    SessionStorage,
    /// Process memory.
    Memory,
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Cookie => write!(f, "{}", COOKIE_LABEL),
            StorageType::LocalStorage => write!(f, "{}", LOCAL_STORAGE_LABEL),
            StorageType::SessionStorage => write!(f, "{}", SESSION_STORAGE_LABEL),
            StorageType::Memory => write!(f, "{}", MEMORY_LABEL),
        }
    }
}

impl std::str::FromStr for StorageType {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            COOKIE_LABEL => Ok(StorageType::Cookie),
            LOCAL_STORAGE_LABEL => Ok(StorageType::LocalStorage),
            SESSION_STORAGE_LABEL => Ok(StorageType::SessionStorage),
            MEMORY_LABEL => Ok(StorageType::Memory),
            _ => Err(()),
        }
    }
}

/// The `SameSite` attribute of a cookie.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    /// `SameSite=Strict`
    Strict,
    /// `SameSite=Lax`
    Lax,
    /// `SameSite=None`
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// Global cookie defaults, the lowest-precedence layer of every section's options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct CookieOptions {
    /// Only send the cookie over HTTPS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// The `SameSite` policy of the cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// The `Path` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// The `Domain` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// When the cookie expires. Session cookie if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

/// Storage options for a section or a single call.
///
/// Every field is optional. A field that is set in a higher-precedence layer replaces the
/// value from lower layers; see [`StorageOptions::merge`].
#[derive(Clone, Default, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct StorageOptions {
    /// A pre-built storage handle. When present, backend selection is skipped entirely.
    #[serde(skip)]
    pub storage_provider: Option<StorageHandle>,

    /// A single desired backend kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<StorageType>,

    /// Candidate backend kinds in order of preference. The first usable one wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_types: Option<Vec<StorageType>>,

    /// Overrides the default key of the section.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_key: Option<String>,

    /// Cookie `Secure` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    /// Cookie `SameSite` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    /// Cookie `Path` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Cookie `Domain` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Cookie expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl StorageOptions {
    /// Returns a new set of options where every field set in `other` replaces the one in
    /// `self`. Neither input is modified.
    pub fn merge(&self, other: &StorageOptions) -> StorageOptions {
        StorageOptions {
            storage_provider: other
                .storage_provider
                .clone()
                .or_else(|| self.storage_provider.clone()),
            storage_type: other.storage_type.or(self.storage_type),
            storage_types: other
                .storage_types
                .clone()
                .or_else(|| self.storage_types.clone()),
            storage_key: other.storage_key.clone().or_else(|| self.storage_key.clone()),
            secure: other.secure.or(self.secure),
            same_site: other.same_site.or(self.same_site),
            path: other.path.clone().or_else(|| self.path.clone()),
            domain: other.domain.clone().or_else(|| self.domain.clone()),
            expires: other.expires.or(self.expires),
        }
    }

    /// The cookie attributes carried by these options.
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            secure: self.secure,
            same_site: self.same_site,
            path: self.path.clone(),
            domain: self.domain.clone(),
            expires: self.expires,
        }
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.storage_provider.is_none()
            && self.storage_type.is_none()
            && self.storage_types.is_none()
            && self.storage_key.is_none()
            && self.secure.is_none()
            && self.same_site.is_none()
            && self.path.is_none()
            && self.domain.is_none()
            && self.expires.is_none()
    }
}

impl From<CookieOptions> for StorageOptions {
    fn from(cookie: CookieOptions) -> Self {
        StorageOptions {
            secure: cookie.secure,
            same_site: cookie.same_site,
            path: cookie.path,
            domain: cookie.domain,
            expires: cookie.expires,
            ..Default::default()
        }
    }
}

impl From<&CookieOptions> for StorageOptions {
    fn from(cookie: &CookieOptions) -> Self {
        StorageOptions::from(cookie.clone())
    }
}

impl PartialEq for StorageOptions {
    fn eq(&self, other: &Self) -> bool {
        let same_provider = match (&self.storage_provider, &other.storage_provider) {
            (Some(a), Some(b)) => std::sync::Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_provider
            && self.storage_type == other.storage_type
            && self.storage_types == other.storage_types
            && self.storage_key == other.storage_key
            && self.secure == other.secure
            && self.same_site == other.same_site
            && self.path == other.path
            && self.domain == other.domain
            && self.expires == other.expires
    }
}

impl fmt::Debug for StorageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageOptions")
            .field("storage_provider", &self.storage_provider.is_some())
            .field("storage_type", &self.storage_type)
            .field("storage_types", &self.storage_types)
            .field("storage_key", &self.storage_key)
            .field("secure", &self.secure)
            .field("same_site", &self.same_site)
            .field("path", &self.path)
            .field("domain", &self.domain)
            .field("expires", &self.expires)
            .finish()
    }
}

/// Per-section storage configuration, keyed by section name.
///
/// The sections used by this crate are `transaction`, `token`, `cache` and `legacy-pkce`,
/// but any name may be configured. Unknown names resolve to empty options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageManagerOptions(HashMap<String, StorageOptions>);

impl StorageManagerOptions {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration such as `{"token": {"storageType": "memory"}}`.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets the options of a section, returning the updated configuration.
    pub fn with_section<T: Into<String>>(mut self, name: T, options: StorageOptions) -> Self {
        self.0.insert(name.into(), options);
        self
    }

    /// Sets the options of a section.
    pub fn insert<T: Into<String>>(&mut self, name: T, options: StorageOptions) {
        self.0.insert(name.into(), options);
    }

    /// Returns the options configured for a section, if any.
    pub fn section(&self, name: &str) -> Option<&StorageOptions> {
        self.0.get(name)
    }
}

impl From<HashMap<String, StorageOptions>> for StorageManagerOptions {
    fn from(sections: HashMap<String, StorageOptions>) -> Self {
        StorageManagerOptions(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_test::{Token, assert_tokens};

    #[test]
    fn storage_type_serializes_with_browser_names() {
        assert_tokens(
            &StorageType::LocalStorage,
            &[Token::UnitVariant {
                name: "StorageType",
                variant: "localStorage",
            }],
        );
        assert_tokens(
            &StorageType::SessionStorage,
            &[Token::UnitVariant {
                name: "StorageType",
                variant: "sessionStorage",
            }],
        );
        assert_tokens(
            &SameSite::None,
            &[Token::UnitVariant {
                name: "SameSite",
                variant: "none",
            }],
        );
    }

    #[test]
    fn storage_type_display_matches_from_str() {
        for kind in [
            StorageType::Cookie,
            StorageType::LocalStorage,
            StorageType::SessionStorage,
            StorageType::Memory,
        ] {
            assert_eq!(kind.to_string().parse::<StorageType>(), Ok(kind));
        }
        assert!("indexedDB".parse::<StorageType>().is_err());
    }

    #[test]
    fn merge_prefers_later_layer_and_keeps_inputs() {
        let base = StorageOptions::builder()
            .storage_type(StorageType::Memory)
            .secure(true)
            .build();
        let over = StorageOptions::builder()
            .storage_key("custom")
            .secure(false)
            .build();

        let merged = base.merge(&over);
        assert_eq!(merged.storage_type, Some(StorageType::Memory));
        assert_eq!(merged.storage_key.as_deref(), Some("custom"));
        assert_eq!(merged.secure, Some(false));

        assert_eq!(base.secure, Some(true));
        assert!(base.storage_key.is_none());
        assert_eq!(over.storage_type, None);
    }

    #[test]
    fn manager_options_parse_from_json() {
        let options = StorageManagerOptions::from_json_str(
            r#"{
                "token": { "storageType": "memory" },
                "transaction": { "storageTypes": ["sessionStorage", "cookie"], "sameSite": "lax" }
            }"#,
        )
        .unwrap();

        let token = options.section("token").unwrap();
        assert_eq!(token.storage_type, Some(StorageType::Memory));

        let transaction = options.section("transaction").unwrap();
        assert_eq!(
            transaction.storage_types,
            Some(vec![StorageType::SessionStorage, StorageType::Cookie])
        );
        assert_eq!(transaction.same_site, Some(SameSite::Lax));
        assert!(options.section("cache").is_none());
    }

    #[test]
    fn cookie_options_convert_to_storage_options() {
        let cookie = CookieOptions::builder()
            .secure(true)
            .path("/")
            .build();
        let options = StorageOptions::from(&cookie);
        assert_eq!(options.secure, Some(true));
        assert_eq!(options.path.as_deref(), Some("/"));
        assert_eq!(options.cookie_options(), cookie);
        assert!(options.storage_type.is_none());
    }
}
