//! Cookie-kind storage.
//!
//! Values are base64url encoded before they become cookie values, so JSON payloads never
//! collide with the `;`, `,` and `"` characters that cookie syntax reserves.

use super::{StorageError, StorageProvider};
use crate::option::CookieOptions;
use base64::prelude::{BASE64_URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Encodes a value for use as a cookie value.
pub fn encode_cookie_value(value: &str) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(value.as_bytes())
}

/// Decodes a value produced by [`encode_cookie_value`].
pub fn decode_cookie_value(value: &str) -> Result<String, StorageError> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| StorageError::Decode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| StorageError::Decode(e.to_string()))
}

/// Renders a `Set-Cookie` style string for `name` with the given (already encoded) value.
pub fn set_cookie_string(name: &str, value: &str, options: &CookieOptions) -> String {
    let mut cookie = format!("{name}={value}");
    if let Some(expires) = options.expires {
        cookie.push_str("; Expires=");
        cookie.push_str(&expires.format(COOKIE_DATE_FORMAT).to_string());
    }
    if let Some(path) = &options.path {
        cookie.push_str("; Path=");
        cookie.push_str(path);
    }
    if let Some(domain) = &options.domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    if options.secure == Some(true) {
        cookie.push_str("; Secure");
    }
    if let Some(same_site) = options.same_site {
        cookie.push_str("; SameSite=");
        cookie.push_str(&same_site.to_string());
    }
    cookie
}

/// A cookie held by a [`CookieJar`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    /// The encoded cookie value.
    pub value: String,
    /// The attributes the cookie was written with.
    pub options: CookieOptions,
}

impl Cookie {
    /// Returns `true` if the cookie has an expiry at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.options.expires, Some(expires) if expires <= now)
    }
}

/// An in-process cookie jar shared by every [`CookieStorage`] built from it.
#[derive(Debug, Default, Clone)]
pub struct CookieJar {
    cookies: Arc<Mutex<HashMap<String, Cookie>>>,
}

impl CookieJar {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a cookie if it exists and has not expired. Expired cookies are evicted.
    pub fn get(&self, name: &str) -> Option<Cookie> {
        let mut cookies = self.cookies.lock();
        let expired = cookies.get(name)?.is_expired_at(Utc::now());
        if expired {
            cookies.remove(name);
            return None;
        }
        cookies.get(name).cloned()
    }

    /// Stores a cookie. A cookie that is already expired deletes any existing one instead.
    pub fn set(&self, name: &str, cookie: Cookie) {
        let mut cookies = self.cookies.lock();
        if cookie.is_expired_at(Utc::now()) {
            cookies.remove(name);
        } else {
            cookies.insert(name.to_string(), cookie);
        }
    }

    /// Deletes a cookie.
    pub fn remove(&self, name: &str) {
        self.cookies.lock().remove(name);
    }

    /// `Set-Cookie` strings for every live cookie, sorted by name.
    pub fn set_cookie_strings(&self) -> Vec<String> {
        let now = Utc::now();
        let cookies = self.cookies.lock();
        let mut names: Vec<&String> = cookies
            .iter()
            .filter(|(_, cookie)| !cookie.is_expired_at(now))
            .map(|(name, _)| name)
            .collect();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let cookie = &cookies[name];
                set_cookie_string(name, &cookie.value, &cookie.options)
            })
            .collect()
    }
}

/// Implementation of [`StorageProvider`] that writes cookies into a [`CookieJar`] with a
/// fixed set of attributes.
#[derive(Debug, Clone)]
pub struct CookieStorage {
    jar: CookieJar,
    options: CookieOptions,
}

impl CookieStorage {
    /// Creates a new instance of [`CookieStorage`].
    pub fn new(jar: CookieJar, options: CookieOptions) -> Self {
        Self { jar, options }
    }

    /// The attributes applied to written cookies.
    pub fn options(&self) -> &CookieOptions {
        &self.options
    }
}

impl StorageProvider for CookieStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.jar.get(key) {
            Some(cookie) => decode_cookie_value(&cookie.value).map(Some),
            None => Ok(None),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.jar.set(
            key,
            Cookie {
                value: encode_cookie_value(value),
                options: self.options.clone(),
            },
        );
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.jar.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::SameSite;
    use chrono::{Duration, TimeZone};

    #[test]
    fn cookie_storage_roundtrips_json() {
        let storage = CookieStorage::new(CookieJar::new(), CookieOptions::default());
        let json = r#"{"state":"a;b","nonce":"c,d"}"#;
        storage.set_item("txn", json).unwrap();
        assert_eq!(storage.get_item("txn").unwrap().as_deref(), Some(json));
        storage.remove_item("txn").unwrap();
        assert_eq!(storage.get_item("txn").unwrap(), None);
    }

    #[test]
    fn expired_cookies_read_as_missing() {
        let jar = CookieJar::new();
        jar.set(
            "old",
            Cookie {
                value: encode_cookie_value("value"),
                options: CookieOptions::default(),
            },
        );
        let expired = CookieOptions::builder()
            .expires(Utc::now() - Duration::seconds(1))
            .build();
        let storage = CookieStorage::new(jar.clone(), expired);
        storage.set_item("old", "new value").unwrap();
        assert_eq!(storage.get_item("old").unwrap(), None);
        assert!(jar.get("old").is_none());
    }

    #[test]
    fn malformed_cookie_value_is_a_decode_error() {
        let jar = CookieJar::new();
        jar.set(
            "bad",
            Cookie {
                value: "not base64!".to_string(),
                options: CookieOptions::default(),
            },
        );
        let storage = CookieStorage::new(jar, CookieOptions::default());
        assert!(matches!(
            storage.get_item("bad"),
            Err(StorageError::Decode(_))
        ));
    }

    #[test]
    fn set_cookie_string_includes_attributes() {
        let options = CookieOptions::builder()
            .secure(true)
            .same_site(SameSite::Lax)
            .path("/")
            .domain("example.com")
            .expires(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap())
            .build();
        assert_eq!(
            set_cookie_string("name", "dmFsdWU", &options),
            "name=dmFsdWU; Expires=Wed, 02 Jan 2030 03:04:05 GMT; Path=/; Domain=example.com; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn jar_lists_live_cookies() {
        let jar = CookieJar::new();
        let storage = CookieStorage::new(jar.clone(), CookieOptions::default());
        storage.set_item("b", "2").unwrap();
        storage.set_item("a", "1").unwrap();
        assert_eq!(
            jar.set_cookie_strings(),
            vec![
                format!("a={}", encode_cookie_value("1")),
                format!("b={}", encode_cookie_value("2")),
            ]
        );
    }
}
