//! Authorization transaction types.
//!
//! An [`AuthTransaction`] holds what is needed to validate an OAuth/OIDC redirect callback.
//! The variant is fixed when the value is built and stored alongside it as a `kind` field.
//! Values written without a `kind` (by older writers, or in the legacy PKCE layout) are
//! classified once, when read, by the structural checks in this module:
//!
//! - [`is_oauth_transaction`] - a non-empty `redirectUri`
//! - [`is_pkce_transaction`] - OAuth-shaped with a non-empty `codeVerifier`
//! - [`is_idx_transaction`] - PKCE-shaped with a non-empty `interactionHandle`
//! - [`is_custom_auth_transaction`] - a non-empty object of string values only
//!
//! # Examples
//!
//! ```rust
//! use oauth_client_storage::transaction::{AuthTransaction, PkceTransaction};
//!
//! let transaction = AuthTransaction::from(
//!     PkceTransaction::builder()
//!         .redirect_uri("http://localhost/callback")
//!         .code_verifier("verifier")
//!         .build(),
//! );
//! assert_eq!(transaction.code_verifier(), Some("verifier"));
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const KIND_FIELD: &str = "kind";
const REDIRECT_URI_FIELD: &str = "redirectUri";
const CODE_VERIFIER_FIELD: &str = "codeVerifier";
const INTERACTION_HANDLE_FIELD: &str = "interactionHandle";
const TYPED_FIELDS: [&str; 7] = [
    REDIRECT_URI_FIELD,
    "state",
    "nonce",
    CODE_VERIFIER_FIELD,
    "codeChallenge",
    "codeChallengeMethod",
    INTERACTION_HANDLE_FIELD,
];

/// State for a plain OAuth/OIDC redirect flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct OAuthTransaction {
    /// Where the authorization server redirects back to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub redirect_uri: String,
    /// The `state` sent with the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// The `nonce` sent with the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Fields this crate does not interpret, kept as stored.
    #[serde(flatten)]
    #[builder(default)]
    pub extra: Map<String, Value>,
}

/// State for an authorization code flow with PKCE.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct PkceTransaction {
    /// Where the authorization server redirects back to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub redirect_uri: String,
    /// The `state` sent with the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// The `nonce` sent with the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// The PKCE code verifier, sent with the token request.
    pub code_verifier: String,
    /// The PKCE code challenge derived from the verifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,
    /// How the challenge was derived, usually `S256`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
    /// Fields this crate does not interpret, kept as stored.
    #[serde(flatten)]
    #[builder(default)]
    pub extra: Map<String, Value>,
}

/// State for an interaction-code (IDX) flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(rename_all = "camelCase")]
#[builder(on(String, into))]
pub struct IdxTransaction {
    /// Where the authorization server redirects back to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub redirect_uri: String,
    /// The `state` sent with the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// The `nonce` sent with the authorization request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// The PKCE code verifier, sent with the token request.
    pub code_verifier: String,
    /// The PKCE code challenge derived from the verifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,
    /// How the challenge was derived, usually `S256`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
    /// Handle of the ongoing interaction.
    pub interaction_handle: String,
    /// Fields this crate does not interpret, kept as stored.
    #[serde(flatten)]
    #[builder(default)]
    pub extra: Map<String, Value>,
}

/// A transaction with no recognized shape: a flat map of strings.
pub type CustomAuthTransaction = BTreeMap<String, String>;

/// The state of an in-progress authorization flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AuthTransaction {
    /// See [`OAuthTransaction`].
    OAuth(OAuthTransaction),
    /// See [`PkceTransaction`].
    Pkce(PkceTransaction),
    /// See [`IdxTransaction`].
    Idx(IdxTransaction),
    /// See [`CustomAuthTransaction`].
    Custom(CustomAuthTransaction),
}

impl AuthTransaction {
    /// Builds a transaction from a stored object.
    ///
    /// A valid `kind` field decides the variant. Otherwise the variant is derived from the
    /// fields present. Returns `None` only if the object does not qualify as a transaction
    /// (see [`is_auth_transaction`]). Known fields holding a value of the wrong JSON type are
    /// kept in `extra`.
    ///
    /// A [`CustomAuthTransaction`] must not use `kind` as one of its own keys.
    pub fn from_stored(map: &Map<String, Value>) -> Option<Self> {
        if !is_auth_transaction(map) {
            return None;
        }
        let mut fields = map.clone();
        fields.remove(KIND_FIELD);
        if let Some(kind) = map.get(KIND_FIELD).and_then(Value::as_str) {
            let tagged = match kind {
                "oauth" => deserialize_lenient(&fields).map(AuthTransaction::OAuth),
                "pkce" => deserialize_lenient(&fields).map(AuthTransaction::Pkce),
                "idx" => deserialize_lenient(&fields).map(AuthTransaction::Idx),
                "custom" => custom_from_map(&fields).map(AuthTransaction::Custom),
                _ => None,
            };
            if tagged.is_some() {
                return tagged;
            }
        }
        classify(&fields).or_else(|| classify(map))
    }

    /// Builds a transaction from PKCE metadata stored in the legacy layout.
    ///
    /// Returns `None` unless the object has a non-empty `codeVerifier`.
    pub fn from_legacy_pkce(map: &Map<String, Value>) -> Option<Self> {
        if !has_non_empty_string(map, CODE_VERIFIER_FIELD) {
            return None;
        }
        if has_non_empty_string(map, INTERACTION_HANDLE_FIELD) {
            if let Some(idx) = deserialize_lenient(map) {
                return Some(AuthTransaction::Idx(idx));
            }
        }
        deserialize_lenient(map).map(AuthTransaction::Pkce)
    }

    /// The redirect URI, if this variant carries one.
    pub fn redirect_uri(&self) -> Option<&str> {
        let uri = match self {
            AuthTransaction::OAuth(t) => t.redirect_uri.as_str(),
            AuthTransaction::Pkce(t) => t.redirect_uri.as_str(),
            AuthTransaction::Idx(t) => t.redirect_uri.as_str(),
            AuthTransaction::Custom(map) => return map.get(REDIRECT_URI_FIELD).map(String::as_str),
        };
        (!uri.is_empty()).then_some(uri)
    }

    /// The PKCE code verifier, if this variant carries one.
    pub fn code_verifier(&self) -> Option<&str> {
        match self {
            AuthTransaction::OAuth(_) => None,
            AuthTransaction::Pkce(t) => Some(t.code_verifier.as_str()),
            AuthTransaction::Idx(t) => Some(t.code_verifier.as_str()),
            AuthTransaction::Custom(map) => map.get(CODE_VERIFIER_FIELD).map(String::as_str),
        }
    }

    /// The `state` parameter, if known.
    pub fn state(&self) -> Option<&str> {
        match self {
            AuthTransaction::OAuth(t) => t.state.as_deref(),
            AuthTransaction::Pkce(t) => t.state.as_deref(),
            AuthTransaction::Idx(t) => t.state.as_deref(),
            AuthTransaction::Custom(map) => map.get("state").map(String::as_str),
        }
    }
}

impl From<OAuthTransaction> for AuthTransaction {
    fn from(value: OAuthTransaction) -> Self {
        AuthTransaction::OAuth(value)
    }
}

impl From<PkceTransaction> for AuthTransaction {
    fn from(value: PkceTransaction) -> Self {
        AuthTransaction::Pkce(value)
    }
}

impl From<IdxTransaction> for AuthTransaction {
    fn from(value: IdxTransaction) -> Self {
        AuthTransaction::Idx(value)
    }
}

impl From<CustomAuthTransaction> for AuthTransaction {
    fn from(value: CustomAuthTransaction) -> Self {
        AuthTransaction::Custom(value)
    }
}

/// Variant structs that keep unrecognized fields.
trait Passthrough: DeserializeOwned {
    fn extra_mut(&mut self) -> &mut Map<String, Value>;
}

impl Passthrough for OAuthTransaction {
    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

impl Passthrough for PkceTransaction {
    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

impl Passthrough for IdxTransaction {
    fn extra_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.extra
    }
}

/// Deserializes `map` into `T`. Typed fields that are not strings move into `extra`, so a
/// stray value such as `"state": 42` does not discard the transaction.
fn deserialize_lenient<T: Passthrough>(map: &Map<String, Value>) -> Option<T> {
    if let Ok(value) = serde_json::from_value(Value::Object(map.clone())) {
        return Some(value);
    }
    let (typed, mistyped): (Map<String, Value>, Map<String, Value>) = map
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .partition(|(key, value)| !TYPED_FIELDS.contains(&key.as_str()) || value.is_string());
    let mut value: T = serde_json::from_value(Value::Object(typed)).ok()?;
    value.extra_mut().extend(mistyped);
    Some(value)
}

fn classify(map: &Map<String, Value>) -> Option<AuthTransaction> {
    if is_idx_transaction(map) {
        if let Some(idx) = deserialize_lenient(map) {
            return Some(AuthTransaction::Idx(idx));
        }
    }
    if is_pkce_transaction(map) {
        if let Some(pkce) = deserialize_lenient(map) {
            return Some(AuthTransaction::Pkce(pkce));
        }
    }
    if is_oauth_transaction(map) {
        if let Some(oauth) = deserialize_lenient(map) {
            return Some(AuthTransaction::OAuth(oauth));
        }
    }
    if is_custom_auth_transaction(map) {
        return custom_from_map(map).map(AuthTransaction::Custom);
    }
    None
}

fn custom_from_map(map: &Map<String, Value>) -> Option<CustomAuthTransaction> {
    map.iter()
        .map(|(key, value)| value.as_str().map(|value| (key.clone(), value.to_string())))
        .collect()
}

fn has_non_empty_string(map: &Map<String, Value>, field: &str) -> bool {
    matches!(map.get(field), Some(Value::String(value)) if !value.is_empty())
}

/// Returns `true` for a non-empty object with a non-empty `redirectUri`.
pub fn is_oauth_transaction(map: &Map<String, Value>) -> bool {
    !map.is_empty() && has_non_empty_string(map, REDIRECT_URI_FIELD)
}

/// Returns `true` for an OAuth-shaped object with a non-empty `codeVerifier`.
pub fn is_pkce_transaction(map: &Map<String, Value>) -> bool {
    is_oauth_transaction(map) && has_non_empty_string(map, CODE_VERIFIER_FIELD)
}

/// Returns `true` for a PKCE-shaped object with a non-empty `interactionHandle`.
pub fn is_idx_transaction(map: &Map<String, Value>) -> bool {
    is_pkce_transaction(map) && has_non_empty_string(map, INTERACTION_HANDLE_FIELD)
}

/// Returns `true` for a non-empty object whose values are all strings.
pub fn is_custom_auth_transaction(map: &Map<String, Value>) -> bool {
    !map.is_empty() && map.values().all(Value::is_string)
}

/// Returns `true` if the object qualifies as any [`AuthTransaction`].
pub fn is_auth_transaction(map: &Map<String, Value>) -> bool {
    is_oauth_transaction(map) || is_custom_auth_transaction(map)
}
