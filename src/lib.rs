//! Storage selection and authorization transaction lifecycle for OAuth/OIDC client libraries.
//!
//! A [`StorageManager`] resolves, for each named section (transaction, tokens, HTTP cache and
//! legacy PKCE metadata), which backend to use and under which key. A [`TransactionManager`]
//! builds on it to save, load and clear the state of an in-progress authorization flow.
//!
//! # Example
//!
//! ```rust
//! use oauth_client_storage::{
//!     CookieOptions, DefaultStorageUtil, StorageManager, StorageManagerOptions, StorageOptions,
//!     StorageType, TransactionManager,
//!     transaction::{AuthTransaction, PkceTransaction},
//! };
//! use std::sync::Arc;
//!
//! let options = StorageManagerOptions::new().with_section(
//!     "transaction",
//!     StorageOptions::builder()
//!         .storage_types(vec![StorageType::SessionStorage, StorageType::Memory])
//!         .build(),
//! );
//! let storage_manager = StorageManager::new(
//!     options,
//!     CookieOptions::default(),
//!     Arc::new(DefaultStorageUtil::new()),
//! );
//! let transactions = TransactionManager::new(storage_manager);
//!
//! let transaction = AuthTransaction::from(
//!     PkceTransaction::builder()
//!         .redirect_uri("http://localhost/callback")
//!         .code_verifier("verifier")
//!         .build(),
//! );
//! transactions.save(&transaction).unwrap();
//! assert_eq!(transactions.load().unwrap(), transaction);
//! transactions.clear().unwrap();
//! ```

pub mod option;
pub mod storage;
pub mod storage_manager;
pub mod transaction;
pub mod transaction_manager;
mod util;

pub use option::{CookieOptions, SameSite, StorageManagerOptions, StorageOptions, StorageType};
pub use storage::{
    DefaultStorageUtil, SavedObject, StorageError, StorageHandle, StorageProvider, StorageUtil,
};
pub use storage_manager::StorageManager;
pub use transaction::AuthTransaction;
pub use transaction_manager::{TransactionError, TransactionManager};
pub use util::callback;
