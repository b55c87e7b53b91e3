//! Lifecycle of the in-flight authorization transaction.

use crate::{
    callback::OnOverlap,
    option::{StorageOptions, StorageType},
    storage::{SavedObject, StorageError},
    storage_manager::StorageManager,
    transaction::{AuthTransaction, is_auth_transaction},
};
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Errors from [`TransactionManager`].
#[derive(Error, Debug)]
pub enum TransactionError {
    /// No transaction was found in any location.
    #[error(
        "Could not load PKCE codeVerifier from storage. This may indicate the auth flow has already completed or multiple auth flows are executing concurrently."
    )]
    NotFound,
    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The transaction could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Saves, loads and clears the transaction of the current authorization flow.
///
/// Besides the transaction section, [`load`](Self::load) and [`clear`](Self::clear) also look at
/// PKCE metadata stored by older integrations: first in durable (`localStorage`) storage, then
/// in session storage.
#[derive(Debug, Clone)]
pub struct TransactionManager {
    storage_manager: StorageManager,
    on_overlap: Option<OnOverlap>,
}

impl TransactionManager {
    /// Creates a new [`TransactionManager`].
    pub fn new(storage_manager: StorageManager) -> Self {
        Self {
            storage_manager,
            on_overlap: None,
        }
    }

    /// Sets the callback run when [`save`](Self::save) replaces a transaction in progress.
    pub fn with_on_overlap<F: Into<OnOverlap>>(mut self, on_overlap: F) -> Self {
        self.on_overlap = Some(on_overlap.into());
        self
    }

    /// The [`StorageManager`] this manager resolves its storage with.
    pub fn storage_manager(&self) -> &StorageManager {
        &self.storage_manager
    }

    /// Removes the transaction and any legacy PKCE metadata.
    ///
    /// Clearing when nothing is stored succeeds. Legacy locations whose backend is unavailable
    /// are skipped.
    pub fn clear(&self) -> Result<(), TransactionError> {
        self.transaction_storage()?.clear_storage()?;
        for legacy in self.legacy_storages() {
            match legacy {
                Ok(legacy) => legacy.clear_storage()?,
                Err(StorageError::StorageTypeUnavailable(_storage_type)) => {
                    #[cfg(feature = "tracing")]
                    debug!("Legacy PKCE storage in {_storage_type} is unavailable, nothing to clear");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Stores `transaction`, replacing whatever was stored before.
    ///
    /// Legacy PKCE metadata is cleared too. If a valid transaction is already stored, the flow
    /// it belongs to is reported as overlapping before it is replaced.
    pub fn save(&self, transaction: &AuthTransaction) -> Result<(), TransactionError> {
        let storage = self.transaction_storage()?;
        let existing = storage.get_storage();
        if is_auth_transaction(&existing) {
            #[cfg(feature = "tracing")]
            warn!(
                "a saved auth transaction exists in storage. This may indicate multiple auth flows are executing concurrently. Only one auth flow may be executing at a time."
            );
            if let Some(on_overlap) = &self.on_overlap {
                if let Some(previous) = AuthTransaction::from_stored(&existing) {
                    on_overlap.call(&previous);
                }
            }
        }

        self.clear()?;
        storage.set_storage(transaction)?;
        #[cfg(feature = "tracing")]
        debug!("Saved auth transaction under \"{}\"", storage.storage_key());
        Ok(())
    }

    /// Returns the stored transaction.
    ///
    /// The transaction section is checked first, then legacy PKCE metadata in durable storage,
    /// then legacy PKCE metadata in session storage.
    ///
    /// # Errors
    ///
    /// [`TransactionError::NotFound`] if none of them holds a usable value.
    /// [`TransactionError::Storage`] if a location cannot be opened. Legacy locations whose
    /// backend is unavailable are skipped.
    pub fn load(&self) -> Result<AuthTransaction, TransactionError> {
        let stored = self.transaction_storage()?.get_storage();
        if let Some(transaction) = AuthTransaction::from_stored(&stored) {
            return Ok(transaction);
        }

        for legacy in self.legacy_storages() {
            let legacy = match legacy {
                Ok(legacy) => legacy,
                Err(StorageError::StorageTypeUnavailable(_storage_type)) => {
                    #[cfg(feature = "tracing")]
                    debug!("Legacy PKCE storage in {_storage_type} is unavailable, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if let Some(transaction) = AuthTransaction::from_legacy_pkce(&legacy.get_storage()) {
                #[cfg(feature = "tracing")]
                debug!("Loaded auth transaction from legacy storage \"{}\"", legacy.storage_key());
                return Ok(transaction);
            }
        }

        Err(TransactionError::NotFound)
    }

    /// Returns `true` if a valid transaction is stored in the transaction section.
    pub fn exists(&self) -> Result<bool, TransactionError> {
        Ok(is_auth_transaction(&self.transaction_storage()?.get_storage()))
    }

    fn transaction_storage(&self) -> Result<SavedObject, StorageError> {
        self.storage_manager.get_transaction_storage(None)
    }

    fn legacy_storages(&self) -> impl Iterator<Item = Result<SavedObject, StorageError>> + '_ {
        [StorageType::LocalStorage, StorageType::SessionStorage]
            .into_iter()
            .map(move |storage_type| {
                let options = StorageOptions::builder().storage_type(storage_type).build();
                self.storage_manager.get_legacy_pkce_storage(Some(&options))
            })
    }
}
