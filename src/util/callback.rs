//! Callback invoked when a new authorization flow would replace one still in progress.

use crate::transaction::AuthTransaction;
use parking_lot::Mutex;
use std::{fmt, sync::Arc};

pub(crate) type OnOverlapInner = Box<dyn FnMut(&AuthTransaction) + Send>;

/// The callback executed when [`TransactionManager::save`](crate::TransactionManager::save)
/// finds a valid transaction already stored. It takes the transaction about to be replaced as
/// an argument.
///
/// # Usage
/// ```
/// use oauth_client_storage::{AuthTransaction, callback::OnOverlap};
///
/// let on_overlap = OnOverlap::from(|previous: &AuthTransaction| {
///     // Report the overlapping flow
/// });
/// ```
#[derive(Clone)]
pub struct OnOverlap(pub(crate) Arc<Mutex<OnOverlapInner>>);

impl OnOverlap {
    pub(crate) fn call(&self, previous: &AuthTransaction) {
        (self.0.lock())(previous);
    }
}

impl<F> From<F> for OnOverlap
where
    F: FnMut(&AuthTransaction) + Send + 'static,
{
    fn from(f: F) -> Self {
        OnOverlap(Arc::new(Mutex::new(Box::new(f))))
    }
}

impl fmt::Debug for OnOverlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OnOverlap")
    }
}
