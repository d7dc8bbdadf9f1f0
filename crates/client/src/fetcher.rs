//! Entry fetcher: holds the last successfully fetched collection.

use laundrio_core::LaundryEntry;
use tracing::{debug, instrument, warn};

use crate::api::{EntryScope, LaundryApi};
use crate::error::ClientError;
use crate::notice::{FETCH_FAILED, Notice, Notifier};
use crate::session::Session;

/// The entry collection as last seen from the backend, in backend order.
#[derive(Debug, Clone, Default)]
pub struct EntryCache {
    entries: Vec<LaundryEntry>,
    loaded: bool,
}

impl EntryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current collection.
    #[must_use]
    pub fn entries(&self) -> &[LaundryEntry] {
        &self.entries
    }

    /// Whether any fetch has succeeded yet.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Fetch the entries `session` may see and replace the collection.
    ///
    /// On failure the collection is left exactly as it was and the error is
    /// both reported to `notifier` and returned.
    ///
    /// # Errors
    ///
    /// Returns the `ClientError` from the backend call.
    #[instrument(skip_all, fields(role = %session.role()))]
    pub async fn refresh(
        &mut self,
        api: &dyn LaundryApi,
        session: &Session,
        notifier: &dyn Notifier,
    ) -> Result<&[LaundryEntry], ClientError> {
        let result = match EntryScope::for_session(session) {
            Ok(scope) => api.list_entries(session, &scope).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(entries) => {
                debug!(count = entries.len(), "Replaced entry collection");
                self.entries = entries;
                self.loaded = true;
                Ok(&self.entries)
            }
            Err(e) => {
                warn!(error = %e, kept = self.entries.len(), "Fetch failed; keeping previous entries");
                notifier.notify(Notice::error(e.user_message(FETCH_FAILED)));
                Err(e)
            }
        }
    }
}
