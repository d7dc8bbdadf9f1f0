//! Mutation dispatcher: create, complete and pickup.
//!
//! Each mutation is one request. Success is confirmed and followed by a
//! re-fetch; the local collection is never edited in place. Failure is
//! reported and leaves the collection as it was.

use laundrio_core::{EntryId, LaundryItem, NewEntry};
use tracing::{info, instrument, warn};

use crate::api::{LaundryApi, MutationAck};
use crate::error::ClientError;
use crate::fetcher::EntryCache;
use crate::notice::{
    COMPLETE_FAILED, COMPLETED, CREATE_FAILED, CREATED, Notice, Notifier, PICKED_UP, PICKUP_FAILED,
};
use crate::session::Session;

/// Sends mutations on behalf of one session.
#[derive(Clone, Copy)]
pub struct MutationDispatcher<'a> {
    api: &'a dyn LaundryApi,
    session: &'a Session,
    notifier: &'a dyn Notifier,
}

impl std::fmt::Debug for MutationDispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationDispatcher")
            .field("session", self.session)
            .finish_non_exhaustive()
    }
}

impl<'a> MutationDispatcher<'a> {
    #[must_use]
    pub fn new(api: &'a dyn LaundryApi, session: &'a Session, notifier: &'a dyn Notifier) -> Self {
        Self {
            api,
            session,
            notifier,
        }
    }

    /// Register a new submission.
    ///
    /// The form is validated first; an invalid one is reported and nothing
    /// is sent.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for an invalid form, otherwise the
    /// backend call's error.
    #[instrument(skip(self, cache, items), fields(items = items.len()))]
    pub async fn create_entry(
        &self,
        cache: &mut EntryCache,
        student_id: &str,
        student_name: &str,
        items: Vec<LaundryItem>,
    ) -> Result<MutationAck, ClientError> {
        let entry = match NewEntry::new(student_id, student_name, items) {
            Ok(entry) => entry,
            Err(e) => {
                let err = ClientError::from(e);
                warn!(error = %err, "Rejected invalid entry before sending");
                self.notifier
                    .notify(Notice::error(err.user_message(CREATE_FAILED)));
                return Err(err);
            }
        };

        let result = self.api.create_entry(self.session, &entry).await;
        self.finish(cache, result, CREATED, CREATE_FAILED).await
    }

    /// Mark an entry completed. Sent whatever its local status.
    ///
    /// # Errors
    ///
    /// Returns the backend call's error.
    #[instrument(skip(self, cache), fields(entry_id = %entry_id))]
    pub async fn complete_entry(
        &self,
        cache: &mut EntryCache,
        entry_id: &EntryId,
    ) -> Result<MutationAck, ClientError> {
        let result = self.api.complete_entry(self.session, entry_id).await;
        self.finish(cache, result, COMPLETED, COMPLETE_FAILED).await
    }

    /// Mark an entry picked up. Sent whatever its local status.
    ///
    /// # Errors
    ///
    /// Returns the backend call's error.
    #[instrument(skip(self, cache), fields(entry_id = %entry_id))]
    pub async fn pickup_entry(
        &self,
        cache: &mut EntryCache,
        entry_id: &EntryId,
    ) -> Result<MutationAck, ClientError> {
        let result = self.api.pickup_entry(self.session, entry_id).await;
        self.finish(cache, result, PICKED_UP, PICKUP_FAILED).await
    }

    async fn finish(
        &self,
        cache: &mut EntryCache,
        result: Result<MutationAck, ClientError>,
        confirmation: &str,
        fallback: &str,
    ) -> Result<MutationAck, ClientError> {
        match result {
            Ok(ack) => {
                info!(entry_id = %ack.entry_id, "Mutation accepted");
                self.notifier.notify(Notice::success(confirmation));
                // A failed re-fetch is reported by the cache; the mutation
                // itself still succeeded.
                let _ = cache.refresh(self.api, self.session, self.notifier).await;
                Ok(ack)
            }
            Err(e) => {
                warn!(error = %e, "Mutation rejected");
                self.notifier.notify(Notice::error(e.user_message(fallback)));
                Err(e)
            }
        }
    }
}
