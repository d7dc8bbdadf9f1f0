//! Role dashboards: a session, its entry collection and the view derived
//! from it.

use std::sync::Arc;

use laundrio_core::{
    EntryId, LaundryEntry, LaundryItem, Role, StatusFilter, StudentView, WorkerView,
};
use tracing::warn;

use crate::api::{LaundryApi, MutationAck};
use crate::dispatcher::MutationDispatcher;
use crate::error::ClientError;
use crate::fetcher::EntryCache;
use crate::notice::{Notice, Notifier};
use crate::session::Session;

/// Shown when a student asks to pick up with nothing ready.
pub const NOTHING_READY: &str = "No laundry is ready for pickup";

/// Student screen: the entry waiting at the counter plus history.
pub struct StudentDashboard {
    api: Arc<dyn LaundryApi>,
    notifier: Arc<dyn Notifier>,
    session: Session,
    cache: EntryCache,
}

impl std::fmt::Debug for StudentDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentDashboard")
            .field("session", &self.session)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl StudentDashboard {
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthenticated` unless `session` is a
    /// student's.
    pub fn new(
        api: Arc<dyn LaundryApi>,
        session: Session,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ClientError> {
        if session.role() != Role::Student {
            return Err(ClientError::NotAuthenticated(Role::Student));
        }
        Ok(Self {
            api,
            notifier,
            session,
            cache: EntryCache::new(),
        })
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Entries as last fetched.
    #[must_use]
    pub fn entries(&self) -> &[LaundryEntry] {
        self.cache.entries()
    }

    /// Fetch the student's entries.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous entries are kept.
    pub async fn refresh(&mut self) -> Result<StudentView<'_>, ClientError> {
        self.cache
            .refresh(self.api.as_ref(), &self.session, self.notifier.as_ref())
            .await?;
        Ok(self.view())
    }

    /// View over the current entries.
    #[must_use]
    pub fn view(&self) -> StudentView<'_> {
        let view = StudentView::derive(self.cache.entries());
        if view.has_multiple_ready() {
            warn!(
                ready = view.also_ready.len() + 1,
                "More than one entry is ready for pickup"
            );
        }
        view
    }

    /// Mark an entry picked up; defaults to the active entry.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if no ID is given and nothing is
    /// ready, otherwise the dispatcher's error.
    pub async fn pickup(&mut self, entry_id: Option<&EntryId>) -> Result<MutationAck, ClientError> {
        let entry_id = match entry_id {
            Some(id) => id.clone(),
            None => match StudentView::derive(self.cache.entries()).active {
                Some(active) => active.entry_id.clone(),
                None => {
                    self.notifier.notify(Notice::error(NOTHING_READY));
                    return Err(ClientError::Validation(NOTHING_READY.to_string()));
                }
            },
        };

        MutationDispatcher::new(self.api.as_ref(), &self.session, self.notifier.as_ref())
            .pickup_entry(&mut self.cache, &entry_id)
            .await
    }
}

/// Staff screen: stats, the filtered table, intake and completion.
pub struct WorkerDashboard {
    api: Arc<dyn LaundryApi>,
    notifier: Arc<dyn Notifier>,
    session: Session,
    cache: EntryCache,
    filter: StatusFilter,
}

impl std::fmt::Debug for WorkerDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerDashboard")
            .field("session", &self.session)
            .field("cache", &self.cache)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl WorkerDashboard {
    /// Dashboard with the filter on `all`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotAuthenticated` unless `session` is a
    /// worker's.
    pub fn new(
        api: Arc<dyn LaundryApi>,
        session: Session,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ClientError> {
        if session.role() != Role::Worker {
            return Err(ClientError::NotAuthenticated(Role::Worker));
        }
        Ok(Self {
            api,
            notifier,
            session,
            cache: EntryCache::new(),
            filter: StatusFilter::default(),
        })
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub const fn set_filter(&mut self, filter: StatusFilter) {
        self.filter = filter;
    }

    /// Entries as last fetched, unfiltered.
    #[must_use]
    pub fn entries(&self) -> &[LaundryEntry] {
        self.cache.entries()
    }

    /// Fetch every entry.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous entries are kept.
    pub async fn refresh(&mut self) -> Result<WorkerView<'_>, ClientError> {
        self.cache
            .refresh(self.api.as_ref(), &self.session, self.notifier.as_ref())
            .await?;
        Ok(self.view())
    }

    /// View over the current entries under the current filter.
    #[must_use]
    pub fn view(&self) -> WorkerView<'_> {
        WorkerView::derive(self.cache.entries(), self.filter)
    }

    /// Register a submission.
    ///
    /// # Errors
    ///
    /// See [`MutationDispatcher::create_entry`].
    pub async fn create_entry(
        &mut self,
        student_id: &str,
        student_name: &str,
        items: Vec<LaundryItem>,
    ) -> Result<MutationAck, ClientError> {
        MutationDispatcher::new(self.api.as_ref(), &self.session, self.notifier.as_ref())
            .create_entry(&mut self.cache, student_id, student_name, items)
            .await
    }

    /// Mark an entry completed.
    ///
    /// # Errors
    ///
    /// See [`MutationDispatcher::complete_entry`].
    pub async fn complete_entry(&mut self, entry_id: &EntryId) -> Result<MutationAck, ClientError> {
        MutationDispatcher::new(self.api.as_ref(), &self.session, self.notifier.as_ref())
            .complete_entry(&mut self.cache, entry_id)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::atomic::Ordering;

    use laundrio_core::EntryStatus;

    use super::*;
    use crate::fetcher::tests::{FakeApi, entry, student_session, worker_session};
    use crate::notice::RecordingNotifier;

    fn ids(entries: &[&LaundryEntry]) -> Vec<String> {
        entries.iter().map(|e| e.entry_id.to_string()).collect()
    }

    #[test]
    fn test_dashboards_check_role() {
        let api: Arc<dyn LaundryApi> = Arc::new(FakeApi::default());
        let notifier: Arc<dyn Notifier> = Arc::new(RecordingNotifier::new());

        let err = StudentDashboard::new(api.clone(), worker_session(), notifier.clone()).unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated(Role::Student)));
        let err = WorkerDashboard::new(api, student_session(), notifier).unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated(Role::Worker)));
    }

    #[tokio::test]
    async fn test_student_view_after_refresh() {
        let api = Arc::new(FakeApi::with_entries(vec![
            entry("1", EntryStatus::Completed),
            entry("2", EntryStatus::Received),
        ]));
        let mut dashboard =
            StudentDashboard::new(api, student_session(), Arc::new(RecordingNotifier::new()))
                .unwrap();

        let view = dashboard.refresh().await.unwrap();
        assert_eq!(view.active.unwrap().entry_id.as_str(), "1");
        assert_eq!(ids(&view.history), ["2"]);
    }

    #[tokio::test]
    async fn test_student_pickup_defaults_to_active_entry() {
        let api = Arc::new(FakeApi::with_entries(vec![
            entry("1", EntryStatus::PickedUp),
            entry("2", EntryStatus::Completed),
        ]));
        let mut dashboard = StudentDashboard::new(
            api.clone(),
            student_session(),
            Arc::new(RecordingNotifier::new()),
        )
        .unwrap();
        dashboard.refresh().await.unwrap();

        let ack = dashboard.pickup(None).await.unwrap();
        assert_eq!(ack.entry_id.as_str(), "2");
        let view = dashboard.view();
        assert!(view.active.is_none());
        assert_eq!(ids(&view.history), ["1", "2"]);
    }

    #[tokio::test]
    async fn test_student_pickup_with_nothing_ready_sends_nothing() {
        let api = Arc::new(FakeApi::with_entries(vec![entry("1", EntryStatus::Received)]));
        let notifier = Arc::new(RecordingNotifier::new());
        let mut dashboard =
            StudentDashboard::new(api.clone(), student_session(), notifier.clone()).unwrap();
        dashboard.refresh().await.unwrap();

        let err = dashboard.pickup(None).await.unwrap_err();
        assert_eq!(err.to_string(), NOTHING_READY);
        assert_eq!(api.mutations.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.last(), Some(Notice::error(NOTHING_READY)));
    }

    #[tokio::test]
    async fn test_worker_filter_and_stats() {
        let api = Arc::new(FakeApi::with_entries(vec![
            entry("1", EntryStatus::Received),
            entry("2", EntryStatus::Completed),
            entry("3", EntryStatus::Received),
            entry("4", EntryStatus::PickedUp),
        ]));
        let mut dashboard =
            WorkerDashboard::new(api, worker_session(), Arc::new(RecordingNotifier::new()))
                .unwrap();
        assert_eq!(dashboard.filter(), StatusFilter::All);
        dashboard.refresh().await.unwrap();

        dashboard.set_filter(StatusFilter::Only(EntryStatus::Received));
        let view = dashboard.view();
        assert_eq!(ids(&view.entries), ["1", "3"]);
        assert_eq!(view.stats.total, 4);
        assert_eq!(view.stats.received, 2);
        assert_eq!(view.stats.completed, 1);
        assert_eq!(view.stats.picked_up, 1);
    }

    #[tokio::test]
    async fn test_worker_complete_then_filter_moves_entry() {
        let api = Arc::new(FakeApi::with_entries(vec![
            entry("1", EntryStatus::Received),
            entry("2", EntryStatus::Received),
        ]));
        let mut dashboard =
            WorkerDashboard::new(api, worker_session(), Arc::new(RecordingNotifier::new()))
                .unwrap();
        dashboard.refresh().await.unwrap();
        dashboard.set_filter(StatusFilter::Only(EntryStatus::Completed));

        dashboard.complete_entry(&EntryId::new("2")).await.unwrap();
        assert_eq!(ids(&dashboard.view().entries), ["2"]);
    }

    #[tokio::test]
    async fn test_worker_create_shows_new_entry_with_total() {
        let api = Arc::new(FakeApi::default());
        let notifier = Arc::new(RecordingNotifier::new());
        let mut dashboard = WorkerDashboard::new(api, worker_session(), notifier.clone()).unwrap();

        dashboard
            .create_entry(
                "21BCS042",
                "Asha",
                vec![LaundryItem::new("Shirt", 2), LaundryItem::new("Pants", 1)],
            )
            .await
            .unwrap();

        assert_eq!(dashboard.entries().len(), 1);
        assert_eq!(dashboard.entries()[0].total_items, 3);
        assert_eq!(dashboard.view().stats.received, 1);
    }
}
