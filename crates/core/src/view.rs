//! View models derived from an entry collection.
//!
//! Everything in this module is a pure, total function of the fetched
//! entries (and, for workers, the selected filter). Nothing here can fail:
//! an empty collection yields an empty view with zero counts.

use serde::Serialize;

use crate::types::{EntryStatus, LaundryEntry};

/// What a student sees: the entry waiting at the counter and everything else.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StudentView<'a> {
    /// First `completed` entry in arrival order.
    pub active: Option<&'a LaundryEntry>,
    /// Any further `completed` entries. Normally empty; more than one entry
    /// ready at once is a backend anomaly that is surfaced rather than hidden.
    pub also_ready: Vec<&'a LaundryEntry>,
    /// Entries not ready for pickup (`received` and `picked_up`), in order.
    pub history: Vec<&'a LaundryEntry>,
}

impl<'a> StudentView<'a> {
    /// Partition a student's entries.
    #[must_use]
    pub fn derive(entries: &'a [LaundryEntry]) -> Self {
        let mut view = Self::default();
        for entry in entries {
            if entry.status == EntryStatus::Completed {
                if view.active.is_none() {
                    view.active = Some(entry);
                } else {
                    view.also_ready.push(entry);
                }
            } else {
                view.history.push(entry);
            }
        }
        view
    }

    /// Whether more than one entry is ready at once.
    #[must_use]
    pub fn has_multiple_ready(&self) -> bool {
        !self.also_ready.is_empty()
    }

    /// Every ready entry, active first.
    pub fn ready(&self) -> impl Iterator<Item = &'a LaundryEntry> + '_ {
        self.active.into_iter().chain(self.also_ready.iter().copied())
    }
}

/// Per-status counts over all entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct WorkerStats {
    /// Number of entries.
    pub total: usize,
    /// Entries with status `received`.
    pub received: usize,
    /// Entries with status `completed`.
    pub completed: usize,
    /// Entries with status `picked_up`.
    pub picked_up: usize,
}

impl WorkerStats {
    /// Count entries by status.
    #[must_use]
    pub fn from_entries(entries: &[LaundryEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut stats, entry| {
            stats.total += 1;
            match entry.status {
                EntryStatus::Received => stats.received += 1,
                EntryStatus::Completed => stats.completed += 1,
                EntryStatus::PickedUp => stats.picked_up += 1,
            }
            stats
        })
    }

    /// Count for the entries a filter would show.
    #[must_use]
    pub const fn count(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.total,
            StatusFilter::Only(EntryStatus::Received) => self.received,
            StatusFilter::Only(EntryStatus::Completed) => self.completed,
            StatusFilter::Only(EntryStatus::PickedUp) => self.picked_up,
        }
    }
}

/// Status filter on the worker's entry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    /// Show everything.
    #[default]
    All,
    /// Show only entries in one status.
    Only(EntryStatus),
}

impl StatusFilter {
    /// Filters in the order the worker dashboard lists them.
    pub const ALL: [Self; 4] = [
        Self::All,
        Self::Only(EntryStatus::Received),
        Self::Only(EntryStatus::Completed),
        Self::Only(EntryStatus::PickedUp),
    ];

    /// Whether an entry passes the filter.
    #[must_use]
    pub fn matches(self, entry: &LaundryEntry) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => entry.status == status,
        }
    }

    /// Entries passing the filter, keeping their relative order.
    #[must_use]
    pub fn apply(self, entries: &[LaundryEntry]) -> Vec<&LaundryEntry> {
        entries.iter().filter(|entry| self.matches(entry)).collect()
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => write!(f, "{status}"),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse::<EntryStatus>()
            .map(Self::Only)
            .map_err(|_| format!("invalid filter: {s} (expected all, received, completed or picked_up)"))
    }
}

/// What a worker sees: counts over everything plus the filtered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerView<'a> {
    /// Counts over the whole collection, independent of the filter.
    pub stats: WorkerStats,
    /// The filter that produced `entries`.
    pub filter: StatusFilter,
    /// Entries passing the filter.
    pub entries: Vec<&'a LaundryEntry>,
}

impl<'a> WorkerView<'a> {
    /// Derive the worker dashboard from all entries.
    #[must_use]
    pub fn derive(entries: &'a [LaundryEntry], filter: StatusFilter) -> Self {
        Self {
            stats: WorkerStats::from_entries(entries),
            filter,
            entries: filter.apply(entries),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::{EntryId, LaundryItem, StudentId};

    fn entry(id: &str, status: EntryStatus) -> LaundryEntry {
        LaundryEntry {
            entry_id: EntryId::new(id),
            student_id: StudentId::new("21BCS042"),
            student_name: "Asha".to_string(),
            items: vec![LaundryItem::new("Shirt", 1)],
            total_items: 1,
            status,
            submission_date: Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap(),
            completion_date: None,
            worker_id: None,
        }
    }

    fn ids(entries: &[&LaundryEntry]) -> Vec<String> {
        entries.iter().map(|e| e.entry_id.to_string()).collect()
    }

    fn mixed() -> Vec<LaundryEntry> {
        vec![
            entry("1", EntryStatus::Received),
            entry("2", EntryStatus::PickedUp),
            entry("3", EntryStatus::Completed),
            entry("4", EntryStatus::Received),
            entry("5", EntryStatus::PickedUp),
            entry("6", EntryStatus::Received),
        ]
    }

    #[test]
    fn test_student_view_active_and_history() {
        let entries = vec![entry("1", EntryStatus::Completed), entry("2", EntryStatus::Received)];
        let view = StudentView::derive(&entries);

        assert_eq!(view.active.unwrap().entry_id.as_str(), "1");
        assert_eq!(ids(&view.history), vec!["2"]);
        assert!(!view.has_multiple_ready());
    }

    #[test]
    fn test_student_view_history_keeps_received_and_picked_up_in_order() {
        let entries = mixed();
        let view = StudentView::derive(&entries);

        assert_eq!(view.active.unwrap().entry_id.as_str(), "3");
        assert_eq!(ids(&view.history), vec!["1", "2", "4", "5", "6"]);
    }

    #[test]
    fn test_student_view_surfaces_extra_ready_entries() {
        let entries = vec![
            entry("a", EntryStatus::Received),
            entry("b", EntryStatus::Completed),
            entry("c", EntryStatus::Completed),
        ];
        let view = StudentView::derive(&entries);

        assert_eq!(view.active.unwrap().entry_id.as_str(), "b");
        assert_eq!(ids(&view.also_ready), vec!["c"]);
        assert_eq!(ids(&view.history), vec!["a"]);
        assert!(view.has_multiple_ready());
        assert_eq!(view.ready().count(), 2);
    }

    #[test]
    fn test_empty_collection() {
        let entries: Vec<LaundryEntry> = Vec::new();

        let student = StudentView::derive(&entries);
        assert!(student.active.is_none());
        assert!(student.history.is_empty());
        assert!(student.also_ready.is_empty());

        let worker = WorkerView::derive(&entries, StatusFilter::All);
        assert_eq!(worker.stats, WorkerStats::default());
        assert_eq!(
            (worker.stats.total, worker.stats.received, worker.stats.completed, worker.stats.picked_up),
            (0, 0, 0, 0)
        );
        assert!(worker.entries.is_empty());
    }

    #[test]
    fn test_stats_partition() {
        let entries = mixed();
        let stats = WorkerStats::from_entries(&entries);

        assert_eq!(stats.total, 6);
        assert_eq!(stats.received, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.picked_up, 2);
        assert_eq!(stats.total, stats.received + stats.completed + stats.picked_up);

        for status in EntryStatus::ALL {
            let expected = entries.iter().filter(|e| e.status == status).count();
            assert_eq!(stats.count(StatusFilter::Only(status)), expected);
        }
    }

    #[test]
    fn test_filter_received_preserves_order() {
        let entries = mixed();
        let view = WorkerView::derive(&entries, StatusFilter::Only(EntryStatus::Received));

        assert_eq!(ids(&view.entries), vec!["1", "4", "6"]);
        assert!(view.entries.iter().all(|e| e.status == EntryStatus::Received));
        assert_eq!(view.stats.total, 6);
    }

    #[test]
    fn test_filter_all_is_identity() {
        let entries = mixed();
        let filtered = StatusFilter::All.apply(&entries);
        assert_eq!(filtered.len(), entries.len());
        assert_eq!(filtered[0].entry_id.as_str(), "1");
        assert_eq!(filtered[5].entry_id.as_str(), "6");
    }

    #[test]
    fn test_filtered_counts_match_stats() {
        let entries = mixed();
        let stats = WorkerStats::from_entries(&entries);
        for filter in StatusFilter::ALL {
            assert_eq!(filter.apply(&entries).len(), stats.count(filter), "{filter}");
        }
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!("all".parse::<StatusFilter>(), Ok(StatusFilter::All));
        assert_eq!(
            "picked_up".parse::<StatusFilter>(),
            Ok(StatusFilter::Only(EntryStatus::PickedUp))
        );
        assert!("done".parse::<StatusFilter>().is_err());
        assert_eq!(StatusFilter::default(), StatusFilter::All);
    }
}
