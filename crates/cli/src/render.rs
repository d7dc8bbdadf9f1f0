//! Plain-text rendering of sessions, views and notices.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use laundrio_client::{Notice, NoticeLevel, Session};
use laundrio_core::{EntryId, LaundryEntry, Role, StatusFilter, StudentView, WorkerView};

fn date(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

fn items(entry: &LaundryEntry) -> String {
    entry
        .items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn notice(out: &mut impl Write, notice: &Notice) -> io::Result<()> {
    let marker = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    writeln!(out, "[{marker}] {}", notice.message)
}

pub fn signed_in(out: &mut impl Write, session: &Session) -> io::Result<()> {
    let user = session.user();
    write!(out, "Signed in as {} <{}> ({})", user.name, user.email, user.role)?;
    if let Some(student_id) = &user.student_id {
        write!(out, ", student ID {student_id}")?;
    }
    writeln!(out)
}

pub fn student_view(out: &mut impl Write, view: &StudentView<'_>) -> io::Result<()> {
    match view.active {
        Some(entry) => {
            writeln!(out, "Ready for pickup")?;
            ready_card(out, entry)?;
        }
        None => writeln!(out, "Nothing ready for pickup")?,
    }

    if view.has_multiple_ready() {
        writeln!(out)?;
        writeln!(out, "Also ready ({})", view.also_ready.len())?;
        for entry in &view.also_ready {
            ready_card(out, entry)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "History")?;
    if view.history.is_empty() {
        writeln!(out, "  No laundry history yet")?;
    }
    for entry in &view.history {
        writeln!(
            out,
            "  {:<16} {:>3} items  {}  {}",
            entry.status.student_label(),
            entry.total_items,
            date(&entry.submission_date),
            items(entry)
        )?;
    }
    Ok(())
}

fn ready_card(out: &mut impl Write, entry: &LaundryEntry) -> io::Result<()> {
    writeln!(out, "  Entry      {}", entry.entry_id)?;
    writeln!(out, "  Items      {} ({})", entry.total_items, items(entry))?;
    if let Some(completed) = &entry.completion_date {
        writeln!(out, "  Completed  {}", date(completed))?;
    }
    Ok(())
}

pub fn worker_view(out: &mut impl Write, view: &WorkerView<'_>) -> io::Result<()> {
    let stats = &view.stats;
    writeln!(
        out,
        "Total {}  |  Received {}  |  Completed {}  |  Picked up {}",
        stats.total, stats.received, stats.completed, stats.picked_up
    )?;

    if view.filter != StatusFilter::All {
        writeln!(out, "Filter: {} ({} shown)", view.filter, view.entries.len())?;
    }
    writeln!(out)?;

    if view.entries.is_empty() {
        writeln!(out, "No entries")?;
        return Ok(());
    }

    for entry in &view.entries {
        let action = entry
            .available_action(Role::Worker)
            .map_or("", |_| "  [complete]");
        writeln!(
            out,
            "{}  {:<10} {:<20} {:<10} {:>3} items  {}{action}",
            entry.entry_id,
            entry.student_id,
            entry.student_name,
            entry.status.worker_label(),
            entry.total_items,
            date(&entry.submission_date),
        )?;
    }
    Ok(())
}

pub fn created(out: &mut impl Write, entry_id: &EntryId, entries: &[LaundryEntry]) -> io::Result<()> {
    match entries.iter().find(|entry| &entry.entry_id == entry_id) {
        Some(entry) => writeln!(
            out,
            "Created {} for {} ({}): {} items",
            entry.entry_id, entry.student_name, entry.student_id, entry.total_items
        ),
        None => writeln!(out, "Created {entry_id}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use laundrio_core::{EntryStatus, LaundryItem, StudentId};

    use super::*;

    fn entry(id: &str, status: EntryStatus) -> LaundryEntry {
        LaundryEntry {
            entry_id: EntryId::new(id),
            student_id: StudentId::new("21BCS042"),
            student_name: "Asha".to_string(),
            items: vec![LaundryItem::new("Shirt", 2), LaundryItem::new("Pants", 1)],
            total_items: 3,
            status,
            submission_date: Utc.with_ymd_and_hms(2026, 3, 4, 10, 0, 0).unwrap(),
            completion_date: (status != EntryStatus::Received)
                .then(|| Utc.with_ymd_and_hms(2026, 3, 5, 16, 30, 0).unwrap()),
            worker_id: None,
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_student_view_shows_active_and_history() {
        let entries = vec![entry("e-1", EntryStatus::Completed), entry("e-2", EntryStatus::Received)];
        let text = render(|out| student_view(out, &StudentView::derive(&entries)));

        assert!(text.starts_with("Ready for pickup\n  Entry      e-1\n"));
        assert!(text.contains("Items      3 (Shirt x2, Pants x1)"));
        assert!(text.contains("Completed  Mar 5, 2026"));
        assert!(text.contains("In Progress"));
        assert!(!text.contains("Also ready"));
    }

    #[test]
    fn test_student_view_surfaces_extra_ready_entries() {
        let entries = vec![
            entry("e-1", EntryStatus::Completed),
            entry("e-2", EntryStatus::Completed),
        ];
        let text = render(|out| student_view(out, &StudentView::derive(&entries)));
        assert!(text.contains("Also ready (1)\n  Entry      e-2"));
        assert!(text.contains("No laundry history yet"));
    }

    #[test]
    fn test_empty_student_view() {
        let text = render(|out| student_view(out, &StudentView::derive(&[])));
        assert!(text.starts_with("Nothing ready for pickup"));
    }

    #[test]
    fn test_worker_view_marks_completable_entries() {
        let entries = vec![entry("e-1", EntryStatus::Received), entry("e-2", EntryStatus::PickedUp)];
        let text = render(|out| worker_view(out, &WorkerView::derive(&entries, StatusFilter::All)));

        assert!(text.starts_with("Total 2  |  Received 1  |  Completed 0  |  Picked up 1\n"));
        let lines: Vec<_> = text.lines().collect();
        assert!(lines.iter().any(|l| l.starts_with("e-1") && l.ends_with("[complete]")));
        assert!(lines.iter().any(|l| l.starts_with("e-2") && l.contains("picked up") && !l.contains("[complete]")));
    }

    #[test]
    fn test_worker_view_pads_student_column() {
        let mut short = entry("e-1", EntryStatus::Received);
        short.student_id = StudentId::new("S1");
        let entries = vec![short, entry("e-2", EntryStatus::Received)];
        let text = render(|out| worker_view(out, &WorkerView::derive(&entries, StatusFilter::All)));

        assert!(text.contains("e-1  S1         Asha "));
        assert!(text.contains("e-2  21BCS042   Asha "));
    }

    #[test]
    fn test_worker_view_with_filter_and_no_matches() {
        let entries = vec![entry("e-1", EntryStatus::Received)];
        let filter = StatusFilter::Only(EntryStatus::Completed);
        let text = render(|out| worker_view(out, &WorkerView::derive(&entries, filter)));
        assert!(text.contains("Filter: completed (0 shown)"));
        assert!(text.ends_with("No entries\n"));
    }

    #[test]
    fn test_notice_markers() {
        assert_eq!(
            render(|out| notice(out, &Notice::success("Marked as picked up!"))),
            "[ok] Marked as picked up!\n"
        );
        assert_eq!(
            render(|out| notice(out, &Notice::error("Failed to create entry"))),
            "[error] Failed to create entry\n"
        );
    }
}
