//! Laundry counter commands.
//!
//! # Usage
//!
//! ```bash
//! laundrio worker list --filter received
//! laundrio worker create --student-id 21BCS042 --student-name "Asha" \
//!     --item Shirt:2 --item Pants:1
//! laundrio worker complete 6b0f...
//! ```

use laundrio_client::WorkerDashboard;
use laundrio_core::{EntryId, LaundryItem, Role, StatusFilter};

use super::{CliError, Context};
use crate::render;

fn dashboard(ctx: &Context) -> Result<WorkerDashboard, CliError> {
    let session = ctx.session_for(Role::Worker)?;
    Ok(WorkerDashboard::new(ctx.api.clone(), session, ctx.notices.clone())?)
}

/// Parse `TYPE:QTY`. The type may itself contain colons; the quantity is
/// whatever follows the last one. Range checks are left to entry
/// validation.
///
/// # Errors
///
/// Returns `CliError::InvalidItem` if there is no `:` or the quantity is not
/// a number.
pub fn parse_item(raw: &str) -> Result<LaundryItem, CliError> {
    let (item_type, quantity) = raw
        .rsplit_once(':')
        .ok_or_else(|| CliError::InvalidItem(raw.to_string()))?;
    let quantity = quantity
        .trim()
        .parse::<u32>()
        .map_err(|_| CliError::InvalidItem(raw.to_string()))?;
    Ok(LaundryItem::new(item_type.trim(), quantity))
}

/// `worker list`
///
/// # Errors
///
/// Returns `CliError` if not signed in or the fetch fails.
pub async fn list(ctx: &Context, filter: StatusFilter) -> Result<(), CliError> {
    let mut dashboard = dashboard(ctx)?;
    dashboard.set_filter(filter);
    let view = dashboard.refresh().await?;
    render::worker_view(&mut std::io::stdout().lock(), &view)?;
    Ok(())
}

/// `worker create`
///
/// # Errors
///
/// Returns `CliError` if not signed in, an item is malformed, the form is
/// invalid, or the backend refuses the entry.
pub async fn create(
    ctx: &Context,
    student_id: &str,
    student_name: &str,
    items: &[String],
) -> Result<(), CliError> {
    let items = items
        .iter()
        .map(|raw| parse_item(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut dashboard = dashboard(ctx)?;
    let ack = dashboard.create_entry(student_id, student_name, items).await?;

    render::created(&mut std::io::stdout().lock(), &ack.entry_id, dashboard.entries())?;
    Ok(())
}

/// `worker complete <entry_id>`
///
/// # Errors
///
/// Returns `CliError` if not signed in or the backend refuses the change.
pub async fn complete(ctx: &Context, entry_id: &str) -> Result<(), CliError> {
    let mut dashboard = dashboard(ctx)?;
    dashboard.complete_entry(&EntryId::new(entry_id)).await?;
    render::worker_view(&mut std::io::stdout().lock(), &dashboard.view())?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        assert_eq!(parse_item("Shirt:2").unwrap(), LaundryItem::new("Shirt", 2));
        assert_eq!(parse_item(" Bed Sheet : 1 ").unwrap(), LaundryItem::new("Bed Sheet", 1));
        assert_eq!(parse_item("Kurta:Large:3").unwrap(), LaundryItem::new("Kurta:Large", 3));
    }

    #[test]
    fn test_parse_item_zero_is_left_to_validation() {
        assert_eq!(parse_item("Socks:0").unwrap().quantity, 0);
    }

    #[test]
    fn test_parse_item_rejects_malformed() {
        for raw in ["Shirt", "Shirt:", "Shirt:two", "Shirt:-1"] {
            assert!(
                matches!(parse_item(raw), Err(CliError::InvalidItem(s)) if s == raw),
                "{raw}"
            );
        }
    }
}
