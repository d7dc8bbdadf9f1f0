//! Student dashboard commands.

use laundrio_client::StudentDashboard;
use laundrio_core::{EntryId, Role};

use super::{CliError, Context};
use crate::render;

fn dashboard(ctx: &Context) -> Result<StudentDashboard, CliError> {
    let session = ctx.session_for(Role::Student)?;
    Ok(StudentDashboard::new(ctx.api.clone(), session, ctx.notices.clone())?)
}

/// `student show`
///
/// # Errors
///
/// Returns `CliError` if not signed in or the fetch fails.
pub async fn show(ctx: &Context) -> Result<(), CliError> {
    let mut dashboard = dashboard(ctx)?;
    let view = dashboard.refresh().await?;
    render::student_view(&mut std::io::stdout().lock(), &view)?;
    Ok(())
}

/// `student pickup [entry_id]`
///
/// # Errors
///
/// Returns `CliError` if not signed in, nothing is ready, or the backend
/// refuses the pickup.
pub async fn pickup(ctx: &Context, entry_id: Option<String>) -> Result<(), CliError> {
    let mut dashboard = dashboard(ctx)?;
    // The active entry is only known after a fetch
    dashboard.refresh().await?;

    let entry_id = entry_id.map(EntryId::new);
    dashboard.pickup(entry_id.as_ref()).await?;

    render::student_view(&mut std::io::stdout().lock(), &dashboard.view())?;
    Ok(())
}
