//! Sign-in, sign-out and identity commands.
//!
//! # Usage
//!
//! ```bash
//! # Staff login (password from LAUNDRIO_PASSWORD if -p is omitted)
//! laundrio login worker -e counter@iiitdwd.ac.in
//!
//! # Campus sign-in: open the printed URL, then paste the redirect back
//! laundrio oauth url
//! laundrio oauth callback 'http://localhost:3000/student/dashboard#session_id=...'
//!
//! laundrio whoami student
//! laundrio logout worker
//! ```

use std::io::Write;

use laundrio_client::auth::{self, restore_for_role};
use laundrio_client::oauth::authorize_url;
use laundrio_client::{Credentials, HttpIdentityProvider, Registration, SessionNamespace, SessionStore};
use laundrio_core::Role;
use secrecy::SecretString;

use super::{CliError, Context};
use crate::render;

/// Where the identity provider sends students back to.
pub const DEFAULT_REDIRECT: &str = "http://localhost:3000/student/dashboard";

fn credentials(email: &str, password: Option<String>) -> Result<Credentials, CliError> {
    let password = password.ok_or(CliError::MissingPassword)?;
    Ok(Credentials::new(email, SecretString::from(password))?)
}

/// `login worker`
///
/// # Errors
///
/// Returns `CliError` if the credentials are rejected or the session cannot
/// be stored.
pub async fn login_worker(ctx: &Context, email: &str, password: Option<String>) -> Result<(), CliError> {
    let credentials = credentials(email, password)?;
    let mut store = SessionStore::new(ctx.storage.clone(), SessionNamespace::Worker);
    let session = auth::worker_login(ctx.api.as_ref(), &credentials, &mut store).await?;

    render::signed_in(&mut std::io::stdout().lock(), &session)?;
    Ok(())
}

/// `login student`: credential login, stored in the generic namespace.
///
/// # Errors
///
/// See [`login_worker`].
pub async fn login_student(ctx: &Context, email: &str, password: Option<String>) -> Result<(), CliError> {
    let credentials = credentials(email, password)?;
    let mut store = SessionStore::new(ctx.storage.clone(), SessionNamespace::Generic);
    let session = auth::credential_login(ctx.api.as_ref(), &credentials, &mut store).await?;

    render::signed_in(&mut std::io::stdout().lock(), &session)?;
    Ok(())
}

/// `register`
///
/// # Errors
///
/// Returns `CliError` if the form is invalid, the backend refuses it, or the
/// session cannot be stored.
pub async fn register(
    ctx: &Context,
    email: &str,
    password: Option<String>,
    name: &str,
    role: Role,
    student_id: Option<&str>,
) -> Result<(), CliError> {
    let registration = Registration::new(credentials(email, password)?, name, role, student_id)?;
    let mut store = SessionStore::new(ctx.storage.clone(), SessionNamespace::Generic);
    let session = auth::register(ctx.api.as_ref(), &registration, &mut store).await?;

    render::signed_in(&mut std::io::stdout().lock(), &session)?;
    Ok(())
}

/// `oauth url`
///
/// # Errors
///
/// Returns `CliError::Io` if output cannot be written.
pub fn oauth_url(ctx: &Context, redirect: &str) -> Result<(), CliError> {
    let url = authorize_url(&ctx.config.auth_url, redirect);
    writeln!(std::io::stdout().lock(), "{url}")?;
    Ok(())
}

/// `oauth callback`
///
/// # Errors
///
/// Returns `CliError` if the redirect has no session ID, the e-mail is off
/// campus, or the provider or backend refuse the sign-in.
pub async fn oauth_callback(ctx: &Context, callback: &str) -> Result<(), CliError> {
    let provider = HttpIdentityProvider::from_config(&ctx.config)?;
    let mut store = SessionStore::new(ctx.storage.clone(), SessionNamespace::Student);
    let session = auth::student_sign_in(
        &provider,
        ctx.api.as_ref(),
        callback,
        &ctx.config.allowed_domain,
        &mut store,
    )
    .await?;

    render::signed_in(&mut std::io::stdout().lock(), &session)?;
    Ok(())
}

/// `logout`
///
/// # Errors
///
/// Returns `CliError::Storage` if the session files cannot be removed.
pub fn logout(ctx: &Context, namespace: SessionNamespace) -> Result<(), CliError> {
    let mut store = SessionStore::new(ctx.storage.clone(), namespace);
    store.restore();
    store.logout()?;
    writeln!(std::io::stdout().lock(), "Signed out ({namespace})")?;
    Ok(())
}

/// `whoami`
///
/// # Errors
///
/// Returns `CliError::NotSignedIn` if there is no session for `role`.
pub fn whoami(ctx: &Context, role: Role) -> Result<(), CliError> {
    let store = restore_for_role(ctx.storage.clone(), role);
    let session = store.active().ok_or(CliError::NotSignedIn(role))?;
    render::signed_in(&mut std::io::stdout().lock(), session)?;
    Ok(())
}
