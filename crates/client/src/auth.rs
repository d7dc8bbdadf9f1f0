//! Sign-in flows. Each one ends with a session persisted in a
//! [`SessionStore`].

use laundrio_core::{Role, SessionUser};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::api::{Credentials, LaundryApi, Registration};
use crate::error::ClientError;
use crate::oauth::{IdentityProvider, session_id_from_fragment};
use crate::session::{KeyValueStore, Session, SessionNamespace, SessionStore};

/// Credential login. Persists into `store`, normally the generic namespace.
///
/// # Errors
///
/// Returns the backend's error, or `ClientError::Storage` if the session
/// cannot be persisted.
#[instrument(skip_all, fields(email = %credentials.email))]
pub async fn credential_login<S: KeyValueStore>(
    api: &dyn LaundryApi,
    credentials: &Credentials,
    store: &mut SessionStore<S>,
) -> Result<Session, ClientError> {
    let auth = api.login(credentials).await?;
    persist(store, auth.user, auth.token)
}

/// Create an account and sign in as it.
///
/// # Errors
///
/// See [`credential_login`].
#[instrument(skip_all, fields(email = %registration.email, role = %registration.role))]
pub async fn register<S: KeyValueStore>(
    api: &dyn LaundryApi,
    registration: &Registration,
    store: &mut SessionStore<S>,
) -> Result<Session, ClientError> {
    let auth = api.register(registration).await?;
    persist(store, auth.user, auth.token)
}

/// Staff login through the worker endpoint.
///
/// # Errors
///
/// Returns `ClientError::Validation` if the backend answers with a
/// non-worker identity; otherwise see [`credential_login`].
#[instrument(skip_all, fields(email = %credentials.email))]
pub async fn worker_login<S: KeyValueStore>(
    api: &dyn LaundryApi,
    credentials: &Credentials,
    store: &mut SessionStore<S>,
) -> Result<Session, ClientError> {
    let auth = api.worker_login(credentials).await?;
    require_role(&auth.user, Role::Worker)?;
    persist(store, auth.user, auth.token)
}

/// Finish a student sign-in from the provider's redirect.
///
/// The profile's e-mail must belong to `allowed_domain`; otherwise the
/// backend is never contacted.
///
/// # Errors
///
/// Returns `ClientError::Validation` for a missing session ID, an
/// off-campus e-mail or a non-student identity; the provider's or
/// backend's error otherwise.
#[instrument(skip_all, fields(allowed_domain = %allowed_domain))]
pub async fn student_sign_in<S: KeyValueStore>(
    provider: &dyn IdentityProvider,
    api: &dyn LaundryApi,
    callback: &str,
    allowed_domain: &str,
    store: &mut SessionStore<S>,
) -> Result<Session, ClientError> {
    let session_id = session_id_from_fragment(callback)?;
    let profile = provider.session_data(&session_id).await?;

    if let Err(e) = profile.email.require_domain(allowed_domain) {
        warn!(email = %profile.email, "Rejected off-campus sign-in");
        return Err(e.into());
    }

    let auth = api.student_exchange(&profile).await?;
    require_role(&auth.user, Role::Student)?;
    persist(store, auth.user, auth.session_token)
}

/// Restore the session for `role`, falling back to a generic-namespace
/// session with that role.
pub fn restore_for_role<S: KeyValueStore>(storage: S, role: Role) -> SessionStore<S> {
    let mut store = SessionStore::new(storage, SessionNamespace::for_role(role));
    store.restore();
    store
}

fn require_role(user: &SessionUser, role: Role) -> Result<(), ClientError> {
    if user.role == role {
        Ok(())
    } else {
        Err(ClientError::Validation(format!(
            "expected a {role} account, got {}",
            user.role
        )))
    }
}

fn persist<S: KeyValueStore>(
    store: &mut SessionStore<S>,
    user: SessionUser,
    token: SecretString,
) -> Result<Session, ClientError> {
    if !user.is_well_formed() {
        return Err(ClientError::Validation(
            "student account has no student ID".to_string(),
        ));
    }

    let session = store.login(user, token)?.clone();
    info!(namespace = %store.namespace(), role = %session.role(), "Session established");
    Ok(session)
}
