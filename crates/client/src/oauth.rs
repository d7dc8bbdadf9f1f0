//! Identity provider plumbing for student sign-in.
//!
//! The student is sent to the provider with a `redirect` target. The
//! provider sends them back with `#session_id=...` in the URL fragment, which
//! is traded for a profile at the provider's session-data endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument};
use url::Url;

use crate::api::ProviderProfile;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::decode;

/// Shown when the provider's redirect carries no session ID.
pub const NO_SESSION_ID: &str = "Authentication failed: No session ID";

/// Header the session-data endpoint reads the session ID from.
pub const SESSION_ID_HEADER: &str = "X-Session-ID";

/// Provider sign-in URL that returns to `redirect` afterwards.
#[must_use]
pub fn authorize_url(auth_url: &Url, redirect: &str) -> Url {
    let mut url = auth_url.clone();
    url.query_pairs_mut()
        .clear()
        .append_pair("redirect", redirect);
    url
}

/// Pull `session_id` out of a provider redirect.
///
/// Accepts the full redirect URL, or just its fragment with or without the
/// leading `#`.
///
/// # Errors
///
/// Returns `ClientError::Validation` with [`NO_SESSION_ID`] if there is no
/// non-empty `session_id`.
pub fn session_id_from_fragment(callback: &str) -> Result<String, ClientError> {
    let callback = callback.trim();
    let fragment = callback
        .split_once('#')
        .map_or(callback, |(_, fragment)| fragment);

    url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, value)| key == "session_id" && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
        .ok_or_else(|| ClientError::Validation(NO_SESSION_ID.to_string()))
}

/// Source of provider profiles.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange a provider session ID for the signed-in profile.
    async fn session_data(&self, session_id: &str) -> Result<ProviderProfile, ClientError>;
}

/// Session-data endpoint over HTTP.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    session_data_url: Arc<Url>,
}

impl std::fmt::Debug for HttpIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIdentityProvider")
            .field("session_data_url", &self.session_data_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpIdentityProvider {
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(session_data_url: Url, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            session_data_url: Arc::new(session_data_url),
        })
    }

    /// # Errors
    ///
    /// See [`HttpIdentityProvider::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.session_data_url.clone(), config.request_timeout)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    #[instrument(skip_all)]
    async fn session_data(&self, session_id: &str) -> Result<ProviderProfile, ClientError> {
        let response = self
            .client
            .get(self.session_data_url.as_str())
            .header(SESSION_ID_HEADER, session_id)
            .send()
            .await?;

        let profile: ProviderProfile = decode(response).await?;
        debug!(email = %profile.email, "Fetched provider profile");
        Ok(profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_encodes_redirect() {
        let auth = Url::parse("https://auth.emergentagent.com/").unwrap();
        let url = authorize_url(&auth, "http://localhost:3000/student/dashboard?x=1");
        assert_eq!(
            url.as_str(),
            "https://auth.emergentagent.com/?redirect=http%3A%2F%2Flocalhost%3A3000%2Fstudent%2Fdashboard%3Fx%3D1"
        );
    }

    #[test]
    fn test_authorize_url_replaces_existing_query() {
        let auth = Url::parse("https://auth.example/?redirect=old").unwrap();
        let url = authorize_url(&auth, "http://new");
        assert_eq!(url.query(), Some("redirect=http%3A%2F%2Fnew"));
    }

    #[test]
    fn test_session_id_from_full_url() {
        let id = session_id_from_fragment(
            "http://localhost:3000/student/dashboard#session_id=abc123&state=x",
        )
        .unwrap();
        assert_eq!(id, "abc123");
    }

    #[test]
    fn test_session_id_from_bare_fragment() {
        assert_eq!(session_id_from_fragment("#session_id=abc").unwrap(), "abc");
        assert_eq!(session_id_from_fragment("session_id=a%2Bb").unwrap(), "a+b");
    }

    #[test]
    fn test_missing_session_id() {
        for callback in [
            "http://localhost:3000/student/dashboard",
            "http://localhost:3000/#state=x",
            "#session_id=",
            "",
        ] {
            let err = session_id_from_fragment(callback).unwrap_err();
            assert_eq!(err.to_string(), NO_SESSION_ID, "callback: {callback:?}");
        }
    }
}
