//! `reqwest` implementation of the backend contract.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use laundrio_core::{EntryId, LaundryEntry, NewEntry};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::api::{
    AuthResponse, Credentials, EntryRef, EntryScope, LaundryApi, MutationAck, ProviderProfile,
    Registration, StudentAuthResponse,
};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::Session;

/// Laundr.io backend client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpApi {
    inner: Arc<HttpApiInner>,
}

struct HttpApiInner {
    client: reqwest::Client,
    base: String,
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApi")
            .field("base", &self.inner.base)
            .finish_non_exhaustive()
    }
}

impl HttpApi {
    /// Client for the API at `base`, e.g. `https://laundry.example/api`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(base: &Url, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(HttpApiInner {
                client,
                base: base.as_str().trim_end_matches('/').to_string(),
            }),
        })
    }

    /// Client configured from [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// See [`HttpApi::new`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&config.api_url, config.request_timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base)
    }

    fn request(&self, method: Method, path: &str, session: Option<&Session>) -> RequestBuilder {
        let builder = self.inner.client.request(method, self.url(path));
        match session {
            Some(session) => builder.bearer_auth(session.token().expose_secret()),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        decode(response).await
    }
}

/// Turn a response into `T` or the backend's error.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "Backend rejected request");
        return Err(ClientError::from_status(status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| ClientError::Parse(e.to_string()))
}

/// Percent-encode one path segment.
fn segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[async_trait]
impl LaundryApi for HttpApi {
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .send(self.request(Method::POST, "/auth/login", None).json(credentials))
            .await?;
        debug!(user_id = %auth.user.user_id, "Logged in");
        Ok(auth)
    }

    #[instrument(skip(self, registration), fields(email = %registration.email, role = %registration.role))]
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .send(self.request(Method::POST, "/auth/register", None).json(registration))
            .await?;
        debug!(user_id = %auth.user.user_id, "Registered");
        Ok(auth)
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn worker_login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self
            .send(self.request(Method::POST, "/auth/worker/login", None).json(credentials))
            .await?;
        debug!(user_id = %auth.user.user_id, "Worker logged in");
        Ok(auth)
    }

    #[instrument(skip(self, profile), fields(email = %profile.email))]
    async fn student_exchange(
        &self,
        profile: &ProviderProfile,
    ) -> Result<StudentAuthResponse, ClientError> {
        let auth: StudentAuthResponse = self
            .send(self.request(Method::POST, "/auth/student/google", None).json(profile))
            .await?;
        debug!(user_id = %auth.user.user_id, "Student identity exchanged");
        Ok(auth)
    }

    #[instrument(skip(self, session), fields(role = %session.role()))]
    async fn list_entries(
        &self,
        session: &Session,
        scope: &EntryScope,
    ) -> Result<Vec<LaundryEntry>, ClientError> {
        let path = match scope {
            EntryScope::Student(student_id) => {
                format!("/laundry/student/{}", segment(student_id.as_str()))
            }
            EntryScope::All => "/laundry/all".to_string(),
        };

        let entries: Vec<LaundryEntry> = self
            .send(self.request(Method::GET, &path, Some(session)))
            .await?;
        debug!(count = entries.len(), "Fetched entries");
        Ok(entries)
    }

    #[instrument(skip(self, session, entry), fields(student_id = %entry.student_id(), total = entry.total_items()))]
    async fn create_entry(
        &self,
        session: &Session,
        entry: &NewEntry,
    ) -> Result<MutationAck, ClientError> {
        let ack: MutationAck = self
            .send(self.request(Method::POST, "/laundry/create", Some(session)).json(entry))
            .await?;
        debug!(entry_id = %ack.entry_id, "Entry created");
        Ok(ack)
    }

    #[instrument(skip(self, session), fields(entry_id = %entry_id))]
    async fn complete_entry(
        &self,
        session: &Session,
        entry_id: &EntryId,
    ) -> Result<MutationAck, ClientError> {
        let ack: MutationAck = self
            .send(
                self.request(Method::PUT, "/laundry/complete", Some(session))
                    .json(&EntryRef { entry_id }),
            )
            .await?;
        debug!("Entry marked completed");
        Ok(ack)
    }

    #[instrument(skip(self, session), fields(entry_id = %entry_id))]
    async fn pickup_entry(
        &self,
        session: &Session,
        entry_id: &EntryId,
    ) -> Result<MutationAck, ClientError> {
        let ack: MutationAck = self
            .send(
                self.request(Method::PUT, "/laundry/pickup", Some(session))
                    .json(&EntryRef { entry_id }),
            )
            .await?;
        debug!("Entry marked picked up");
        Ok(ack)
    }
}
