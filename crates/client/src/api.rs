//! The backend REST contract as a trait.
//!
//! [`HttpApi`](crate::http::HttpApi) implements it over `reqwest`; tests
//! substitute in-memory fakes. Every method maps to exactly one request.

use async_trait::async_trait;
use laundrio_core::{Email, EntryId, LaundryEntry, NewEntry, Role, SessionUser, StudentId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ClientError;
use crate::session::Session;

/// `{email, password}` body for the login endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Account e-mail.
    pub email: Email,
    /// Account password.
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

impl Credentials {
    /// Validate and pair an e-mail with a password.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for a malformed e-mail or an empty
    /// password.
    pub fn new(email: &str, password: SecretString) -> Result<Self, ClientError> {
        let email = Email::parse(email)?;
        if password.expose_secret().is_empty() {
            return Err(ClientError::Validation("password is required".to_string()));
        }
        Ok(Self { email, password })
    }
}

/// Body for `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    /// Account e-mail.
    pub email: Email,
    /// Account password.
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
    /// Display name.
    pub name: String,
    /// Requested role.
    pub role: Role,
    /// Roll number; sent as `null` for workers.
    pub student_id: Option<StudentId>,
}

impl Registration {
    /// Validate a registration form.
    ///
    /// Students must supply a student ID; for workers any given ID is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` if a required field is missing.
    pub fn new(
        credentials: Credentials,
        name: &str,
        role: Role,
        student_id: Option<&str>,
    ) -> Result<Self, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("name is required".to_string()));
        }

        let student_id = match role {
            Role::Student => {
                let id = student_id.map(str::trim).filter(|id| !id.is_empty()).ok_or_else(|| {
                    ClientError::Validation("student ID is required for students".to_string())
                })?;
                Some(StudentId::new(id))
            }
            Role::Worker => None,
        };

        Ok(Self {
            email: credentials.email,
            password: credentials.password,
            name: name.to_string(),
            role,
            student_id,
        })
    }
}

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Response of the credential and worker login endpoints.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    /// Bearer token.
    #[serde(deserialize_with = "deserialize_secret")]
    pub token: SecretString,
    /// Signed-in user.
    pub user: SessionUser,
}

/// Response of the student identity exchange.
#[derive(Debug, Deserialize)]
pub struct StudentAuthResponse {
    /// Bearer token (the identity provider's session token).
    #[serde(deserialize_with = "deserialize_secret")]
    pub session_token: SecretString,
    /// Signed-in student.
    pub user: SessionUser,
}

/// Profile returned by the identity provider's session-data endpoint and
/// forwarded verbatim to `POST /auth/student/google`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Provider account ID.
    pub id: String,
    /// Account e-mail.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    #[serde(default)]
    pub picture: String,
    /// Provider session token, reused as the backend bearer token.
    #[serde(serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    pub session_token: SecretString,
}

/// Acknowledgement of a mutation.
///
/// Decoded leniently: any object with an `entry_id` will do, whether the
/// backend returns the full entry or just `{message, entry_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MutationAck {
    /// Entry that was created or changed.
    pub entry_id: EntryId,
    /// Backend message, if any.
    #[serde(default)]
    pub message: Option<String>,
}

/// `{entry_id}` body for the transition endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct EntryRef<'a> {
    /// Target entry.
    pub entry_id: &'a EntryId,
}

/// Which entries to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryScope {
    /// One student's entries.
    Student(StudentId),
    /// Every entry (workers only).
    All,
}

impl EntryScope {
    /// Scope a session is entitled to.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Validation` for a student session without a
    /// student ID.
    pub fn for_session(session: &Session) -> Result<Self, ClientError> {
        match session.role() {
            Role::Worker => Ok(Self::All),
            Role::Student => session
                .user()
                .student_id
                .clone()
                .map(Self::Student)
                .ok_or_else(|| ClientError::Validation("student session has no student ID".to_string())),
        }
    }
}

/// The backend REST contract.
#[async_trait]
pub trait LaundryApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;

    /// `POST /auth/register`
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ClientError>;

    /// `POST /auth/worker/login`
    async fn worker_login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;

    /// `POST /auth/student/google`
    async fn student_exchange(
        &self,
        profile: &ProviderProfile,
    ) -> Result<StudentAuthResponse, ClientError>;

    /// `GET /laundry/student/{student_id}` or `GET /laundry/all`
    async fn list_entries(
        &self,
        session: &Session,
        scope: &EntryScope,
    ) -> Result<Vec<LaundryEntry>, ClientError>;

    /// `POST /laundry/create`
    async fn create_entry(&self, session: &Session, entry: &NewEntry)
    -> Result<MutationAck, ClientError>;

    /// `PUT /laundry/complete`
    async fn complete_entry(
        &self,
        session: &Session,
        entry_id: &EntryId,
    ) -> Result<MutationAck, ClientError>;

    /// `PUT /laundry/pickup`
    async fn pickup_entry(
        &self,
        session: &Session,
        entry_id: &EntryId,
    ) -> Result<MutationAck, ClientError>;
}
