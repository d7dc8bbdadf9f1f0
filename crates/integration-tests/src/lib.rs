//! Integration tests for Laundr.io.
//!
//! [`MockBackend`] is an in-process `axum` server speaking the backend's REST
//! contract, plus the identity provider's session-data endpoint. Tests drive
//! the real `reqwest` client against it.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p laundrio-integration-tests
//! ```
//!
//! The mock is stricter than the production backend in one respect: it
//! refuses illegal status transitions (e.g. completing a picked-up entry)
//! with `400`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use laundrio_client::{ClientConfig, ConfigError};
use laundrio_core::{
    Email, EntryId, EntryStatus, LaundryEntry, LaundryItem, Role, SessionUser, StudentId, UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Campus domain the mock accepts for student sign-in.
pub const CAMPUS_DOMAIN: &str = "iiitdwd.ac.in";

// =============================================================================
// State
// =============================================================================

struct Account {
    user: SessionUser,
    password: Option<String>,
}

/// A signed-in identity at the provider, keyed by session ID.
#[derive(Debug, Clone, Serialize)]
struct ProviderSession {
    id: String,
    email: String,
    name: String,
    picture: String,
    session_token: String,
}

#[derive(Default)]
struct Inner {
    accounts: Vec<Account>,
    tokens: HashMap<String, UserId>,
    entries: Vec<LaundryEntry>,
    provider_sessions: HashMap<String, ProviderSession>,
}

#[derive(Clone, Default)]
struct MockState {
    inner: Arc<Mutex<Inner>>,
    mutations: Arc<AtomicUsize>,
    exchanges: Arc<AtomicUsize>,
}

impl MockState {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn new_user_id() -> UserId {
    let hex: String = uuid::Uuid::new_v4().simple().to_string().chars().take(12).collect();
    UserId::new(format!("user_{hex}"))
}

fn new_token() -> String {
    format!("tok_{}", uuid::Uuid::new_v4().simple())
}

// =============================================================================
// Errors
// =============================================================================

/// `{"detail": ...}` error response.
struct ApiError {
    status: StatusCode,
    detail: Value,
}

impl ApiError {
    fn new(status: StatusCode, detail: &str) -> Self {
        Self {
            status,
            detail: Value::String(detail.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn authenticate(inner: &Inner, headers: &HeaderMap) -> Result<SessionUser, ApiError> {
    let token = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::new(StatusCode::FORBIDDEN, "Not authenticated"))?;

    let user_id = inner
        .tokens
        .get(token)
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Invalid token"))?;

    inner
        .accounts
        .iter()
        .find(|account| &account.user.user_id == user_id)
        .map(|account| account.user.clone())
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "User not found"))
}

fn require_worker(user: &SessionUser, detail: &str) -> Result<(), ApiError> {
    if user.role == Role::Worker {
        Ok(())
    } else {
        Err(ApiError::new(StatusCode::FORBIDDEN, detail))
    }
}

// =============================================================================
// Auth handlers
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    password: String,
    name: String,
    role: Role,
    student_id: Option<String>,
}

#[derive(Serialize)]
struct AuthBody {
    token: String,
    user: SessionUser,
}

fn issue_token(inner: &mut Inner, user: &SessionUser) -> String {
    let token = new_token();
    inner.tokens.insert(token.clone(), user.user_id.clone());
    token
}

async fn register(
    State(state): State<MockState>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<AuthBody> {
    let email = Email::parse(&body.email)
        .map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()))?;

    let mut inner = state.lock();
    if inner.accounts.iter().any(|a| a.user.email == email) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Email already registered"));
    }

    let user = SessionUser {
        user_id: new_user_id(),
        email,
        name: body.name,
        role: body.role,
        student_id: body.student_id.map(StudentId::new),
        picture: None,
    };
    inner.accounts.push(Account {
        user: user.clone(),
        password: Some(body.password),
    });

    let token = issue_token(&mut inner, &user);
    Ok(Json(AuthBody { token, user }))
}

async fn login(State(state): State<MockState>, Json(body): Json<LoginBody>) -> ApiResult<AuthBody> {
    let mut inner = state.lock();
    let user = inner
        .accounts
        .iter()
        .find(|a| a.user.email.as_str() == body.email && a.password.as_deref() == Some(body.password.as_str()))
        .map(|a| a.user.clone())
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;

    let token = issue_token(&mut inner, &user);
    Ok(Json(AuthBody { token, user }))
}

async fn worker_login(
    State(state): State<MockState>,
    Json(body): Json<LoginBody>,
) -> ApiResult<AuthBody> {
    let mut inner = state.lock();
    let account = inner
        .accounts
        .iter()
        .find(|a| a.user.email.as_str() == body.email && a.user.role == Role::Worker)
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Worker not found"))?;

    if account.password.as_deref() != Some(body.password.as_str()) {
        return Err(ApiError::new(StatusCode::UNAUTHORIZED, "Invalid credentials"));
    }

    let user = account.user.clone();
    let token = issue_token(&mut inner, &user);
    Ok(Json(AuthBody { token, user }))
}

#[derive(Deserialize)]
struct ProfileBody {
    email: String,
    name: String,
    #[serde(default)]
    picture: String,
    session_token: String,
}

async fn student_exchange(
    State(state): State<MockState>,
    Json(body): Json<ProfileBody>,
) -> Result<Json<Value>, ApiError> {
    state.exchanges.fetch_add(1, Ordering::SeqCst);

    let email = Email::parse(&body.email)
        .map_err(|e| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string()))?;
    if !email.is_in_domain(CAMPUS_DOMAIN) {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "Only @iiitdwd.ac.in emails allowed",
        ));
    }

    let mut inner = state.lock();
    let picture = (!body.picture.is_empty()).then_some(body.picture);
    let user = if let Some(account) = inner.accounts.iter_mut().find(|a| a.user.email == email) {
        account.user.name = body.name;
        account.user.picture = picture;
        account.user.clone()
    } else {
        let user = SessionUser {
            user_id: new_user_id(),
            student_id: Some(StudentId::new(email.derived_student_id())),
            email,
            name: body.name,
            role: Role::Student,
            picture,
        };
        inner.accounts.push(Account {
            user: user.clone(),
            password: None,
        });
        user
    };

    inner
        .tokens
        .insert(body.session_token.clone(), user.user_id.clone());
    Ok(Json(json!({ "session_token": body.session_token, "user": user })))
}

async fn session_data(
    State(state): State<MockState>,
    headers: HeaderMap,
) -> Result<Json<ProviderSession>, ApiError> {
    let session_id = headers
        .get("x-session-id")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "Missing X-Session-ID"))?;

    state
        .lock()
        .provider_sessions
        .get(session_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Session not found"))
}

// =============================================================================
// Laundry handlers
// =============================================================================

#[derive(Deserialize)]
struct CreateBody {
    student_id: String,
    student_name: String,
    items: Vec<LaundryItem>,
}

#[derive(Deserialize)]
struct EntryRefBody {
    entry_id: EntryId,
}

fn total_of(items: &[LaundryItem]) -> Option<u32> {
    items
        .iter()
        .try_fold(0u32, |total, item| total.checked_add(item.quantity))
}

fn newest_first<'a>(entries: impl DoubleEndedIterator<Item = &'a LaundryEntry>) -> Vec<LaundryEntry> {
    entries.rev().cloned().collect()
}

async fn list_all(State(state): State<MockState>, headers: HeaderMap) -> ApiResult<Vec<LaundryEntry>> {
    let inner = state.lock();
    let user = authenticate(&inner, &headers)?;
    require_worker(&user, "Only workers can view all entries")?;
    Ok(Json(newest_first(inner.entries.iter())))
}

async fn list_for_student(
    State(state): State<MockState>,
    Path(student_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Vec<LaundryEntry>> {
    let inner = state.lock();
    let user = authenticate(&inner, &headers)?;
    if user.role == Role::Student
        && user.student_id.as_ref().map(StudentId::as_str) != Some(student_id.as_str())
    {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "Cannot access other student's data",
        ));
    }

    Ok(Json(newest_first(
        inner
            .entries
            .iter()
            .filter(|entry| entry.student_id.as_str() == student_id),
    )))
}

async fn create(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<CreateBody>,
) -> Result<Json<Value>, ApiError> {
    state.mutations.fetch_add(1, Ordering::SeqCst);
    let mut inner = state.lock();
    let user = authenticate(&inner, &headers)?;
    require_worker(&user, "Only workers can create entries")?;

    if body.items.is_empty() {
        return Err(ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: json!([{ "loc": ["body", "items"], "msg": "items must not be empty" }]),
        });
    }

    let total_items = total_of(&body.items).ok_or_else(|| ApiError {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        detail: json!([{ "loc": ["body", "items"], "msg": "total quantity out of range" }]),
    })?;

    let entry = LaundryEntry {
        entry_id: EntryId::new(uuid::Uuid::new_v4().to_string()),
        student_id: StudentId::new(body.student_id),
        student_name: body.student_name,
        total_items,
        items: body.items,
        status: EntryStatus::Received,
        submission_date: Utc::now(),
        completion_date: None,
        worker_id: Some(user.user_id),
    };
    let entry_id = entry.entry_id.clone();
    inner.entries.push(entry);

    tracing::debug!(%entry_id, "Mock created entry");
    Ok(Json(json!({ "message": "Laundry entry created", "entry_id": entry_id })))
}

fn find_entry<'a>(inner: &'a mut Inner, entry_id: &EntryId) -> Result<&'a mut LaundryEntry, ApiError> {
    inner
        .entries
        .iter_mut()
        .find(|entry| &entry.entry_id == entry_id)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Entry not found"))
}

async fn complete(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<EntryRefBody>,
) -> Result<Json<Value>, ApiError> {
    state.mutations.fetch_add(1, Ordering::SeqCst);
    let mut inner = state.lock();
    let user = authenticate(&inner, &headers)?;
    require_worker(&user, "Only workers can mark as completed")?;

    let entry = find_entry(&mut inner, &body.entry_id)?;
    if !entry.status.can_transition_to(EntryStatus::Completed) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            &format!("Cannot complete an entry that is {}", entry.status),
        ));
    }
    entry.status = EntryStatus::Completed;
    entry.completion_date = Some(Utc::now());

    Ok(Json(json!({ "message": "Laundry marked as completed", "entry_id": body.entry_id })))
}

async fn pickup(
    State(state): State<MockState>,
    headers: HeaderMap,
    Json(body): Json<EntryRefBody>,
) -> Result<Json<Value>, ApiError> {
    state.mutations.fetch_add(1, Ordering::SeqCst);
    let mut inner = state.lock();
    let user = authenticate(&inner, &headers)?;

    let entry = find_entry(&mut inner, &body.entry_id)?;
    if user.role == Role::Student && user.student_id.as_ref() != Some(&entry.student_id) {
        return Err(ApiError::new(
            StatusCode::FORBIDDEN,
            "Cannot mark other student's laundry",
        ));
    }
    if !entry.status.can_transition_to(EntryStatus::PickedUp) {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            &format!("Cannot pick up an entry that is {}", entry.status),
        ));
    }
    entry.status = EntryStatus::PickedUp;

    Ok(Json(json!({ "message": "Laundry marked as picked up", "entry_id": body.entry_id })))
}

fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/worker/login", post(worker_login))
        .route("/api/auth/student/google", post(student_exchange))
        .route("/api/laundry/all", get(list_all))
        .route("/api/laundry/student/{student_id}", get(list_for_student))
        .route("/api/laundry/create", post(create))
        .route("/api/laundry/complete", put(complete))
        .route("/api/laundry/pickup", put(pickup))
        .route("/auth/v1/env/oauth/session-data", get(session_data))
        .with_state(state)
}

// =============================================================================
// Harness
// =============================================================================

/// A running mock backend. The server stops when this is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: MockState,
    handle: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl MockBackend {
    /// Start on an ephemeral localhost port.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = MockState::default();
        let app = router(state.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock backend stopped");
            }
        });

        Ok(Self {
            addr,
            state,
            handle,
        })
    }

    /// `http://127.0.0.1:<port>`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the generated URLs do not parse.
    pub fn config(&self, storage_dir: PathBuf) -> Result<ClientConfig, ConfigError> {
        ClientConfig::local(&self.base_url(), storage_dir)
    }

    fn add_account(&self, user: SessionUser, password: &str) -> SessionUser {
        self.state.lock().accounts.push(Account {
            user: user.clone(),
            password: Some(password.to_string()),
        });
        user
    }

    /// Add a staff account.
    ///
    /// # Errors
    ///
    /// Returns the e-mail parse error for a malformed address.
    pub fn add_worker(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<SessionUser, laundrio_core::EmailError> {
        Ok(self.add_account(
            SessionUser {
                user_id: new_user_id(),
                email: Email::parse(email)?,
                name: name.to_string(),
                role: Role::Worker,
                student_id: None,
                picture: None,
            },
            password,
        ))
    }

    /// Add a student account with a password.
    ///
    /// # Errors
    ///
    /// Returns the e-mail parse error for a malformed address.
    pub fn add_student(
        &self,
        email: &str,
        password: &str,
        name: &str,
        student_id: &str,
    ) -> Result<SessionUser, laundrio_core::EmailError> {
        Ok(self.add_account(
            SessionUser {
                user_id: new_user_id(),
                email: Email::parse(email)?,
                name: name.to_string(),
                role: Role::Student,
                student_id: Some(StudentId::new(student_id)),
                picture: None,
            },
            password,
        ))
    }

    /// Register a provider session that `session_id` will resolve to.
    pub fn add_provider_session(&self, session_id: &str, email: &str, name: &str, session_token: &str) {
        self.state.lock().provider_sessions.insert(
            session_id.to_string(),
            ProviderSession {
                id: format!("provider-{session_id}"),
                email: email.to_string(),
                name: name.to_string(),
                picture: String::new(),
                session_token: session_token.to_string(),
            },
        );
    }

    /// Insert an entry directly, bypassing the API.
    pub fn insert_entry(
        &self,
        student_id: &str,
        student_name: &str,
        items: Vec<LaundryItem>,
        status: EntryStatus,
    ) -> EntryId {
        let now = Utc::now();
        let entry = LaundryEntry {
            entry_id: EntryId::new(uuid::Uuid::new_v4().to_string()),
            student_id: StudentId::new(student_id),
            student_name: student_name.to_string(),
            total_items: total_of(&items).unwrap_or(u32::MAX),
            items,
            status,
            submission_date: now,
            completion_date: (status != EntryStatus::Received).then_some(now),
            worker_id: None,
        };
        let entry_id = entry.entry_id.clone();
        self.state.lock().entries.push(entry);
        entry_id
    }

    /// Current server-side copy of an entry.
    #[must_use]
    pub fn entry(&self, entry_id: &EntryId) -> Option<LaundryEntry> {
        self.state
            .lock()
            .entries
            .iter()
            .find(|entry| &entry.entry_id == entry_id)
            .cloned()
    }

    /// Number of create/complete/pickup requests received.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.state.mutations.load(Ordering::SeqCst)
    }

    /// Number of student identity exchanges received.
    #[must_use]
    pub fn exchange_count(&self) -> usize {
        self.state.exchanges.load(Ordering::SeqCst)
    }

    /// Forget every issued token, as if the backend had restarted.
    pub fn revoke_tokens(&self) {
        self.state.lock().tokens.clear();
    }
}
