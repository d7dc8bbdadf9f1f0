//! Session store: the signed-in identity and its bearer token.
//!
//! Sessions are persisted in a small key/value store, the terminal
//! counterpart of browser local storage. Each role writes under its own pair
//! of keys so a student and a worker session can coexist on one machine:
//!
//! | Namespace | Token key | User key |
//! |---|---|---|
//! | generic | `token` | `user` |
//! | student | `student_token` | `student_user` |
//! | worker | `worker_token` | `worker_user` |
//!
//! Restoring never fails: missing, partial or corrupt state simply means
//! "not signed in".

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use laundrio_core::{Role, SessionUser};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the underlying key/value storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("{action} '{key}': {source}")]
    Io {
        /// What was being done.
        action: &'static str,
        /// Storage key involved.
        key: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// A value could not be encoded.
    #[error("failed to encode '{key}': {message}")]
    Encode {
        /// Storage key involved.
        key: String,
        /// Encoder message.
        message: String,
    },
}

/// String key/value persistence.
pub trait KeyValueStore: Send + Sync {
    /// Read a key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `dir`; the directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                action: "read",
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |action, source| StorageError::Io {
            action,
            key: key.to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(|e| io_err("create directory for", e))?;

        // Write-then-rename so a crash never leaves half a token on disk
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| io_err("write", e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err("replace", e))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io {
                action: "remove",
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.map().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.map().remove(key);
        Ok(())
    }
}

/// Where a session is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionNamespace {
    /// Credential login and registration.
    Generic,
    /// Student sign-in through the identity provider.
    Student,
    /// Worker login.
    Worker,
}

impl SessionNamespace {
    /// Storage key for the bearer token.
    #[must_use]
    pub const fn token_key(self) -> &'static str {
        match self {
            Self::Generic => "token",
            Self::Student => "student_token",
            Self::Worker => "worker_token",
        }
    }

    /// Storage key for the serialized user.
    #[must_use]
    pub const fn user_key(self) -> &'static str {
        match self {
            Self::Generic => "user",
            Self::Student => "student_user",
            Self::Worker => "worker_user",
        }
    }

    /// Role whose sessions live here; `None` for the generic namespace.
    #[must_use]
    pub const fn role(self) -> Option<Role> {
        match self {
            Self::Generic => None,
            Self::Student => Some(Role::Student),
            Self::Worker => Some(Role::Worker),
        }
    }

    /// Dedicated namespace for a role.
    #[must_use]
    pub const fn for_role(role: Role) -> Self {
        match role {
            Role::Student => Self::Student,
            Role::Worker => Self::Worker,
        }
    }
}

impl std::fmt::Display for SessionNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::Student => write!(f, "student"),
            Self::Worker => write!(f, "worker"),
        }
    }
}

impl std::str::FromStr for SessionNamespace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generic" => Ok(Self::Generic),
            "student" => Ok(Self::Student),
            "worker" => Ok(Self::Worker),
            _ => Err(format!("invalid session namespace: {s}")),
        }
    }
}

/// A signed-in identity and the token that proves it.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    user: SessionUser,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

impl Session {
    /// Pair a token with its user.
    #[must_use]
    pub const fn new(token: SecretString, user: SessionUser) -> Self {
        Self { token, user }
    }

    /// Bearer token.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// Signed-in user.
    #[must_use]
    pub const fn user(&self) -> &SessionUser {
        &self.user
    }

    /// Signed-in user's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.user.role
    }
}

/// Role-scoped session persistence with an explicit active session.
///
/// Nothing is read at construction; call [`SessionStore::restore`] once at
/// startup.
#[derive(Debug)]
pub struct SessionStore<S> {
    storage: S,
    namespace: SessionNamespace,
    active: Option<(SessionNamespace, Session)>,
}

impl<S: KeyValueStore> SessionStore<S> {
    /// Store writing under `namespace`.
    #[must_use]
    pub const fn new(storage: S, namespace: SessionNamespace) -> Self {
        Self {
            storage,
            namespace,
            active: None,
        }
    }

    /// Namespace this store writes to.
    #[must_use]
    pub const fn namespace(&self) -> SessionNamespace {
        self.namespace
    }

    /// The active session, if any.
    #[must_use]
    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref().map(|(_, session)| session)
    }

    /// Read the persisted session and make it active.
    ///
    /// Role namespaces also accept a session from the generic namespace
    /// whose user has that role, since credential login writes there.
    pub fn restore(&mut self) -> Option<&Session> {
        self.active = read_session(&self.storage, self.namespace)
            .map(|session| (self.namespace, session))
            .or_else(|| {
                let role = self.namespace.role()?;
                read_session(&self.storage, SessionNamespace::Generic)
                    .filter(|session| session.role() == role)
                    .map(|session| (SessionNamespace::Generic, session))
            });

        match &self.active {
            Some((from, session)) => debug!(
                namespace = %from,
                user_id = %session.user().user_id,
                "Restored session"
            ),
            None => debug!(namespace = %self.namespace, "No persisted session"),
        }

        self.active()
    }

    /// Persist `user` and `token` and make them the active session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be written. The active
    /// session is left untouched in that case, and the namespace is cleared
    /// so no previous user is left paired with the new token.
    pub fn login(&mut self, user: SessionUser, token: SecretString) -> Result<&Session, StorageError> {
        let user_json = serde_json::to_string(&user).map_err(|e| StorageError::Encode {
            key: self.namespace.user_key().to_string(),
            message: e.to_string(),
        })?;

        // User first, token last: a token on disk implies its user was written
        let written = self
            .storage
            .set(self.namespace.user_key(), &user_json)
            .and_then(|()| {
                self.storage
                    .set(self.namespace.token_key(), token.expose_secret())
            });
        if let Err(e) = written {
            warn!(namespace = %self.namespace, error = %e, "Failed to persist session");
            if let Err(cleanup) = clear_namespace(&self.storage, self.namespace) {
                warn!(namespace = %self.namespace, error = %cleanup, "Failed to clear partial session");
            }
            return Err(e);
        }

        info!(namespace = %self.namespace, user_id = %user.user_id, role = %user.role, "Signed in");

        let session = Session::new(token, user);
        Ok(&self.active.insert((self.namespace, session)).1)
    }

    /// Clear persisted state and return to unauthenticated.
    ///
    /// Clears this store's namespace and, if the active session was restored
    /// from elsewhere, that namespace too.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a key cannot be removed.
    pub fn logout(&mut self) -> Result<(), StorageError> {
        let source = self.active.take().map(|(from, _)| from);

        clear_namespace(&self.storage, self.namespace)?;
        if let Some(from) = source.filter(|from| *from != self.namespace) {
            clear_namespace(&self.storage, from)?;
        }

        info!(namespace = %self.namespace, "Signed out");
        Ok(())
    }
}

fn clear_namespace<S: KeyValueStore>(storage: &S, namespace: SessionNamespace) -> Result<(), StorageError> {
    storage.remove(namespace.token_key())?;
    storage.remove(namespace.user_key())
}

/// Read one namespace; anything short of a complete, well-formed session
/// is treated as absent.
fn read_session<S: KeyValueStore>(storage: &S, namespace: SessionNamespace) -> Option<Session> {
    let read = |key: &str| match storage.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Failed to read persisted session");
            None
        }
    };

    let token = read(namespace.token_key())?;
    let token = token.trim();
    let user_json = read(namespace.user_key())?;
    if token.is_empty() {
        return None;
    }

    let user: SessionUser = match serde_json::from_str(&user_json) {
        Ok(user) => user,
        Err(e) => {
            warn!(namespace = %namespace, error = %e, "Ignoring corrupt persisted user");
            return None;
        }
    };

    if !user.is_well_formed() || namespace.role().is_some_and(|role| role != user.role) {
        warn!(namespace = %namespace, role = %user.role, "Ignoring mismatched persisted user");
        return None;
    }

    Some(Session::new(SecretString::from(token.to_string()), user))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use laundrio_core::{Email, StudentId, UserId};

    use super::*;

    fn student() -> SessionUser {
        SessionUser {
            user_id: UserId::new("user_aaaaaaaaaaaa"),
            email: Email::parse("21bcs042@iiitdwd.ac.in").unwrap(),
            name: "Asha".to_string(),
            role: Role::Student,
            student_id: Some(StudentId::new("21BCS042")),
            picture: None,
        }
    }

    fn worker() -> SessionUser {
        SessionUser {
            user_id: UserId::new("user_bbbbbbbbbbbb"),
            email: Email::parse("counter@iiitdwd.ac.in").unwrap(),
            name: "Ravi".to_string(),
            role: Role::Worker,
            student_id: None,
            picture: None,
        }
    }

    fn token(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn test_login_then_restore() {
        let storage = MemoryStore::new();
        let mut store = SessionStore::new(storage.clone(), SessionNamespace::Student);
        store.login(student(), token("tok-student")).unwrap();

        let mut fresh = SessionStore::new(storage, SessionNamespace::Student);
        let session = fresh.restore().unwrap();
        assert_eq!(session.user(), &student());
        assert_eq!(session.token().expose_secret(), "tok-student");
    }

    #[test]
    fn test_student_and_worker_coexist() {
        let storage = MemoryStore::new();
        SessionStore::new(storage.clone(), SessionNamespace::Student)
            .login(student(), token("s"))
            .unwrap();
        SessionStore::new(storage.clone(), SessionNamespace::Worker)
            .login(worker(), token("w"))
            .unwrap();

        let mut worker_store = SessionStore::new(storage.clone(), SessionNamespace::Worker);
        worker_store.logout().unwrap();

        let mut student_store = SessionStore::new(storage.clone(), SessionNamespace::Student);
        assert_eq!(student_store.restore().unwrap().role(), Role::Student);
        assert!(SessionStore::new(storage, SessionNamespace::Worker).restore().is_none());
    }

    #[test]
    fn test_logout_clears_keys() {
        let storage = MemoryStore::new();
        let mut store = SessionStore::new(storage.clone(), SessionNamespace::Worker);
        store.login(worker(), token("w")).unwrap();
        store.logout().unwrap();

        assert!(store.active().is_none());
        assert_eq!(storage.get("worker_token").unwrap(), None);
        assert_eq!(storage.get("worker_user").unwrap(), None);
    }

    #[test]
    fn test_partial_state_is_absent() {
        let storage = MemoryStore::new();
        storage.set("student_token", "tok").unwrap();

        let mut store = SessionStore::new(storage.clone(), SessionNamespace::Student);
        assert!(store.restore().is_none());

        storage.remove("student_token").unwrap();
        storage
            .set("student_user", &serde_json::to_string(&student()).unwrap())
            .unwrap();
        assert!(store.restore().is_none());
    }

    #[test]
    fn test_corrupt_or_mismatched_state_is_absent() {
        let storage = MemoryStore::new();
        storage.set("worker_token", "tok").unwrap();
        storage.set("worker_user", "{not json").unwrap();
        let mut store = SessionStore::new(storage.clone(), SessionNamespace::Worker);
        assert!(store.restore().is_none());

        // A student identity under the worker keys is not a worker session
        storage
            .set("worker_user", &serde_json::to_string(&student()).unwrap())
            .unwrap();
        assert!(store.restore().is_none());

        storage.set("worker_token", "   ").unwrap();
        storage
            .set("worker_user", &serde_json::to_string(&worker()).unwrap())
            .unwrap();
        assert!(store.restore().is_none());
    }

    #[test]
    fn test_student_without_student_id_is_absent() {
        let storage = MemoryStore::new();
        let mut user = student();
        user.student_id = None;
        storage.set("student_token", "tok").unwrap();
        storage
            .set("student_user", &serde_json::to_string(&user).unwrap())
            .unwrap();

        assert!(SessionStore::new(storage, SessionNamespace::Student).restore().is_none());
    }

    #[test]
    fn test_role_namespace_falls_back_to_generic() {
        let storage = MemoryStore::new();
        SessionStore::new(storage.clone(), SessionNamespace::Generic)
            .login(student(), token("generic"))
            .unwrap();

        let mut worker_store = SessionStore::new(storage.clone(), SessionNamespace::Worker);
        assert!(worker_store.restore().is_none());

        let mut student_store = SessionStore::new(storage.clone(), SessionNamespace::Student);
        let session = student_store.restore().unwrap();
        assert_eq!(session.token().expose_secret(), "generic");

        student_store.logout().unwrap();
        assert_eq!(storage.get("token").unwrap(), None);
        assert_eq!(storage.get("user").unwrap(), None);
    }

    /// Delegates to a `MemoryStore` but fails the `n`th `set` from now on.
    struct FailingSet {
        inner: MemoryStore,
        fail_at: Mutex<Option<usize>>,
    }

    impl FailingSet {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                fail_at: Mutex::new(None),
            }
        }

        fn fail_nth_set(&self, n: usize) {
            *self.fail_at.lock().unwrap() = Some(n);
        }
    }

    impl KeyValueStore for FailingSet {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let mut fail_at = self.fail_at.lock().unwrap();
            match *fail_at {
                Some(1) => {
                    *fail_at = None;
                    Err(StorageError::Io {
                        action: "replace",
                        key: key.to_string(),
                        source: std::io::Error::other("disk full"),
                    })
                }
                Some(n) => {
                    *fail_at = Some(n - 1);
                    self.inner.set(key, value)
                }
                None => self.inner.set(key, value),
            }
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_login_write_never_mixes_sessions() {
        let mut other = worker();
        other.user_id = UserId::new("user_cccccccccccc");
        other.name = "Meena".to_string();

        for failing_set in [1, 2] {
            let storage = MemoryStore::new();
            let mut store = SessionStore::new(FailingSet::new(storage.clone()), SessionNamespace::Worker);
            store.login(worker(), token("tok-ravi")).unwrap();

            store.storage.fail_nth_set(failing_set);
            let err = store.login(other.clone(), token("tok-meena")).unwrap_err();
            assert!(matches!(err, StorageError::Io { .. }));

            // The in-memory session is untouched and nothing is left on disk
            // to pair Meena's token with Ravi's user.
            assert_eq!(store.active().unwrap().user().name, "Ravi");
            let mut fresh = SessionStore::new(storage.clone(), SessionNamespace::Worker);
            assert!(fresh.restore().is_none(), "failing set #{failing_set}");
            assert_eq!(storage.get("worker_token").unwrap(), None);
        }
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new(token("super-secret-token"), worker());
        let debug = format!("{session:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-token"));
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStore::new(dir.path().join("nested"));

        assert_eq!(storage.get("worker_token").unwrap(), None);
        storage.set("worker_token", "abc").unwrap();
        assert_eq!(storage.get("worker_token").unwrap().as_deref(), Some("abc"));

        storage.remove("worker_token").unwrap();
        storage.remove("worker_token").unwrap();
        assert_eq!(storage.get("worker_token").unwrap(), None);
    }

    #[test]
    fn test_file_store_sessions_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        SessionStore::new(FileStore::new(dir.path()), SessionNamespace::Worker)
            .login(worker(), token("w-token"))
            .unwrap();

        let mut store = SessionStore::new(FileStore::new(dir.path()), SessionNamespace::Worker);
        assert_eq!(store.restore().unwrap().user().name, "Ravi");
    }

    #[test]
    fn test_namespace_keys() {
        assert_eq!(SessionNamespace::Generic.token_key(), "token");
        assert_eq!(SessionNamespace::Student.user_key(), "student_user");
        assert_eq!(SessionNamespace::for_role(Role::Worker), SessionNamespace::Worker);
        assert_eq!("student".parse::<SessionNamespace>(), Ok(SessionNamespace::Student));
    }
}
