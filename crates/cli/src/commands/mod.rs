//! Command handlers.
//!
//! Handlers are plain async functions over a [`Context`]; rendering lives in
//! [`crate::render`].

pub mod auth;
pub mod student;
pub mod worker;

use std::io::Write;
use std::sync::Arc;

use laundrio_client::auth::restore_for_role;
use laundrio_client::{
    ClientConfig, ClientError, ConfigError, FileStore, HttpApi, RecordingNotifier, Session,
    StorageError,
};
use laundrio_core::Role;
use thiserror::Error;

use crate::render;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A client operation failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Session storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// No persisted session for the role.
    #[error("Not signed in as {0}. Run `laundrio login {0}` first")]
    NotSignedIn(Role),

    /// An `--item` argument was malformed.
    #[error("Invalid item '{0}': expected TYPE:QTY, e.g. Shirt:2")]
    InvalidItem(String),

    /// No password on the command line or in the environment.
    #[error("Password required: pass --password or set LAUNDRIO_PASSWORD")]
    MissingPassword,

    /// Writing output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a command needs.
pub struct Context {
    pub config: ClientConfig,
    pub api: Arc<HttpApi>,
    pub storage: FileStore,
    pub notices: Arc<RecordingNotifier>,
}

impl Context {
    /// Build from the environment.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` or `CliError::Client` if the configuration
    /// is invalid or the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, CliError> {
        let config = ClientConfig::from_env()?;
        let api = Arc::new(HttpApi::from_config(&config)?);
        let storage = FileStore::new(config.storage_dir.clone());

        tracing::debug!(api_url = %config.api_url, storage = %storage.dir().display(), "Context ready");

        Ok(Self {
            config,
            api,
            storage,
            notices: Arc::new(RecordingNotifier::new()),
        })
    }

    /// The persisted session for `role`.
    ///
    /// # Errors
    ///
    /// Returns `CliError::NotSignedIn` if there is none.
    pub fn session_for(&self, role: Role) -> Result<Session, CliError> {
        restore_for_role(self.storage.clone(), role)
            .active()
            .cloned()
            .ok_or(CliError::NotSignedIn(role))
    }

    /// Print and clear the notices collected during the command: successes
    /// to stdout, errors to stderr. Returns whether any error was printed.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Io` if output cannot be written.
    pub fn flush_notices(&self) -> Result<bool, CliError> {
        let mut out = std::io::stdout().lock();
        let mut err = std::io::stderr().lock();
        let mut reported = false;

        for notice in self.notices.drain() {
            if notice.is_error() {
                reported = true;
                render::notice(&mut err, &notice)?;
            } else {
                render::notice(&mut out, &notice)?;
            }
        }

        out.flush()?;
        Ok(reported)
    }
}
