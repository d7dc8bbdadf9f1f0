//! Error types for the Laundr.io client.

use serde::Deserialize;
use thiserror::Error;

use crate::session::StorageError;

/// Errors surfaced by client operations.
///
/// Backend-originated failures keep the backend's own message; the client
/// neither retries nor reinterprets them.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A client-side precondition failed; nothing was sent.
    #[error("{0}")]
    Validation(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(String),

    /// The backend rejected the token or the caller's role (401/403).
    #[error("{message}")]
    Unauthorized {
        /// HTTP status code.
        status: u16,
        /// Backend detail.
        message: String,
    },

    /// The backend refused the request (validation, unknown entry, illegal
    /// transition, ...).
    #[error("{message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Backend detail.
        message: String,
    },

    /// A success response could not be decoded.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// Persisted session state could not be written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// No session for the requested role.
    #[error("not signed in as {0}")]
    NotAuthenticated(laundrio_core::Role),
}

impl ClientError {
    /// Build the error for a non-success HTTP response.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = detail_from_body(body);
        if status == 401 || status == 403 {
            Self::Unauthorized { status, message }
        } else {
            Self::Rejected { status, message }
        }
    }

    /// Message to show the user: the backend's or validation's own text
    /// when there is one, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(message)
            | Self::Unauthorized { message, .. }
            | Self::Rejected { message, .. }
                if !message.is_empty() =>
            {
                message.clone()
            }
            _ => fallback.to_string(),
        }
    }

    /// Whether the failure means the stored token is no longer accepted.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { status: 401, .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<laundrio_core::EntryError> for ClientError {
    fn from(e: laundrio_core::EntryError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<laundrio_core::EmailError> for ClientError {
    fn from(e: laundrio_core::EmailError) -> Self {
        Self::Validation(e.to_string())
    }
}

/// Error body returned by the backend: `{"detail": ...}`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    /// A string for handled errors, a list of field errors for request
    /// validation failures.
    pub detail: serde_json::Value,
}

fn detail_from_body(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ApiErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
