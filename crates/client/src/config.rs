//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `LAUNDRIO_API_URL` - Backend API base (default: `http://localhost:8000/api`)
//! - `LAUNDRIO_AUTH_URL` - Identity provider sign-in page
//!   (default: `https://auth.emergentagent.com/`)
//! - `LAUNDRIO_SESSION_DATA_URL` - Identity provider session-data endpoint
//! - `LAUNDRIO_ALLOWED_DOMAIN` - Campus e-mail domain for student sign-in
//!   (default: `iiitdwd.ac.in`)
//! - `LAUNDRIO_STORAGE_DIR` - Where sessions are persisted
//!   (default: `<platform data dir>/laundrio`)
//! - `LAUNDRIO_HTTP_TIMEOUT_SECS` - Request timeout (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_AUTH_URL: &str = "https://auth.emergentagent.com/";
const DEFAULT_SESSION_DATA_URL: &str =
    "https://demobackend.emergentagent.com/auth/v1/env/oauth/session-data";
const DEFAULT_ALLOWED_DOMAIN: &str = "iiitdwd.ac.in";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("No storage directory: set LAUNDRIO_STORAGE_DIR")]
    NoStorageDir,
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API base URL; endpoint paths are appended to it.
    pub api_url: Url,
    /// Identity provider sign-in page for students.
    pub auth_url: Url,
    /// Identity provider endpoint that turns a session ID into a profile.
    pub session_data_url: Url,
    /// Campus domain student e-mails must belong to.
    pub allowed_domain: String,
    /// Directory holding persisted sessions.
    pub storage_dir: PathBuf,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparsable value or
    /// no storage directory can be determined.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = parse_url("LAUNDRIO_API_URL", get("LAUNDRIO_API_URL"), DEFAULT_API_URL)?;
        let auth_url = parse_url("LAUNDRIO_AUTH_URL", get("LAUNDRIO_AUTH_URL"), DEFAULT_AUTH_URL)?;
        let session_data_url = parse_url(
            "LAUNDRIO_SESSION_DATA_URL",
            get("LAUNDRIO_SESSION_DATA_URL"),
            DEFAULT_SESSION_DATA_URL,
        )?;

        let allowed_domain = get("LAUNDRIO_ALLOWED_DOMAIN")
            .map_or_else(|| DEFAULT_ALLOWED_DOMAIN.to_string(), |d| {
                d.trim().trim_start_matches('@').to_lowercase()
            });

        let storage_dir = match get("LAUNDRIO_STORAGE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .map(|dir| dir.join("laundrio"))
                .ok_or(ConfigError::NoStorageDir)?,
        };

        let timeout_secs = match get("LAUNDRIO_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("LAUNDRIO_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            auth_url,
            session_data_url,
            allowed_domain,
            storage_dir,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Configuration pointing every URL at one local base, for tests and
    /// local development against a mock backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `base` is not a valid URL.
    pub fn local(base: &str, storage_dir: PathBuf) -> Result<Self, ConfigError> {
        let base = base.trim_end_matches('/');
        Self::from_lookup(|key| match key {
            "LAUNDRIO_API_URL" => Some(format!("{base}/api")),
            "LAUNDRIO_AUTH_URL" => Some(format!("{base}/auth/")),
            "LAUNDRIO_SESSION_DATA_URL" => {
                Some(format!("{base}/auth/v1/env/oauth/session-data"))
            }
            "LAUNDRIO_STORAGE_DIR" => Some(storage_dir.display().to_string()),
            _ => None,
        })
    }
}

fn parse_url(key: &str, value: Option<String>, default: &str) -> Result<Url, ConfigError> {
    let raw = value.unwrap_or_else(|| default.to_string());
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    Ok(url)
}
