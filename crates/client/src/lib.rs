//! Laundr.io client library.
//!
//! Everything a front end needs to talk to the Laundr.io backend:
//! - [`session`] - Role-scoped session persistence
//! - [`api`] / [`http`] - The REST contract and its `reqwest` implementation
//! - [`auth`] / [`oauth`] - Credential, worker and campus sign-in flows
//! - [`fetcher`] - The last fetched entry collection
//! - [`dispatcher`] - Create, complete and pickup mutations
//! - [`dashboard`] - Student and worker screens tying the above together
//!
//! The backend is the source of truth: the client never edits entries
//! locally and never decides whether a transition is legal.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod dispatcher;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod notice;
pub mod oauth;
pub mod session;

pub use api::{Credentials, EntryScope, LaundryApi, MutationAck, ProviderProfile, Registration};
pub use config::{ClientConfig, ConfigError};
pub use dashboard::{StudentDashboard, WorkerDashboard};
pub use dispatcher::MutationDispatcher;
pub use error::ClientError;
pub use fetcher::EntryCache;
pub use http::HttpApi;
pub use notice::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use oauth::{HttpIdentityProvider, IdentityProvider};
pub use session::{
    FileStore, KeyValueStore, MemoryStore, Session, SessionNamespace, SessionStore, StorageError,
};
