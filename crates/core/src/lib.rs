//! Laundr.io Core - Laundry entry types and status lifecycle.
//!
//! This crate provides the domain types shared by every Laundr.io component:
//! - `client` - REST client, session store, fetcher and mutation dispatcher
//! - `cli` - Terminal front end for students and workers
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage,
//! no HTTP clients. Everything here can be unit tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, e-mail addresses, entry statuses, entries and users
//! - [`view`] - View models derived from an entry collection (student and worker)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod view;

pub use types::*;
pub use view::{StatusFilter, StudentView, WorkerStats, WorkerView};
