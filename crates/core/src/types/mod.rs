//! Core types for Laundr.io.
//!
//! This module provides type-safe wrappers for the laundry domain.

pub mod email;
pub mod entry;
pub mod id;
pub mod status;
pub mod user;

pub use email::{Email, EmailError};
pub use entry::{EntryError, LaundryEntry, LaundryItem, NewEntry};
pub use id::*;
pub use status::*;
pub use user::SessionUser;
