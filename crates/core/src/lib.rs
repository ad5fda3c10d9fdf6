#![warn(clippy::all, missing_docs)]

//! Core domain logic for romlink.
//!
//! This crate hosts the data models, settings handling, path and timestamp
//! normalisation, the local save/state store, and the thin remote library
//! client used by the command-line front-end and any future frontends.

pub mod api;
pub mod compare;
pub mod config;
pub mod library;
pub mod models;
pub mod paths;
pub mod timestamp;

pub use api::{ApiError, RemoteClient};
pub use compare::{Comparison, SyncStatus};
pub use config::AppConfig;
pub use library::{LocalStore, SaveKind};
pub use models::{FileItem, Game, Platform, RemoteFile, ServerSave, ServerState};
pub use paths::sanitize;
pub use timestamp::{ParseError, Timestamp};
