//! Birthday Messenger core library.
//!
//! Client-side logic shared by the Birthday Messenger front ends:
//!
//! - `storage`: the local-storage style key/value persistence everything else writes into
//! - `auth`: the session cache gating authenticated actions
//! - `theme`: dark/light preference with pluggable persistence and native sync
//! - `downloads`: the release artifact list and its version ordering
//! - `api`: typed client for the Birthday Messenger backend
//! - `service`: session-gated facade over the API client
//! - `config`: application configuration and directory locations

pub mod api;
pub mod auth;
pub mod config;
pub mod downloads;
pub mod models;
pub mod service;
pub mod storage;
pub mod theme;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{SessionData, SessionStore};
pub use config::Config;
pub use downloads::{Channel, DownloadArtifact, DownloadCatalog};
pub use service::{MessengerService, ServiceError};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use theme::{ThemeMode, ThemeState};
