//! Session cache for gating authenticated actions.
//!
//! This module provides:
//! - `SessionStore`: token + expiry persisted in a `KeyValueStore`
//! - `SessionData`: a snapshot of the stored record
//!
//! Sessions expire after 60 minutes unless configured otherwise.

pub mod session;

pub use session::{SessionData, SessionStore, AUTH_CACHE_KEY, DEFAULT_TTL_MINUTES, TOKEN_KEY};
