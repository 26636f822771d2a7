use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::KeyValueStore;

/// Storage key holding the raw bearer token
pub const TOKEN_KEY: &str = "auth_token";

/// Storage key holding the expiry record, `{"expires": <epoch ms>}`
pub const AUTH_CACHE_KEY: &str = "auth_cache";

/// Default session lifetime in minutes.
pub const DEFAULT_TTL_MINUTES: i64 = 60;

const MILLIS_PER_MINUTE: i64 = 60_000;

#[derive(Debug, Serialize, Deserialize)]
struct AuthCache {
    expires: i64,
}

/// Snapshot of the persisted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionData {
    /// Stored token; empty when the login response carried none
    pub token: String,
    pub expires_at_ms: i64,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        now_ms() >= self.expires_at_ms
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expires_at_ms).single()
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        self.expires_at_ms.saturating_sub(now_ms()).max(0) / MILLIS_PER_MINUTE
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Session cache over an injected key/value store.
///
/// Every read fails closed: a missing, malformed or expired record means
/// "no session", never an error.
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store the token and an expiry `ttl_minutes` from now.
    pub fn record(&self, token: &str, ttl_minutes: i64) -> Result<SessionData> {
        let expires_at_ms = now_ms().saturating_add(ttl_minutes.saturating_mul(MILLIS_PER_MINUTE));
        self.record_until(token, expires_at_ms)?;
        debug!(ttl_minutes, "Recorded session");
        Ok(SessionData {
            token: token.to_string(),
            expires_at_ms,
        })
    }

    /// Store the token with an absolute expiry in epoch milliseconds.
    pub fn record_until(&self, token: &str, expires_at_ms: i64) -> Result<()> {
        if token.is_empty() {
            // Login succeeded without a token; a previous token must not survive it
            debug!("Recording session expiry without a token");
            self.store
                .remove(TOKEN_KEY)
                .context("Failed to remove previous session token")?;
        } else {
            self.store
                .set(TOKEN_KEY, token)
                .context("Failed to store session token")?;
        }

        let cache = serde_json::to_string(&AuthCache {
            expires: expires_at_ms,
        })?;
        self.store
            .set(AUTH_CACHE_KEY, &cache)
            .context("Failed to store session expiry")?;
        Ok(())
    }

    /// Load the persisted session if the expiry record is readable.
    ///
    /// The session may already be expired; use `is_valid` to gate on it.
    pub fn load(&self) -> Option<SessionData> {
        let raw = self.store.get(AUTH_CACHE_KEY)?;
        let cache: AuthCache = match serde_json::from_str(&raw) {
            Ok(cache) => cache,
            Err(e) => {
                debug!(error = %e, "Ignoring malformed session expiry record");
                return None;
            }
        };

        Some(SessionData {
            token: self.stored_token().unwrap_or_default(),
            expires_at_ms: cache.expires,
        })
    }

    /// Raw stored token, regardless of expiry.
    pub fn stored_token(&self) -> Option<String> {
        self.store.get(TOKEN_KEY)
    }

    /// True iff an expiry record exists, parses, and lies in the future.
    pub fn is_valid(&self) -> bool {
        self.load().map(|d| !d.is_expired()).unwrap_or(false)
    }

    /// Valid expiry and a non-empty token.
    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    /// Get the bearer token if the session is valid
    pub fn bearer_token(&self) -> Option<String> {
        self.load()
            .filter(|d| !d.is_expired() && !d.token.is_empty())
            .map(|d| d.token)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.load().and_then(|d| d.expires_at())
    }

    pub fn minutes_until_expiry(&self) -> i64 {
        self.load().map(|d| d.minutes_until_expiry()).unwrap_or(0)
    }

    /// Remove token and expiry. Storage failures are logged, not returned.
    pub fn clear(&self) {
        for key in [TOKEN_KEY, AUTH_CACHE_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to remove session record");
            }
        }
        debug!("Cleared session");
    }
}
