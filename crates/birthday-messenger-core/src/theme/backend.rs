use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::{ThemeMode, ThemeSource};
use crate::storage::KeyValueStore;

/// Storage key holding `"dark"` or `"light"`
pub const THEME_CACHE_KEY: &str = "theme_mode";

/// Where a theme change lands.
pub trait ThemeBackend: Send + Sync {
    /// Persisted preference, if any.
    fn load(&self) -> Option<ThemeMode>;

    /// Apply `mode` and return the mode actually in effect.
    fn apply(&self, mode: ThemeMode) -> Result<ThemeMode>;

    /// Flip the theme and return the new mode.
    fn toggle(&self, current: ThemeMode) -> Result<ThemeMode>;

    /// Drop the explicit preference and return the mode now in effect.
    fn reset_to_system(&self, current: ThemeMode) -> Result<ThemeMode>;
}

/// Host bridge to the platform theme.
pub trait NativeTheme: Send + Sync {
    /// Whether the platform currently renders dark.
    fn should_use_dark_colors(&self) -> bool;

    fn set_source(&self, source: ThemeSource) -> Result<()>;
}

/// Persists the preference; there is no system theme to follow.
pub struct PersistOnlyTheme<S> {
    store: S,
}

impl<S: KeyValueStore> PersistOnlyTheme<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn persist(&self, mode: ThemeMode) -> Result<()> {
        self.store
            .set(THEME_CACHE_KEY, mode.as_str())
            .context("Failed to store theme preference")
    }

    fn forget(&self) -> Result<()> {
        self.store
            .remove(THEME_CACHE_KEY)
            .context("Failed to remove theme preference")
    }
}

impl<S: KeyValueStore> ThemeBackend for PersistOnlyTheme<S> {
    fn load(&self) -> Option<ThemeMode> {
        let raw = self.store.get(THEME_CACHE_KEY)?;
        match raw.parse() {
            Ok(mode) => Some(mode),
            Err(e) => {
                warn!(value = %raw, error = %e, "Ignoring stored theme preference");
                None
            }
        }
    }

    fn apply(&self, mode: ThemeMode) -> Result<ThemeMode> {
        self.persist(mode)?;
        Ok(mode)
    }

    fn toggle(&self, current: ThemeMode) -> Result<ThemeMode> {
        self.apply(current.toggled())
    }

    fn reset_to_system(&self, current: ThemeMode) -> Result<ThemeMode> {
        self.forget()?;
        Ok(current)
    }
}

/// Persists the preference and keeps the native theme in step with it.
pub struct NativeSyncTheme<S, N> {
    persist: PersistOnlyTheme<S>,
    native: N,
}

impl<S: KeyValueStore, N: NativeTheme> NativeSyncTheme<S, N> {
    pub fn new(store: S, native: N) -> Self {
        Self {
            persist: PersistOnlyTheme::new(store),
            native,
        }
    }

    pub fn native(&self) -> &N {
        &self.native
    }

    fn observed(&self) -> ThemeMode {
        ThemeMode::from_dark(self.native.should_use_dark_colors())
    }
}

impl<S: KeyValueStore, N: NativeTheme> ThemeBackend for NativeSyncTheme<S, N> {
    fn load(&self) -> Option<ThemeMode> {
        self.persist.load()
    }

    fn apply(&self, mode: ThemeMode) -> Result<ThemeMode> {
        self.native
            .set_source(mode.into())
            .context("Failed to set native theme")?;
        let effective = self.observed();
        self.persist.persist(effective)?;
        Ok(effective)
    }

    fn toggle(&self, _current: ThemeMode) -> Result<ThemeMode> {
        // Flip what the platform renders, not what we last stored
        let target = self.observed().toggled();
        debug!(target = %target, "Toggling native theme");
        self.apply(target)
    }

    fn reset_to_system(&self, _current: ThemeMode) -> Result<ThemeMode> {
        self.native
            .set_source(ThemeSource::System)
            .context("Failed to reset native theme")?;
        self.persist.forget()?;
        Ok(self.observed())
    }
}
