use anyhow::Result;
use tokio::sync::watch;
use tracing::info;

use super::{ThemeBackend, ThemeMode};

/// Current theme plus change notification.
///
/// Subscribers get a `watch::Receiver`: they always read the latest mode and
/// are only woken when it actually changes.
pub struct ThemeState<B> {
    backend: B,
    tx: watch::Sender<ThemeMode>,
}

impl<B: ThemeBackend> ThemeState<B> {
    /// Start from the persisted preference, or light when there is none.
    pub fn new(backend: B) -> Self {
        let initial = backend.load().unwrap_or_default();
        let (tx, _rx) = watch::channel(initial);
        Self { backend, tx }
    }

    pub fn get(&self) -> ThemeMode {
        *self.tx.borrow()
    }

    pub fn set(&self, mode: ThemeMode) -> Result<ThemeMode> {
        let applied = self.backend.apply(mode)?;
        self.publish(applied);
        Ok(applied)
    }

    pub fn toggle(&self) -> Result<ThemeMode> {
        let toggled = self.backend.toggle(self.get())?;
        self.publish(toggled);
        Ok(toggled)
    }

    /// Stop pinning a mode and follow the system theme where there is one.
    pub fn use_system(&self) -> Result<ThemeMode> {
        let mode = self.backend.reset_to_system(self.get())?;
        self.publish(mode);
        Ok(mode)
    }

    pub fn subscribe(&self) -> watch::Receiver<ThemeMode> {
        self.tx.subscribe()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn publish(&self, mode: ThemeMode) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        });
        if changed {
            info!(mode = %mode, "Theme changed");
        }
    }
}
