//! Application state for the Birthday Messenger CLI.
//!
//! `App` wires the core components together around one shared file store:
//! the session cache and theme preference both persist into it, the same
//! way the desktop client keeps them side by side in local storage.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use birthday_messenger_core::api::ApiClient;
use birthday_messenger_core::auth::SessionStore;
use birthday_messenger_core::theme::PersistOnlyTheme;
use birthday_messenger_core::{Config, FileStore, MessengerService, ThemeState};

pub type SharedStore = Arc<FileStore>;

pub struct App {
    pub config: Config,
    pub service: MessengerService<SharedStore>,
    pub theme: ThemeState<PersistOnlyTheme<SharedStore>>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        let store: SharedStore = Arc::new(FileStore::open(&cache_dir)?);
        debug!(path = %store.path().display(), "Using client storage");

        let api = ApiClient::new(config.api_base_url.clone())?;
        let service = MessengerService::new(
            api,
            SessionStore::new(Arc::clone(&store)),
            config.session_ttl(),
        );
        let theme = ThemeState::new(PersistOnlyTheme::new(store));

        Ok(Self {
            config,
            service,
            theme,
        })
    }

    /// Remember the last username for the next login prompt
    pub fn remember_username(&mut self, username: &str) {
        self.config.last_username = Some(username.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    pub fn prompt_username(default: Option<&str>) -> Result<String> {
        match default {
            Some(last) => print!("Username [{}]: ", last),
            None => print!("Username: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        match default {
            Some(last) if input.is_empty() => Ok(last.to_string()),
            _ => Ok(input.to_string()),
        }
    }

    pub fn prompt_password(prompt: &str) -> Result<String> {
        let password = rpassword::prompt_password(prompt)?;
        Ok(password)
    }

    pub fn confirm(question: &str) -> Result<bool> {
        print!("{} [y/N]: ", question);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
    }
}
