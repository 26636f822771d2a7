//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! backend URL, session lifetime, last used username and where the
//! download manifest lives.
//!
//! Configuration is stored at `~/.config/birthday-messenger/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::DEFAULT_TTL_MINUTES;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "birthday-messenger";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend the desktop client talks to out of the box
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "BIRTHDAY_MESSENGER_API_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub session_ttl_minutes: i64,
    pub last_username: Option<String>,
    pub downloads_manifest: Option<PathBuf>,
    pub download_base_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_ttl_minutes: DEFAULT_TTL_MINUTES,
            last_username: None,
            downloads_manifest: None,
            download_base_url: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            debug!(path = %path.display(), "Loaded config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from the environment (after `.env` has been loaded)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                debug!(url = %url, "API base URL overridden from environment");
                self.api_base_url = url.trim().to_string();
            }
        }
    }

    /// Session lifetime, never below one minute
    pub fn session_ttl(&self) -> i64 {
        self.session_ttl_minutes.max(1)
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Manifest path: configured, else `downloads.json` in the config directory
    pub fn downloads_manifest_path(&self) -> Result<PathBuf> {
        match self.downloads_manifest {
            Some(ref path) => Ok(path.clone()),
            None => {
                let config_path = Self::config_path()?;
                let dir = config_path
                    .parent()
                    .ok_or_else(|| anyhow::anyhow!("Config path has no parent"))?;
                Ok(dir.join("downloads.json"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.session_ttl_minutes, 60);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            last_username: Some("admin".to_string()),
            session_ttl_minutes: 15,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_base_url": "https://bm.example.com"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "https://bm.example.com");
        assert_eq!(config.session_ttl_minutes, DEFAULT_TTL_MINUTES);
    }

    #[test]
    fn test_session_ttl_floor() {
        let config = Config {
            session_ttl_minutes: 0,
            ..Default::default()
        };
        assert_eq!(config.session_ttl(), 1);
    }
}
