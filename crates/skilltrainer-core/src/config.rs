//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend base URL, the login entry point, request timeout and which token
//! store backs the session.
//!
//! Configuration is stored at `~/.config/skilltrainer/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "skilltrainer";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "SKILLTRAINER_API_URL";

/// Environment variable overriding the token store backend
pub const ENV_TOKEN_STORE: &str = "SKILLTRAINER_TOKEN_STORE";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_REFRESH_PATH: &str = "/auth/token/refresh/";
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenStoreKind {
    #[default]
    File,
    Keyring,
    Memory,
}

impl std::str::FromStr for TokenStoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(TokenStoreKind::File),
            "keyring" | "keychain" => Ok(TokenStoreKind::Keyring),
            "memory" => Ok(TokenStoreKind::Memory),
            other => Err(anyhow::anyhow!("Unknown token store: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub login_path: String,
    pub refresh_path: String,
    pub request_timeout_secs: u64,
    pub token_store: TokenStoreKind,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_store: TokenStoreKind::default(),
            last_email: None,
        }
    }
}

impl Config {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
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

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
        if let Some(kind) = lookup(ENV_TOKEN_STORE) {
            self.token_store = kind
                .parse()
                .with_context(|| format!("Invalid {}", ENV_TOKEN_STORE))?;
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Build the token store selected by `token_store`.
    pub fn build_token_store(&self) -> Result<Arc<dyn TokenStore>> {
        let store: Arc<dyn TokenStore> = match self.token_store {
            TokenStoreKind::File => Arc::new(FileTokenStore::new(self.cache_dir()?)),
            TokenStoreKind::Keyring => Arc::new(KeyringTokenStore::new()),
            TokenStoreKind::Memory => Arc::new(MemoryTokenStore::new()),
        };
        Ok(store)
    }
}
