use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

/// Key under which the access token is persisted
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Key under which the refresh token is persisted
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Token file name in cache directory
const TOKEN_FILE: &str = "tokens.json";

/// Process-local key-value store for session tokens.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Tokens persisted as a single JSON object in the cache directory.
pub struct FileTokenStore {
    cache_dir: PathBuf,
    // Serializes read-modify-write cycles on the file
    guard: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            guard: Mutex::new(()),
        }
    }

    fn token_path(&self) -> PathBuf {
        self.cache_dir.join(TOKEN_FILE)
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read token file")?;
        serde_json::from_str(&contents).context("Failed to parse token file")
    }

    fn write_all(&self, values: &HashMap<String, String>) -> Result<()> {
        let path = self.token_path();
        if values.is_empty() {
            if path.exists() {
                std::fs::remove_file(&path).context("Failed to remove token file")?;
            }
            return Ok(());
        }
        std::fs::create_dir_all(&self.cache_dir)
            .context("Failed to create token directory")?;
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&path, contents).context("Failed to write token file")?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| anyhow::anyhow!("Token store lock poisoned"))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock()?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)?;
        debug!(key = key, "Token persisted");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock()?;
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}
