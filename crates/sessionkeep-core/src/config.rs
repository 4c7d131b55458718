//! Session configuration management.
//!
//! This module handles loading and saving the configuration that decides
//! which authentication service to talk to and where the signed-in user is
//! persisted.
//!
//! Configuration is stored at `~/.config/sessionkeep/config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::api::{AuthClient, HttpAuthClient, MockAuthClient};
use crate::storage::keychain::DEFAULT_ACCOUNT;
use crate::storage::{
    FileUserInfoStorage, KeyringUserInfoStorage, MemoryUserInfoStorage, UserInfoStorage,
};

/// Application name used for config/data directory paths
const APP_NAME: &str = "sessionkeep";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `auth_url`
pub const ENV_AUTH_URL: &str = "SESSIONKEEP_AUTH_URL";

/// Environment variable overriding `storage_dir`
pub const ENV_STORAGE_DIR: &str = "SESSIONKEEP_STORAGE_DIR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SessionConfig {
    pub storage_dir: Option<PathBuf>,
    pub storage: StorageBackend,
    pub keyring_account: Option<String>,
    /// Authentication service base URL. Without one the offline mock is used.
    pub auth_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl SessionConfig {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
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

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup; empty values are ignored
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_AUTH_URL).filter(|v| !v.is_empty()) {
            self.auth_url = Some(url);
        }
        if let Some(dir) = lookup(ENV_STORAGE_DIR).filter(|v| !v.is_empty()) {
            self.storage_dir = Some(PathBuf::from(dir));
        }
    }

    /// Directory holding the persisted user, defaulting to the platform data dir
    pub fn storage_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.storage_dir {
            return Ok(dir.clone());
        }
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn auth_client(&self) -> Result<Arc<dyn AuthClient>> {
        match self.auth_url {
            Some(ref url) => {
                debug!(url = %url, "Using HTTP authentication service");
                Ok(Arc::new(HttpAuthClient::new(url, self.request_timeout())?))
            }
            None => {
                debug!("No authentication service configured, using offline mock");
                Ok(Arc::new(MockAuthClient::new()))
            }
        }
    }

    pub fn user_info_storage(&self) -> Result<Arc<dyn UserInfoStorage>> {
        let storage: Arc<dyn UserInfoStorage> = match self.storage {
            StorageBackend::File => Arc::new(FileUserInfoStorage::new(self.storage_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringUserInfoStorage::new(
                self.keyring_account.as_deref().unwrap_or(DEFAULT_ACCOUNT),
            )),
            StorageBackend::Memory => Arc::new(MemoryUserInfoStorage::new()),
        };
        Ok(storage)
    }
}
