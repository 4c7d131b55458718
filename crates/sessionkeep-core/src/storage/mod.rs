//! Durable storage for the last signed-in user.
//!
//! This module provides the `UserInfoStorage` trait and its backends:
//! - `FileUserInfoStorage`: JSON file in the storage directory
//! - `KeyringUserInfoStorage`: OS-level keychain entry via keyring
//! - `MemoryUserInfoStorage`: in-process slot, shareable between managers
//!
//! Storage is a mirror of the session state. It is read once when a session
//! manager starts and written through on every transition after that.

pub mod file;
pub mod keychain;
pub mod memory;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::UserInfo;

pub use file::FileUserInfoStorage;
pub use keychain::KeyringUserInfoStorage;
pub use memory::MemoryUserInfoStorage;

pub trait UserInfoStorage: Send + Sync {
    /// Last persisted user, or `None` if nothing is stored
    fn read_user_info(&self) -> Result<Option<UserInfo>>;

    fn write_user_info(&self, user: &UserInfo) -> Result<()>;

    /// Remove any stored user. Clearing empty storage succeeds.
    fn clear_user_info(&self) -> Result<()>;
}

/// On-disk envelope shared by the file and keyring backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredUserInfo {
    pub user: UserInfo,
    pub saved_at: DateTime<Utc>,
}

impl StoredUserInfo {
    pub fn new(user: &UserInfo) -> Self {
        Self {
            user: user.clone(),
            saved_at: Utc::now(),
        }
    }
}
