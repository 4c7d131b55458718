use anyhow::{Context, Result};
use keyring::Entry;

use crate::models::UserInfo;

use super::{StoredUserInfo, UserInfoStorage};

const SERVICE_NAME: &str = "sessionkeep";

/// Default keychain account the user info is stored under
pub const DEFAULT_ACCOUNT: &str = "default";

/// Stores the user info as a JSON secret in the OS keychain
pub struct KeyringUserInfoStorage {
    account: String,
}

impl KeyringUserInfoStorage {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }
}

impl Default for KeyringUserInfoStorage {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT)
    }
}

impl UserInfoStorage for KeyringUserInfoStorage {
    fn read_user_info(&self) -> Result<Option<UserInfo>> {
        let secret = match self.entry()?.get_password() {
            Ok(secret) => secret,
            Err(keyring::Error::NoEntry) => return Ok(None),
            Err(e) => return Err(e).context("Failed to read user info from keychain"),
        };
        let stored: StoredUserInfo =
            serde_json::from_str(&secret).context("Failed to parse user info from keychain")?;
        Ok(Some(stored.user))
    }

    fn write_user_info(&self, user: &UserInfo) -> Result<()> {
        let secret = serde_json::to_string(&StoredUserInfo::new(user))?;
        self.entry()?
            .set_password(&secret)
            .context("Failed to store user info in keychain")
    }

    fn clear_user_info(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete user info from keychain"),
        }
    }
}
