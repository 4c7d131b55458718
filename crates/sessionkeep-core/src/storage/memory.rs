use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::models::UserInfo;

use super::UserInfoStorage;

/// In-memory storage. Clones share one slot, so a second manager built from a
/// clone sees what the first one persisted.
#[derive(Clone, Default)]
pub struct MemoryUserInfoStorage {
    slot: Arc<Mutex<Option<UserInfo>>>,
}

impl MemoryUserInfoStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a user
    pub fn with_user(user: UserInfo) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(user))),
        }
    }

    /// Current contents without going through the trait
    pub fn snapshot(&self) -> Option<UserInfo> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl UserInfoStorage for MemoryUserInfoStorage {
    fn read_user_info(&self) -> Result<Option<UserInfo>> {
        let slot = self.slot.lock().map_err(|_| anyhow!("user info slot poisoned"))?;
        Ok(slot.clone())
    }

    fn write_user_info(&self, user: &UserInfo) -> Result<()> {
        let mut slot = self.slot.lock().map_err(|_| anyhow!("user info slot poisoned"))?;
        *slot = Some(user.clone());
        Ok(())
    }

    fn clear_user_info(&self) -> Result<()> {
        let mut slot = self.slot.lock().map_err(|_| anyhow!("user info slot poisoned"))?;
        *slot = None;
        Ok(())
    }
}
