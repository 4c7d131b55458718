use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::models::UserInfo;

use super::{StoredUserInfo, UserInfoStorage};

/// User info file name in the storage directory
const USER_INFO_FILE: &str = "user_info.json";

pub struct FileUserInfoStorage {
    storage_dir: PathBuf,
}

impl FileUserInfoStorage {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self { storage_dir }
    }

    pub fn path(&self) -> PathBuf {
        self.storage_dir.join(USER_INFO_FILE)
    }
}

impl UserInfoStorage for FileUserInfoStorage {
    fn read_user_info(&self) -> Result<Option<UserInfo>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let contents =
            std::fs::read_to_string(&path).context("Failed to read user info file")?;
        let stored: StoredUserInfo =
            serde_json::from_str(&contents).context("Failed to parse user info file")?;

        debug!(saved_at = %stored.saved_at, "Loaded stored user info");
        Ok(Some(stored.user))
    }

    fn write_user_info(&self, user: &UserInfo) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(&StoredUserInfo::new(user))?;
        write_atomically(&path, &contents).context("Failed to write user info file")?;
        Ok(())
    }

    fn clear_user_info(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove user info file")?;
        }
        Ok(())
    }
}

/// Write via a sibling temp file so a crash never leaves half a file behind
fn write_atomically(path: &Path, contents: &str) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, FileUserInfoStorage) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let storage = FileUserInfoStorage::new(dir.path().join("nested"));
        (dir, storage)
    }

    #[test]
    fn test_read_missing_file_is_none() {
        let (_dir, storage) = storage();
        assert!(storage.read_user_info().expect("read").is_none());
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, storage) = storage();
        let user = UserInfo::new("u1", "Alice", "t1");
        storage.write_user_info(&user).expect("write");
        assert_eq!(storage.read_user_info().expect("read"), Some(user));
        assert!(!storage.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_write_replaces_previous_user() {
        let (_dir, storage) = storage();
        storage
            .write_user_info(&UserInfo::new("u1", "", "t1"))
            .expect("first write");
        let second = UserInfo::new("u2", "", "t2");
        storage.write_user_info(&second).expect("second write");
        assert_eq!(storage.read_user_info().expect("read"), Some(second));
    }

    #[test]
    fn test_clear() {
        let (_dir, storage) = storage();
        // Clearing before anything was written is fine
        storage.clear_user_info().expect("clear empty");

        storage
            .write_user_info(&UserInfo::new("u1", "", "t1"))
            .expect("write");
        storage.clear_user_info().expect("clear");
        assert!(!storage.path().exists());
        assert!(storage.read_user_info().expect("read").is_none());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let (_dir, storage) = storage();
        std::fs::create_dir_all(storage.path().parent().expect("parent")).expect("mkdir");
        std::fs::write(storage.path(), "{not json").expect("write garbage");
        assert!(storage.read_user_info().is_err());
    }

    #[test]
    fn test_file_layout() {
        let (_dir, storage) = storage();
        storage
            .write_user_info(&UserInfo::new("u1", "Alice", "t1"))
            .expect("write");
        let raw = std::fs::read_to_string(storage.path()).expect("read raw");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        assert_eq!(json["user"]["id"], "u1");
        assert_eq!(json["user"]["displayName"], "Alice");
        assert!(json["savedAt"].is_string());
    }
}
