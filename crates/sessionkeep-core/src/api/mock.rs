//! Offline authentication backend.
//!
//! Used when no authentication service is configured, so the rest of the
//! stack can be exercised end to end without a network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use crate::models::UserInfo;

use super::client::AuthClient;
use super::error::{AuthClientResult, AuthError};

const TOKEN_PREFIX: &str = "mock.";

/// In-process stand-in for the authentication service.
///
/// Tokens look like `mock.<username>.<32 hex chars>` and carry the username,
/// so a token issued by one process still validates in the next. Revocations
/// are only remembered for the lifetime of this value.
#[derive(Default)]
pub struct MockAuthClient {
    accounts: HashMap<String, String>,
    revoked: Mutex<HashSet<String>>,
    offline: AtomicBool,
}

impl MockAuthClient {
    /// Accepts any non-empty username and password
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict sign-in to registered accounts
    pub fn with_account(mut self, username: &str, password: &str) -> Self {
        self.accounts.insert(username.to_string(), password.to_string());
        self
    }

    /// Simulate the service being unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> AuthClientResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AuthError::RemoteUnavailable("mock service is offline".to_string()))
        } else {
            Ok(())
        }
    }

    fn issue_token(username: &str) -> String {
        let nonce: u128 = rand::thread_rng().gen();
        format!("{}{}.{:032x}", TOKEN_PREFIX, username, nonce)
    }

    /// Recover the username from a token this backend issued
    fn username_from_token(token: &str) -> Option<&str> {
        let rest = token.strip_prefix(TOKEN_PREFIX)?;
        let (username, nonce) = rest.rsplit_once('.')?;
        let well_formed = !username.is_empty()
            && nonce.len() == 32
            && nonce.chars().all(|c| c.is_ascii_hexdigit());
        well_formed.then_some(username)
    }

    fn user_for(username: &str, token: String) -> UserInfo {
        UserInfo::new(username, username, token)
    }

    fn is_revoked(&self, token: &str) -> bool {
        self.revoked
            .lock()
            .map(|revoked| revoked.contains(token))
            .unwrap_or(false)
    }
}

#[async_trait]
impl AuthClient for MockAuthClient {
    async fn auth_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> AuthClientResult<UserInfo> {
        self.check_online()?;
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }
        if !self.accounts.is_empty()
            && self.accounts.get(username).map(String::as_str) != Some(password)
        {
            return Err(AuthError::InvalidCredentials);
        }
        debug!(username = username, "Mock sign-in accepted");
        Ok(Self::user_for(username, Self::issue_token(username)))
    }

    async fn validate_token(&self, token: &str) -> AuthClientResult<UserInfo> {
        self.check_online()?;
        if self.is_revoked(token) {
            return Err(AuthError::TokenExpired);
        }
        let username = Self::username_from_token(token).ok_or(AuthError::TokenExpired)?;
        if !self.accounts.is_empty() && !self.accounts.contains_key(username) {
            return Err(AuthError::TokenExpired);
        }
        Ok(Self::user_for(username, token.to_string()))
    }

    async fn invalidate_token(&self, token: &str) -> AuthClientResult<()> {
        self.check_online()?;
        if let Ok(mut revoked) = self.revoked.lock() {
            revoked.insert(token.to_string());
        }
        Ok(())
    }
}
