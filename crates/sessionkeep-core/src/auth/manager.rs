//! The session manager: the only component allowed to change who is signed in.
//!
//! Remote calls run without holding the commit lock. Every commit re-checks
//! its precondition under the lock, so a slow validation can never bring back
//! a user that was signed out while it was in flight.
//!
//! Storage backends are synchronous (file system, OS keychain), so every
//! storage call runs on the blocking pool.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::api::{AuthClient, AuthError, AuthResult};
use crate::config::SessionConfig;
use crate::models::{FederatedCredential, SessionState, UserInfo};
use crate::storage::UserInfoStorage;

use super::state::SessionStore;

pub struct AuthSessionManager {
    client: Arc<dyn AuthClient>,
    storage: Arc<dyn UserInfoStorage>,
    state: SessionStore,
    /// Serializes state commits together with their storage write
    commit_lock: Mutex<()>,
}

/// Run a storage operation off the async worker threads
async fn on_storage<T, F>(storage: &Arc<dyn UserInfoStorage>, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn UserInfoStorage) -> Result<T> + Send + 'static,
{
    let storage = Arc::clone(storage);
    tokio::task::spawn_blocking(move || op(storage.as_ref()))
        .await
        .context("Storage task failed")?
}

impl AuthSessionManager {
    /// Load the stored user, seed the session with it and revalidate its token.
    ///
    /// Returns once validation has settled, so `is_signed_in()` reflects the
    /// service's verdict rather than whatever was on disk.
    pub async fn new(client: Arc<dyn AuthClient>, storage: Arc<dyn UserInfoStorage>) -> Self {
        let stored = match on_storage(&storage, |s| s.read_user_info()).await {
            Ok(Some(user)) if user.is_valid() => Some(user),
            Ok(Some(_)) => {
                warn!("Stored user info is missing an id or token, discarding it");
                if let Err(e) = on_storage(&storage, |s| s.clear_user_info()).await {
                    warn!(error = %e, "Failed to clear stored user info");
                }
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user info");
                None
            }
        };
        debug!(has_stored_user = stored.is_some(), "Session manager starting");

        let manager = Self {
            client,
            storage,
            state: SessionStore::new(SessionState::from(stored)),
            commit_lock: Mutex::new(()),
        };
        manager.validate_current_session().await;
        manager
    }

    /// Build the default client and storage described by `config`
    pub async fn from_config(config: &SessionConfig) -> Result<Self> {
        let client = config.auth_client()?;
        let storage = config.user_info_storage()?;
        Ok(Self::new(client, storage).await)
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.is_signed_in()
    }

    pub fn current_user(&self) -> Option<UserInfo> {
        self.state.current().user().cloned()
    }

    /// Observable session state for front ends
    pub fn session(&self) -> &SessionStore {
        &self.state
    }

    pub async fn sign_in_with_password(&self, username: &str, password: &str) -> AuthResult {
        let user = match self.client.auth_with_password(username, password).await {
            Ok(user) if user.is_valid() => user,
            Ok(_) => {
                return Err(AuthError::InvalidResponse(
                    "user info is missing an id or token".to_string(),
                ))
            }
            Err(e) => {
                info!(username = username, error = %e, "Sign-in failed");
                return Err(e);
            }
        };

        let _guard = self.lock_commit().await;
        self.state.set(SessionState::SignedIn(user.clone()));
        info!(user_id = %user.id, "Signed in");
        self.persist(user).await;
        Ok(())
    }

    /// Sign out locally, then revoke the token remotely on a best-effort basis.
    ///
    /// The local session is cleared even if the service cannot be reached.
    pub async fn sign_out(&self) {
        let taken = {
            let _guard = self.lock_commit().await;
            let taken = self.state.take_user();
            if taken.is_some() {
                self.clear_storage().await;
            }
            taken
        };

        let Some(user) = taken else {
            debug!("Sign-out requested while already signed out");
            return;
        };
        info!(user_id = %user.id, "Signed out");

        if let Err(e) = self.client.invalidate_token(&user.token).await {
            warn!(user_id = %user.id, error = %e, "Failed to invalidate token remotely");
        }
    }

    /// Reserved for identity-provider sign-in. Always fails without touching
    /// the session.
    pub async fn federated_sign_in(&self, credential: &FederatedCredential) -> AuthResult {
        warn!(
            provider = %credential.provider,
            has_id_token = !credential.id_token.is_empty(),
            "Federated sign-in requested but not supported"
        );
        Err(AuthError::Unimplemented("federated sign-in"))
    }

    /// Ask the service whether the current token is still good.
    ///
    /// Any failure counts as an expired session. The result is only applied if
    /// the session still holds the token that was checked.
    pub(crate) async fn validate_current_session(&self) {
        let Some(token) = self.state.current().token().map(str::to_owned) else {
            return;
        };

        let outcome = match self.client.validate_token(&token).await {
            Ok(user) if user.is_valid() => Ok(user),
            Ok(_) => Err(AuthError::InvalidResponse(
                "user info is missing an id or token".to_string(),
            )),
            Err(e) => Err(e),
        };

        let _guard = self.lock_commit().await;
        match outcome {
            Ok(refreshed) => {
                let committed = self.state.replace_if(
                    |state| state.holds_token(&token),
                    SessionState::SignedIn(refreshed.clone()),
                );
                if committed {
                    debug!(user_id = %refreshed.id, "Stored session is valid");
                    self.persist(refreshed).await;
                } else {
                    debug!("Session changed during validation, discarding result");
                }
            }
            Err(e) => {
                let cleared = self
                    .state
                    .replace_if(|state| state.holds_token(&token), SessionState::SignedOut);
                if !cleared {
                    return;
                }
                self.clear_storage().await;
                if e.is_transient() {
                    warn!(error = %e, "Could not reach the service to validate the session, signed out");
                } else {
                    info!(error = %e, "Stored session is no longer valid, signed out");
                }
            }
        }
    }

    async fn lock_commit(&self) -> MutexGuard<'_, ()> {
        self.commit_lock.lock().await
    }

    async fn persist(&self, user: UserInfo) {
        let user_id = user.id.clone();
        if let Err(e) = on_storage(&self.storage, move |s| s.write_user_info(&user)).await {
            warn!(user_id = %user_id, error = %e, "Failed to persist user info");
        }
    }

    async fn clear_storage(&self) {
        if let Err(e) = on_storage(&self.storage, |s| s.clear_user_info()).await {
            warn!(error = %e, "Failed to clear stored user info");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
