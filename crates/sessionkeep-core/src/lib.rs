//! sessionkeep core - session state for a single signed-in user.
//!
//! The `AuthSessionManager` owns who is signed in. It signs users in and out
//! through an `AuthClient`, mirrors the result into a `UserInfoStorage`, and
//! publishes every transition through an observable `SessionStore`.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{AuthClient, AuthClientResult, AuthError, AuthResult, HttpAuthClient, MockAuthClient};
pub use auth::{get_instance, reset_instance, try_instance, AuthSessionManager, SessionStore, Subscription};
pub use config::{SessionConfig, StorageBackend};
pub use models::{FederatedCredential, SessionState, UserInfo};
pub use storage::{
    FileUserInfoStorage, KeyringUserInfoStorage, MemoryUserInfoStorage, UserInfoStorage,
};
