//! Data models for the signed-in user and the session built around it.
//!
//! - `UserInfo`: identity plus the opaque session token
//! - `SessionState`: either signed out or signed in as exactly one user

pub mod user;

pub use user::{FederatedCredential, SessionState, UserInfo};
