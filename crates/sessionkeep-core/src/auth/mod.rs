//! Session management for the signed-in user.
//!
//! This module provides:
//! - `AuthSessionManager`: sole authority over sign-in, sign-out and revalidation
//! - `SessionStore`: observable holder of the current `SessionState`
//! - `global`: an optional process-wide manager, built lazily on first use
//!
//! Front ends observe the session through `SessionStore` and never touch
//! storage directly.

pub mod global;
pub mod manager;
pub mod state;

pub use global::{get_instance, reset_instance, try_instance};
pub use manager::AuthSessionManager;
pub use state::{SessionStore, Subscription};
