//! Authentication service client module.
//!
//! This module provides the `AuthClient` trait the session manager talks to,
//! plus two implementations:
//! - `HttpAuthClient`: JSON over HTTP with bearer tokens
//! - `MockAuthClient`: offline, in-process backend used when no service is configured

pub mod client;
pub mod error;
pub mod mock;

pub use client::{AuthClient, HttpAuthClient};
pub use error::{AuthClientResult, AuthError, AuthResult};
pub use mock::MockAuthClient;
