use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Session token expired or invalid")]
    TokenExpired,

    #[error("Authentication service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not implemented: {0}")]
    Unimplemented(&'static str),
}

/// Outcome of a user-facing sign-in call
pub type AuthResult = Result<(), AuthError>;

/// Outcome of a call into an `AuthClient`
pub type AuthClientResult<T> = Result<T, AuthError>;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Which kind of credential a request carried, so a 401 maps to the right error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Password,
    Token,
}

impl AuthError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str, kind: CredentialKind) -> Self {
        let truncated = Self::truncate_body(body);
        match (status.as_u16(), kind) {
            (401 | 403, CredentialKind::Password) => AuthError::InvalidCredentials,
            (401 | 403, CredentialKind::Token) => AuthError::TokenExpired,
            (429, _) => AuthError::RemoteUnavailable("rate limited".to_string()),
            (500..=599, _) => AuthError::RemoteUnavailable(format!("Status {}: {}", status, truncated)),
            _ => AuthError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Errors that say nothing about the credential itself
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::RemoteUnavailable(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AuthError::InvalidResponse(err.to_string())
        } else {
            AuthError::RemoteUnavailable(err.to_string())
        }
    }
}
