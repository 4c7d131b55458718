use std::fmt;

use serde::{Deserialize, Serialize};

/// Authenticated identity and its session credential.
///
/// Treated as immutable: a refreshed or revoked session replaces the whole
/// value rather than editing fields in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub token: String,
}

impl UserInfo {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            token: token.into(),
        }
    }

    /// A user is only usable with a non-empty id and token.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.token.is_empty()
    }

    /// Display name, falling back to the id when the service sent none
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.id
        } else {
            &self.display_name
        }
    }
}

// Tokens end up in logs via `?user` fields, so keep them out of Debug.
impl fmt::Debug for UserInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserInfo")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Credential handed over by a third-party identity provider
#[derive(Clone)]
pub struct FederatedCredential {
    pub provider: String,
    pub id_token: String,
}

/// The current session. Transitions always replace the whole value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    SignedOut,
    SignedIn(UserInfo),
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }

    pub fn user(&self) -> Option<&UserInfo> {
        match self {
            SessionState::SignedIn(user) => Some(user),
            SessionState::SignedOut => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.user().map(|u| u.token.as_str())
    }

    /// True if signed in with exactly this token
    pub fn holds_token(&self, token: &str) -> bool {
        self.token() == Some(token)
    }
}

impl From<Option<UserInfo>> for SessionState {
    fn from(user: Option<UserInfo>) -> Self {
        match user {
            Some(user) => SessionState::SignedIn(user),
            None => SessionState::SignedOut,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_info_serializes_camel_case() {
        let user = UserInfo::new("u1", "Alice", "t1");
        let json = serde_json::to_value(&user).expect("serialize user");
        assert_eq!(json["id"], "u1");
        assert_eq!(json["displayName"], "Alice");
        assert_eq!(json["token"], "t1");
    }

    #[test]
    fn test_user_info_display_name_optional() {
        let user: UserInfo =
            serde_json::from_str(r#"{"id":"u1","token":"t1"}"#).expect("parse user");
        assert_eq!(user.display_name, "");
        assert_eq!(user.label(), "u1");
    }

    #[test]
    fn test_user_info_validity() {
        assert!(UserInfo::new("u1", "", "t1").is_valid());
        assert!(!UserInfo::new("", "Alice", "t1").is_valid());
        assert!(!UserInfo::new("u1", "Alice", "").is_valid());
    }

    #[test]
    fn test_debug_redacts_token() {
        let user = UserInfo::new("u1", "Alice", "super-secret");
        let debug = format!("{:?}", user);
        assert!(debug.contains("u1"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_session_state_accessors() {
        let signed_out = SessionState::default();
        assert!(!signed_out.is_signed_in());
        assert_eq!(signed_out.token(), None);

        let signed_in = SessionState::SignedIn(UserInfo::new("u1", "Alice", "t1"));
        assert!(signed_in.is_signed_in());
        assert_eq!(signed_in.user().map(|u| u.id.as_str()), Some("u1"));
        assert!(signed_in.holds_token("t1"));
        assert!(!signed_in.holds_token("t2"));
    }

    #[test]
    fn test_session_state_from_option() {
        assert_eq!(SessionState::from(None), SessionState::SignedOut);
        let user = UserInfo::new("u1", "", "t1");
        assert_eq!(
            SessionState::from(Some(user.clone())),
            SessionState::SignedIn(user)
        );
    }
}
