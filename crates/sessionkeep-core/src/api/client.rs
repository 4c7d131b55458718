//! Client side of the authentication service.
//!
//! `AuthClient` is the seam the session manager depends on. `HttpAuthClient`
//! is the production implementation talking JSON over HTTP.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde::Serialize;
use tracing::debug;

use crate::models::UserInfo;

use super::error::{AuthClientResult, AuthError, CredentialKind};

/// Remote authentication operations.
///
/// Implementations own their transport concerns (timeouts, TLS). The session
/// manager never retries, so one call is one definitive outcome.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Exchange a username and password for a signed-in user
    async fn auth_with_password(&self, username: &str, password: &str)
        -> AuthClientResult<UserInfo>;

    /// Check a stored token, returning the (possibly refreshed) user
    async fn validate_token(&self, token: &str) -> AuthClientResult<UserInfo>;

    /// Revoke a token on the service side
    async fn invalidate_token(&self, token: &str) -> AuthClientResult<()>;
}

// ============================================================================
// HTTP implementation
// ============================================================================

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const PASSWORD_PATH: &str = "auth/password";
const VALIDATE_PATH: &str = "auth/validate";
const INVALIDATE_PATH: &str = "auth/invalidate";

#[derive(Debug, Serialize)]
struct PasswordRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Authentication service client over HTTP.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpAuthClient {
    client: Client,
    base_url: String,
}

impl HttpAuthClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Check if response is successful, mapping the status to an `AuthError` if not.
    async fn check_response(response: Response, kind: CredentialKind) -> AuthClientResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::from_status(status, &body, kind))
        }
    }

    async fn parse_user(response: Response) -> AuthClientResult<UserInfo> {
        let user: UserInfo = response.json().await?;
        if !user.is_valid() {
            return Err(AuthError::InvalidResponse(
                "user info is missing an id or token".to_string(),
            ));
        }
        Ok(user)
    }

    async fn post_with_token(&self, path: &str, token: &str) -> AuthClientResult<Response> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        Self::check_response(response, CredentialKind::Token).await
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn auth_with_password(
        &self,
        username: &str,
        password: &str,
    ) -> AuthClientResult<UserInfo> {
        debug!(username = username, "Authenticating with password");
        let response = self
            .client
            .post(self.url(PASSWORD_PATH))
            .header(header::ACCEPT, "application/json")
            .json(&PasswordRequest { username, password })
            .send()
            .await?;
        let response = Self::check_response(response, CredentialKind::Password).await?;
        Self::parse_user(response).await
    }

    async fn validate_token(&self, token: &str) -> AuthClientResult<UserInfo> {
        debug!("Validating session token");
        let response = self.post_with_token(VALIDATE_PATH, token).await?;
        Self::parse_user(response).await
    }

    async fn invalidate_token(&self, token: &str) -> AuthClientResult<()> {
        debug!("Invalidating session token");
        self.post_with_token(INVALIDATE_PATH, token).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    /// Client pointed at `base_url`, ignoring any proxy settings in the environment
    fn local_client(base_url: &str) -> HttpAuthClient {
        let client = Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("client builds");
        HttpAuthClient {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Read one request: headers plus a Content-Length body
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.expect("read request");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answer a single request with a canned response. The task yields the
    /// raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{}", addr), handle)
    }

    fn has_bearer(request: &str, token: &str) -> bool {
        request
            .lines()
            .any(|line| line.eq_ignore_ascii_case(&format!("authorization: Bearer {}", token)))
    }

    #[tokio::test]
    async fn test_password_sign_in_success() {
        let (url, server) =
            serve_once("200 OK", r#"{"id":"u1","displayName":"Alice","token":"t1"}"#).await;
        let client = local_client(&url);

        let user = client
            .auth_with_password("alice", "goodpw")
            .await
            .expect("sign-in succeeds");

        assert_eq!(user, UserInfo::new("u1", "Alice", "t1"));
        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /auth/password "), "{request}");
        assert!(request.contains(r#""username":"alice""#));
        assert!(request.contains(r#""password":"goodpw""#));
    }

    #[tokio::test]
    async fn test_password_unauthorized_is_invalid_credentials() {
        let (url, server) = serve_once("401 Unauthorized", r#"{"error":"bad password"}"#).await;
        let client = local_client(&url);

        let result = client.auth_with_password("alice", "badpw").await;

        assert_eq!(result, Err(AuthError::InvalidCredentials));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_validate_sends_bearer_token() {
        let (url, server) = serve_once("200 OK", r#"{"id":"u1","token":"t2"}"#).await;
        let client = local_client(&url);

        let user = client.validate_token("t1").await.expect("token valid");

        assert_eq!(user.token, "t2");
        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /auth/validate "), "{request}");
        assert!(has_bearer(&request, "t1"), "{request}");
    }

    #[tokio::test]
    async fn test_validate_unauthorized_is_token_expired() {
        let (url, server) = serve_once("401 Unauthorized", "").await;
        let client = local_client(&url);

        let result = client.validate_token("expired").await;

        assert_eq!(result, Err(AuthError::TokenExpired));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_user_without_id_or_token_rejected() {
        let (url, server) = serve_once("200 OK", r#"{"id":"","token":""}"#).await;
        let client = local_client(&url);

        let result = client.auth_with_password("alice", "goodpw").await;

        assert!(matches!(result, Err(AuthError::InvalidResponse(_))), "{result:?}");
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let (url, server) = serve_once("200 OK", "not json").await;
        let client = local_client(&url);

        let result = client.validate_token("t1").await;

        assert!(matches!(result, Err(AuthError::InvalidResponse(_))), "{result:?}");
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_server_error_is_remote_unavailable() {
        let (url, server) = serve_once("503 Service Unavailable", "maintenance").await;
        let client = local_client(&url);

        let err = client
            .auth_with_password("alice", "goodpw")
            .await
            .expect_err("service down");

        assert!(err.is_transient());
        assert!(err.to_string().contains("maintenance"));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn test_invalidate_sends_bearer_token() {
        let (url, server) = serve_once("204 No Content", "").await;
        let client = local_client(&url);

        client.invalidate_token("t1").await.expect("token revoked");

        let request = server.await.expect("server task");
        assert!(request.starts_with("POST /auth/invalidate "), "{request}");
        assert!(has_bearer(&request, "t1"), "{request}");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = HttpAuthClient::new("https://auth.example.com/api/", Duration::from_secs(5))
            .expect("client builds");
        assert_eq!(client.base_url(), "https://auth.example.com/api");
        assert_eq!(
            client.url(PASSWORD_PATH),
            "https://auth.example.com/api/auth/password"
        );
    }

    #[test]
    fn test_password_request_body() {
        let body = serde_json::to_value(PasswordRequest {
            username: "alice",
            password: "goodpw",
        })
        .expect("serialize request");
        assert_eq!(body, serde_json::json!({"username": "alice", "password": "goodpw"}));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_remote_unavailable() {
        // Port 9 (discard) on localhost is not expected to speak HTTP
        let client = HttpAuthClient::new("http://127.0.0.1:9", Duration::from_secs(2))
            .expect("client builds");
        let err = client
            .validate_token("t1")
            .await
            .expect_err("no service is listening");
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }
}
