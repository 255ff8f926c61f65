use axum::http::HeaderMap;
use reqwest::multipart::{Form, Part};
use sea_orm::DatabaseConnection;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::auth::cookies::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::config::{Config, SessionConfig};

/// A 1x1 PNG, enough to pass the image content-type check.
pub const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

/// Config for tests: in-memory SQLite, an ephemeral port and a throwaway
/// upload directory.
pub fn test_config(session: SessionConfig) -> Config {
    let upload_dir = std::env::temp_dir().join(format!("vidtube-test-{}", uuid::Uuid::new_v4()));
    Config {
        database_url: "sqlite::memory:".to_string(),
        server_host: "127.0.0.1".to_string(),
        server_port: 0, // OS assigns a random port
        environment: "test".to_string(),
        cors_origin: None,
        upload_dir: upload_dir.to_string_lossy().into_owned(),
        max_upload_size: 10_485_760,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        s3_access_key_id: None,
        s3_secret_access_key: None,
        s3_public_url: None,
        s3_prefix: None,
        session,
    }
}

/// A test application for integration testing.
///
/// Spins up a vidtube server on an ephemeral port with an in-memory SQLite
/// database and a throwaway upload directory.
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_login() {
///     let app = TestApp::new().await;
///     let (token, _user) = app.create_user("alice", "alice@example.com", "password123").await;
///     let res = app.client.get_with_auth(&app.url("/api/v1/users/current-user"), &token).await;
///     assert_eq!(res.status, 200);
/// }
/// ```
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: TestClient,
    pub db: DatabaseConnection,
    pub config: Config,
}

/// Credentials returned by [`TestApp::login`].
#[derive(Debug, Clone)]
pub struct TestSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: serde_json::Value,
}

impl TestApp {
    /// Test app with default session settings.
    pub async fn new() -> Self {
        Self::with_session(SessionConfig::default()).await
    }

    /// Test app with custom session settings (e.g. reuse revocation on).
    pub async fn with_session(session: SessionConfig) -> Self {
        Self::with_config(test_config(session)).await
    }

    /// Test app with a fully custom config.
    pub async fn with_config(config: Config) -> Self {
        let app = crate::App::with_config(config)
            .await
            .expect("Failed to create test app");

        let router = app.router();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        TestApp {
            addr,
            client: TestClient::new(addr),
            db: app.db,
            config: app.config,
        }
    }

    /// Get the full URL for a path on the test server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Registration form with the required fields and a PNG avatar.
    pub fn registration_form(username: &str, email: &str, password: &str) -> Form {
        Form::new()
            .text("fullname", format!("{} Tester", username))
            .text("email", email.to_string())
            .text("username", username.to_string())
            .text("password", password.to_string())
            .part("avatar", png_part("avatar.png"))
    }

    /// Register a user and return the created user JSON.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> serde_json::Value {
        let res = self
            .client
            .post_multipart(
                &self.url("/api/v1/users/register"),
                None,
                Self::registration_form(username, email, password),
            )
            .await;
        assert_eq!(res.status, 201, "Register failed: {}", res.body);
        res.data()
    }

    /// Log in by username or email.
    pub async fn login(&self, identifier: &str, password: &str) -> TestSession {
        let body = if identifier.contains('@') {
            serde_json::json!({ "email": identifier, "password": password })
        } else {
            serde_json::json!({ "username": identifier, "password": password })
        };
        let res = self
            .client
            .post(&self.url("/api/v1/users/login"), &body.to_string())
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.body);

        let data = res.data();
        TestSession {
            access_token: data["accessToken"].as_str().unwrap().to_string(),
            refresh_token: data["refreshToken"].as_str().unwrap().to_string(),
            user: data["user"].clone(),
        }
    }

    /// Register and log in; returns the access token and user JSON.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> (String, serde_json::Value) {
        self.register(username, email, password).await;
        let session = self.login(username, password).await;
        (session.access_token, session.user)
    }

    /// Publish a video owned by the token's user; returns the video JSON.
    pub async fn publish_video(&self, token: &str, title: &str) -> serde_json::Value {
        let form = Form::new()
            .text("title", title.to_string())
            .text("description", format!("{} description", title))
            .text("duration", "12.5")
            .part(
                "videoFile",
                Part::bytes(b"\x00\x00\x00\x18ftypmp42".to_vec())
                    .file_name("clip.mp4")
                    .mime_str("video/mp4")
                    .unwrap(),
            )
            .part("thumbnail", png_part("thumb.png"));

        let res = self
            .client
            .post_multipart(&self.url("/api/v1/videos"), Some(token), form)
            .await;
        assert_eq!(res.status, 201, "Publish failed: {}", res.body);
        res.data()
    }
}

/// A PNG file part for multipart forms.
pub fn png_part(name: &str) -> Part {
    Part::bytes(TINY_PNG.to_vec())
        .file_name(name.to_string())
        .mime_str("image/png")
        .unwrap()
}

/// A simple HTTP test client with helper methods.
#[derive(Clone)]
pub struct TestClient {
    inner: reqwest::Client,
    base_addr: SocketAddr,
}

impl TestClient {
    /// Create a new test client pointing at the given address.
    pub fn new(addr: SocketAddr) -> Self {
        TestClient {
            inner: reqwest::Client::new(),
            base_addr: addr,
        }
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> TestResponse {
        let res = req.send().await.expect("request failed");
        TestResponse::from_response(res).await
    }

    fn json(req: reqwest::RequestBuilder, body: &str) -> reqwest::RequestBuilder {
        req.header("Content-Type", "application/json")
            .body(body.to_string())
    }

    fn bearer(req: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
        req.header("Authorization", format!("Bearer {}", token))
    }

    /// Send a GET request.
    pub async fn get(&self, url: &str) -> TestResponse {
        self.send(self.inner.get(url)).await
    }

    /// Send a GET request with an auth token.
    pub async fn get_with_auth(&self, url: &str, token: &str) -> TestResponse {
        self.send(Self::bearer(self.inner.get(url), token)).await
    }

    /// Send a GET request carrying a raw `Cookie` header.
    pub async fn get_with_cookies(&self, url: &str, cookies: &str) -> TestResponse {
        self.send(self.inner.get(url).header("Cookie", cookies)).await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, url: &str, body: &str) -> TestResponse {
        self.send(Self::json(self.inner.post(url), body)).await
    }

    /// Send a POST request with auth token and JSON body.
    pub async fn post_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        self.send(Self::bearer(Self::json(self.inner.post(url), body), token))
            .await
    }

    /// Send a POST request with a raw `Cookie` header and JSON body.
    pub async fn post_with_cookies(&self, url: &str, cookies: &str, body: &str) -> TestResponse {
        self.send(Self::json(self.inner.post(url), body).header("Cookie", cookies))
            .await
    }

    /// Send a PATCH request with auth token and JSON body.
    pub async fn patch_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        self.send(Self::bearer(Self::json(self.inner.patch(url), body), token))
            .await
    }

    /// Send a DELETE request with auth token.
    pub async fn delete_with_auth(&self, url: &str, token: &str) -> TestResponse {
        self.send(Self::bearer(self.inner.delete(url), token)).await
    }

    /// Send a multipart POST, optionally authenticated.
    pub async fn post_multipart(&self, url: &str, token: Option<&str>, form: Form) -> TestResponse {
        let mut req = self.inner.post(url).multipart(form);
        if let Some(token) = token {
            req = Self::bearer(req, token);
        }
        self.send(req).await
    }

    /// Send an authenticated multipart PATCH.
    pub async fn patch_multipart_with_auth(&self, url: &str, token: &str, form: Form) -> TestResponse {
        self.send(Self::bearer(self.inner.patch(url).multipart(form), token))
            .await
    }

    /// Get the base URL.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.base_addr)
    }
}

/// A simplified HTTP response for test assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.text().await.unwrap_or_default();
        TestResponse {
            status,
            body,
            headers,
        }
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Failed to parse response as JSON")
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        let json = self.json();
        json["success"].as_bool().unwrap_or(false)
    }

    /// Get the data field from the response.
    pub fn data(&self) -> serde_json::Value {
        self.json()["data"].clone()
    }

    /// Get the error field from the response.
    pub fn error(&self) -> serde_json::Value {
        self.json()["error"].clone()
    }

    /// Get `error.code` as a string.
    pub fn error_code(&self) -> String {
        self.error()["code"].as_str().unwrap_or_default().to_string()
    }

    /// Raw `Set-Cookie` header values.
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|v| v.to_string())
            .collect()
    }

    /// The full `Set-Cookie` line for `name`, if one was sent.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{}=", name);
        self.set_cookies()
            .into_iter()
            .find(|c| c.starts_with(&prefix))
    }

    /// The value a `Set-Cookie` for `name` carries.
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        self.set_cookie(name).map(|line| {
            line.split(';')
                .next()
                .unwrap_or_default()
                .split_once('=')
                .map(|(_, v)| v.to_string())
                .unwrap_or_default()
        })
    }

    /// A `Cookie` request header replaying both session cookies from this response.
    pub fn session_cookie_header(&self) -> String {
        [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
            .iter()
            .filter_map(|name| {
                self.cookie_value(name)
                    .map(|value| format!("{}={}", name, value))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
