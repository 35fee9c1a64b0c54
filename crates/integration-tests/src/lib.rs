//! Integration tests for Vitrine.
//!
//! These drive a running `vitrine-server` over HTTP. Every test is ignored
//! by default.
//!
//! # Running Tests
//!
//! ```bash
//! vitrine-cli migrate
//! cargo run -p vitrine-server &
//! cargo test -p vitrine-integration-tests -- --ignored
//! ```
//!
//! `VITRINE_BASE_URL` overrides the default `http://localhost:8080`.
//! Register and login are rate limited per client IP; each [`TestClient`]
//! sends its own `X-Forwarded-For` address so tests do not share a window.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, Response, StatusCode, multipart};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("VITRINE_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Registration fields that do not collide with earlier runs.
#[derive(Debug, Clone)]
pub struct TestAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub number: String,
}

impl TestAccount {
    #[must_use]
    pub fn unique() -> Self {
        let id = Uuid::new_v4();
        let simple = id.simple().to_string();
        let suffix = simple.get(..10).unwrap_or(&simple);
        Self {
            username: format!("user {suffix}"),
            email: format!("{suffix}@example.com"),
            password: "pass123456".to_string(),
            number: format!("11{:09}", id.as_u128() % 1_000_000_000),
        }
    }

    #[must_use]
    pub fn registration(&self) -> Value {
        json!({
            "username": self.username,
            "email": self.email,
            "password": self.password,
            "number": self.number,
        })
    }
}

/// HTTP client bound to the server under test, optionally authenticated.
#[derive(Debug, Clone)]
pub struct TestClient {
    pub http: Client,
    pub base_url: String,
    pub token: Option<String>,
    pub client_ip: String,
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClient {
    #[must_use]
    pub fn new() -> Self {
        let [a, b, c, ..] = Uuid::new_v4().into_bytes();
        Self {
            http: Client::new(),
            base_url: base_url(),
            token: None,
            client_ip: format!("10.{a}.{b}.{c}"),
        }
    }

    /// Register and log in a fresh account.
    pub async fn signed_up() -> (Self, TestAccount, Value) {
        let mut client = Self::new();
        let account = TestAccount::unique();

        let resp = client.post_json("/public/register", &account.registration()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = resp.json().await.expect("register body");
        let user = body["user"].clone();

        client.login(&account.email, &account.password).await;
        (client, account, user)
    }

    /// Log in and keep the bearer token.
    pub async fn login(&mut self, email: &str, password: &str) {
        let resp = self
            .post_json("/public/login", &json!({ "email": email, "password": password }))
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = resp.json().await.expect("login body");
        self.token = Some(
            body["token"]
                .as_str()
                .expect("token in login response")
                .to_string(),
        );
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .header("x-forwarded-for", &self.client_ip);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str) -> Response {
        self.request(reqwest::Method::GET, path)
            .send()
            .await
            .expect("GET request")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.request(reqwest::Method::DELETE, path)
            .send()
            .await
            .expect("DELETE request")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await
            .expect("POST request")
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Response {
        self.request(reqwest::Method::PUT, path)
            .json(body)
            .send()
            .await
            .expect("PUT request")
    }

    pub async fn post_form(&self, path: &str, form: multipart::Form) -> Response {
        self.request(reqwest::Method::POST, path)
            .multipart(form)
            .send()
            .await
            .expect("POST multipart request")
    }

    pub async fn put_form(&self, path: &str, form: multipart::Form) -> Response {
        self.request(reqwest::Method::PUT, path)
            .multipart(form)
            .send()
            .await
            .expect("PUT multipart request")
    }

    /// Create a collection and return its JSON.
    pub async fn create_collection(&self, name: &str) -> Value {
        let resp = self
            .post_json("/protected/collections", &json!({ "name": name, "description": "" }))
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        resp.json().await.expect("collection body")
    }
}

/// A tiny PNG part for multipart uploads.
#[must_use]
pub fn png_part(file_name: &str) -> multipart::Part {
    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
    multipart::Part::bytes(PNG_SIGNATURE.to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("valid mime")
}
