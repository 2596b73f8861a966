#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

use officescapes_api::config::AppConfig;
use officescapes_api::database::{DocumentStore, MemoryStore};
use officescapes_api::schema;
use officescapes_api::state::AppState;

/// Password every seeded account shares.
pub const SEED_PASSWORD: &str = "password123";
pub const REGISTER_PASSWORD: &str = "secret-pass";

pub const ADMIN: &str = "admin@officescapes.app";
/// Organization account of Leo/need (organization 3).
pub const LEONEED: &str = "recruiting@leoneed.jp";
/// Student in Leo/need (user 3).
pub const ICHIKA: &str = "hoshino.ichika@leo.co.jp";
/// Student in MORE MORE JUMP! (user 5).
pub const HONAMI: &str = "mochizuki.honami@leo.co.jp";
/// Graduate without an organization (user 9) holding a pending application to Leo/need.
pub const MIZUKI: &str = "akiyama.mizuki@nightcord.jp";

/// One server per test, bound to an ephemeral port over a fresh memory store.
pub struct TestApp {
    pub base_url: String,
    pub state: AppState,
    client: reqwest::Client,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.bcrypt_cost = 4;
    config.seed.on_startup = false;
    config.api.enable_request_logging = false;
    config
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        store.prepare(schema::ALL).await?;
        let state = AppState::new(test_config(), store);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let app = officescapes_api::app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url,
            state,
            client: reqwest::Client::new(),
        })
    }

    /// A server whose store holds the demo data.
    pub async fn seeded() -> Result<Self> {
        let app = Self::spawn().await?;
        officescapes_api::seed::seed(app.state.store.clone(), app.state.config.security.bcrypt_cost).await?;
        Ok(app)
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await?;
        let status = res.status();
        let body = res.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, path, token, None).await
    }

    /// Signs in and returns the access token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let (status, body) = self
            .post("/api/auth/login", None, json!({ "email": email, "password": password }))
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login as {} failed: {} {}", email, status, body);
        body["accessToken"]
            .as_str()
            .map(str::to_string)
            .context("login response has no accessToken")
    }

    pub async fn login_seeded(&self, email: &str) -> Result<String> {
        self.login(email, SEED_PASSWORD).await
    }

    /// Registers an account and returns the full response body.
    pub async fn register(&self, email: &str, user_type: &str) -> Result<(StatusCode, Value)> {
        self.post(
            "/api/auth/register",
            None,
            json!({
                "email": email,
                "password": REGISTER_PASSWORD,
                "firstName": "Shinonome",
                "lastName": "Ena",
                "userType": user_type
            }),
        )
        .await
    }
}
