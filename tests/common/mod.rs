#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use notes_api::auth::JwtAuthority;
use notes_api::config::{AppConfig, Environment, StorageBackend};
use notes_api::database::DatabaseManager;
use notes_api::storage::MemoryBlobStore;
use notes_api::{router, AppState};

pub const JWT_SECRET: &str = "integration-test-secret";
pub const BLOB_BASE_URL: &str = "http://blobs.test";

/// Nothing listens here; used when a test must prove the database is never reached.
const UNREACHABLE_DATABASE_URL: &str = "postgres://nobody@127.0.0.1:9/unreachable";

/// One router instance bound to an ephemeral port for the duration of a test.
pub struct TestServer {
    pub base_url: String,
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub blobs: Arc<MemoryBlobStore>,
    pub db: sqlx::PgPool,
}

pub struct Session {
    pub account_id: Uuid,
    pub email: String,
    pub token: String,
}

pub fn test_config(database_url: &str) -> AppConfig {
    let mut config = AppConfig::for_environment(Environment::Development);
    config.database.url = database_url.to_string();
    config.database.connection_timeout = 2;
    config.database.max_connections = 5;
    config.security.jwt_secret = JWT_SECRET.to_string();
    config.security.jwt_expiry_hours = 1;
    config.storage.backend = StorageBackend::Memory;
    config.storage.public_base_url = BLOB_BASE_URL.to_string();
    config.api.enable_request_logging = false;
    config
}

/// Server whose pool points at nothing. Any request that touches the
/// database fails, so a 401 from it proves auth ran first.
pub async fn spawn_without_db() -> Result<TestServer> {
    let config = test_config(UNREACHABLE_DATABASE_URL);
    let pool = DatabaseManager::connect_lazy(&config.database)?;
    spawn(pool, config).await
}

/// Server backed by `TEST_DATABASE_URL`, migrated. `None` when the variable is unset.
pub async fn spawn_with_db() -> Result<Option<TestServer>> {
    spawn_with_db_tuned(|_| {}).await
}

/// Like `spawn_with_db`, with a hook to adjust the config first.
pub async fn spawn_with_db_tuned(tune: impl FnOnce(&mut AppConfig)) -> Result<Option<TestServer>> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            eprintln!("TEST_DATABASE_URL not set; skipping database test");
            return Ok(None);
        }
    };

    let mut config = test_config(&url);
    tune(&mut config);
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to TEST_DATABASE_URL")?;
    DatabaseManager::migrate_up(&pool).await?;

    spawn(pool, config).await.map(Some)
}

async fn spawn(pool: sqlx::PgPool, config: AppConfig) -> Result<TestServer> {
    let blobs = Arc::new(MemoryBlobStore::new(BLOB_BASE_URL));
    let state = AppState::new(pool.clone(), config, blobs.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        base_url: format!("http://{}", addr),
        addr,
        client: reqwest::Client::new(),
        blobs,
        db: pool,
    })
}

pub fn token_for(account_id: Uuid) -> String {
    JwtAuthority::new(JWT_SECRET, 1)
        .issue(account_id)
        .expect("token issue")
}

pub fn unique_email(tag: &str) -> String {
    format!("{}-{}@example.com", tag, Uuid::new_v4().simple())
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token)
    }

    pub fn put(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token)
    }

    pub fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// Sign up with a password, then log in.
    pub async fn new_session(&self, tag: &str) -> Result<Session> {
        let email = unique_email(tag);
        let res = self
            .client
            .post(self.url("/users"))
            .json(&json!({
                "email": email,
                "firstName": tag,
                "lastName": "Tester",
                "password": "correct horse"
            }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "sign-up failed: {}", res.status());
        let body: Value = res.json().await?;
        let account_id: Uuid = body["data"]["id"]
            .as_str()
            .context("sign-up response has no id")?
            .parse()?;

        let res = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": "correct horse" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        let token = body["data"]["token"].as_str().context("login response has no token")?.to_string();

        Ok(Session { account_id, email, token })
    }
}

/// Status plus parsed body; the body is `Null` for empty responses.
pub async fn send(request: RequestBuilder) -> Result<(StatusCode, Value)> {
    let res = request.send().await?;
    let status = res.status();
    let text = res.text().await?;
    let body = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
    Ok((status, body))
}
