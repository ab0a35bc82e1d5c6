//! # Common Test Utilities
//!
//! `TestApp` spawns the real router on a random port against a temporary
//! SQLite database. Model-backed services either point at an
//! `httpmock::MockServer` (through a generated `config.yml`) or are replaced
//! by in-process `MockAiProvider`s.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::{anyhow, Result};
use axum::serve;
use httpmock::{Method::POST, Mock, MockServer};
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::Client;
use serde_json::{json, Value};
use std::{
    fs::File,
    io::Write,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use tempfile::{tempdir, NamedTempFile, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};
use valorie::providers::{ai::AiProvider, db::sqlite::SqliteProvider};
use valorie_server::{
    auth::middleware::Claims,
    config::{self, AppConfig},
    router,
    state::{build_app_state, AppState},
};
use valorie_test_utils::MockAiProvider;

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const METADATA_MODEL_PATH: &str = "/metadata/v1/chat/completions";
pub const FRAMEWORK_MODEL_PATH: &str = "/framework/v1/chat/completions";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub db_path: PathBuf,
    pub app_state: AppState,
    _db_file: Option<NamedTempFile>,
    _config_dir: Option<TempDir>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

fn write_config(dir: &Path, content: &str) -> Result<String> {
    let config_path = dir.join("config.yml");
    let mut file = File::create(&config_path)?;
    file.write_all(content.as_bytes())?;
    config_path
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("config path is not valid UTF-8"))
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow!("temp path is not valid UTF-8"))
}

impl TestApp {
    /// Spawns the server with both model tasks routed to the mock server.
    pub async fn spawn() -> Result<Self> {
        let mock_server = MockServer::start_async().await;
        let providers = format!(
            r#"
providers:
  metadata_default:
    provider: "local"
    api_url: "{}"
    model_name: "mock-metadata-model"
    temperature: 0.0
  framework_default:
    provider: "local"
    api_url: "{}"
    api_key: "test-key"
    model_name: "mock-framework-model"
"#,
            mock_server.url(METADATA_MODEL_PATH),
            mock_server.url(FRAMEWORK_MODEL_PATH)
        );
        Self::spawn_from_config(mock_server, &providers).await
    }

    /// Spawns the server with no providers: no seed pipeline, and framework
    /// generation through the deterministic builder.
    pub async fn spawn_without_models() -> Result<Self> {
        let mock_server = MockServer::start_async().await;
        Self::spawn_from_config(mock_server, "providers: {}\n").await
    }

    async fn spawn_from_config(mock_server: MockServer, providers: &str) -> Result<Self> {
        let db_file = NamedTempFile::new()?;
        let config_dir = tempdir()?;
        let config_content = format!(
            "port: 0\ndb_url: \"{}\"\njwt_secret: \"{TEST_JWT_SECRET}\"\n{providers}",
            path_str(db_file.path())?
        );
        let config_path = write_config(config_dir.path(), &config_content)?;

        let config = config::get_config(Some(&config_path))?;
        let app_state = build_app_state(config).await?;

        let mut app = TestApp::spawn_with_state(app_state, mock_server).await?;
        app._db_file = Some(db_file);
        app._config_dir = Some(config_dir);
        Ok(app)
    }

    /// Spawns the server with in-process mock providers for either task.
    pub async fn spawn_with_providers(
        metadata: Option<MockAiProvider>,
        framework: Option<MockAiProvider>,
    ) -> Result<Self> {
        let db_file = NamedTempFile::new()?;
        let config_dir = tempdir()?;
        let config_content = format!(
            "port: 0\ndb_url: \"{}\"\njwt_secret: \"{TEST_JWT_SECRET}\"\n",
            path_str(db_file.path())?
        );
        let config_path = write_config(config_dir.path(), &config_content)?;
        let config: AppConfig = config::get_config(Some(&config_path))?;

        let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
        sqlite_provider.initialize_schema().await?;
        let app_state = AppState::new(
            config,
            sqlite_provider,
            metadata.map(|p| Box::new(p) as Box<dyn AiProvider>),
            framework.map(|p| Box::new(p) as Box<dyn AiProvider>),
        );

        let mut app =
            TestApp::spawn_with_state(app_state, MockServer::start_async().await).await?;
        app._db_file = Some(db_file);
        app._config_dir = Some(config_dir);
        Ok(app)
    }

    pub async fn spawn_with_state(app_state: AppState, mock_server: MockServer) -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let db_path = PathBuf::from(&app_state.config.db_url);
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            db_path,
            app_state: app_state_for_harness,
            _db_file: None,
            _config_dir: None,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers an account and returns its access token and user id.
    pub async fn register(&self, email: &str, username: &str) -> Result<(String, String)> {
        let response = self
            .client
            .post(self.url("/api/users/register"))
            .json(&json!({"email": email, "username": username, "password": "secret123"}))
            .send()
            .await?;
        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await?;
            return Err(anyhow!("registration failed: {status} {body}"));
        }
        let body: Value = response.json().await?;
        let token = body["access_token"]
            .as_str()
            .ok_or_else(|| anyhow!("no access_token in {body}"))?;
        let user_id = body["user"]["id"]
            .as_str()
            .ok_or_else(|| anyhow!("no user id in {body}"))?;
        Ok((token.to_string(), user_id.to_string()))
    }

    /// Answers chat completions on `path` with `content` as the assistant message.
    pub fn mock_chat<'a>(&'a self, path: &str, content: &str) -> Mock<'a> {
        let body = chat_completion(content);
        self.mock_server.mock(|when, then| {
            when.method(POST).path(path.to_string());
            then.status(200).json_body(body);
        })
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// An OpenAI-style chat completion body.
pub fn chat_completion(content: &str) -> Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}

/// Signs a token with the test secret, expiring `expires_in_secs` from now
/// (negative for an already expired token).
pub fn token_for(user_id: &str, expires_in_secs: i64) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();
    let claims = Claims {
        sub: user_id.to_string(),
        email: format!("{user_id}@example.com"),
        username: user_id.to_string(),
        exp: (now + expires_in_secs) as usize,
        iat: now as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}

/// A framework as the model would return it.
pub fn sample_framework(title: &str) -> Value {
    json!({
        "metadata": {
            "title": title,
            "version": "1.0.0",
            "description": "How the team reviews incoming cases."
        },
        "steps": [
            {"name": "Collect", "description": "Gather the case notes.", "subSteps": ["Read the intake form"]},
            {"name": "Review", "description": "Check eligibility."}
        ],
        "artefacts": {
            "primary": {"name": "Review Checklist", "description": "One page checklist."},
            "additional": [{"name": "Escalation Log", "description": "Record of escalated cases."}]
        },
        "risks": [{"title": "Missing data", "description": "Forms arrive incomplete."}],
        "escalation": [{"trigger": "Eligibility unclear", "action": "Ask a supervisor"}],
        "pov": ["reviewer"],
        "confidence": 0.9
    })
}
