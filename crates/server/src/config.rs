//! # Application Configuration
//!
//! This module defines the configuration structure for the `valorie-server` and
//! provides the logic for loading it from a `config.yml` file and environment
//! variables.

use config::{
    Config as ConfigBuilder, Environment, File, FileFormat, Value as ConfigValue,
    ValueKind as ConfigValueKind,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::sync::LazyLock;
use tracing::{info, warn};
use valorie::constants::{
    DEFAULT_CHUNK_CHARS, DEFAULT_DB_FILE, DEFAULT_FRAMEWORK_TIMEOUT_SECS, DEFAULT_LLM_TIMEOUT_SECS,
};
use valorie::{IdMode, ProviderConfig};

/// The task that turns documents into seed metadata.
pub const METADATA_EXTRACTION_TASK: &str = "metadata_extraction";
/// The task that turns metadata into frameworks.
pub const FRAMEWORK_GENERATION_TASK: &str = "framework_generation";

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").expect("Invalid regex"));

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// The HS256 signing secret for access tokens. Loaded from `JWT_SECRET`.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_expiry_days")]
    pub token_expiry_days: i64,
    /// How seed records get a `doc_id` when the model omits one.
    #[serde(default)]
    pub seed_id_mode: IdMode,
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    #[serde(default = "default_chunk_concurrency")]
    pub chunk_concurrency: usize,
    /// Per-call timeout for metadata extraction.
    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    /// Per-call timeout for framework generation.
    #[serde(default = "default_framework_timeout_secs")]
    pub framework_timeout_secs: u64,
    /// A map of named, reusable AI provider configurations.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// A map of tasks, each naming the provider it runs on.
    #[serde(default)]
    pub tasks: HashMap<String, TaskConfig>,
}

fn default_port() -> u16 {
    9090
}

fn default_db_url() -> String {
    DEFAULT_DB_FILE.to_string()
}

fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}

fn default_token_expiry_days() -> i64 {
    7
}

fn default_chunk_chars() -> usize {
    DEFAULT_CHUNK_CHARS
}

fn default_chunk_concurrency() -> usize {
    1
}

fn default_llm_timeout_secs() -> u64 {
    DEFAULT_LLM_TIMEOUT_SECS
}

fn default_framework_timeout_secs() -> u64 {
    DEFAULT_FRAMEWORK_TIMEOUT_SECS
}

/// Names the provider an application task runs on.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskConfig {
    /// The key of the provider to use from the `providers` map.
    #[serde(default)]
    pub provider: Option<String>,
}

impl AppConfig {
    /// Resolves the provider configuration assigned to `task`, if any.
    pub fn task_provider(&self, task: &str) -> Option<(&str, &ProviderConfig)> {
        let name = self.tasks.get(task)?.provider.as_deref()?;
        self.providers.get(name).map(|p| (name, p))
    }
}

/// The default task table: both tasks point at conventionally named providers
/// that a config file may or may not define.
fn build_default_tasks() -> HashMap<String, ConfigValue> {
    [
        (METADATA_EXTRACTION_TASK, "metadata_default"),
        (FRAMEWORK_GENERATION_TASK, "framework_default"),
    ]
    .into_iter()
    .map(|(name, provider)| {
        let mut table = HashMap::new();
        table.insert("provider".to_string(), ConfigValue::from(provider));
        (
            name.to_string(),
            ConfigValue::new(None, ConfigValueKind::Table(table)),
        )
    })
    .collect()
}

/// Replaces every `${VAR}` with the value of that environment variable, or an
/// empty string when it is unset.
pub fn substitute_env(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures| {
            env::var(&caps["var"]).unwrap_or_default()
        })
        .into_owned()
}

// Returns Ok(None) if the file does not exist.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    Ok(Some(substitute_env(&content)))
}

/// Loads the application configuration from a file and environment variables.
///
/// - Top-level keys like `port`, `db_url` and `jwt_secret` are overridden by
///   `PORT`, `DB_URL` and `JWT_SECRET`.
/// - Nested keys are overridden by `VALORIE_...` variables
///   (e.g., `VALORIE_PROVIDERS__FRAMEWORK_DEFAULT__API_KEY`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults.
        .set_default("tasks", build_default_tasks())?;

    // Layer 2: Main Config (with Fallback)
    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        let user_config_path = format!("{base_path}/config.yml");
        if std::path::Path::new(&user_config_path).exists() {
            info!("Loading user-defined configuration from '{user_config_path}'.");
            user_config_path
        } else {
            let provider = env::var("AI_PROVIDER").unwrap_or_else(|_| "local".to_string());
            let fallback_path = format!("{base_path}/config.{provider}.yml");
            info!("'{user_config_path}' not found. Falling back to '{fallback_path}' based on AI_PROVIDER='{provider}'.");
            fallback_path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?
        .ok_or_else(|| ConfigError::NotFound(format!("Main config file not found at '{main_config_path}'. Please ensure 'config.yml' exists or your AI_PROVIDER is set to load a valid template ('local' or 'ollama').")))?;
    builder = builder.add_source(File::from_str(&main_content, FileFormat::Yaml));

    let settings = builder
        // Layer 3: Plain environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Layer 4: Prefixed environment variables for nested overrides.
        .add_source(
            Environment::with_prefix("VALORIE")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    // An unset `${JWT_SECRET}` placeholder substitutes to an empty string.
    if config.jwt_secret.is_empty() {
        warn!("jwt_secret is empty; falling back to the built-in development secret.");
        config.jwt_secret = default_jwt_secret();
    }

    Ok(config)
}
