//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds the configuration, the
//! database, and the two model-backed services every handler draws on.

use crate::config::{AppConfig, FRAMEWORK_GENERATION_TASK, METADATA_EXTRACTION_TASK};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use valorie::{
    providers::{ai::AiProvider, db::sqlite::SqliteProvider, factory::create_provider},
    FrameworkGenerator, SeedExtractor,
};

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// Users, materials and frameworks live here.
    pub sqlite_provider: Arc<SqliteProvider>,
    /// The seed pipeline, present only when a metadata provider is configured.
    pub seed_extractor: Option<Arc<SeedExtractor>>,
    /// Framework generation. Falls back to the mock builder without a provider.
    pub framework_generator: Arc<FrameworkGenerator>,
}

/// Instantiates the provider assigned to `task`.
///
/// A missing or unusable provider is logged and reported as `None`: the server
/// still starts, and the affected endpoints degrade or refuse.
fn provider_for_task(config: &AppConfig, task: &str) -> Option<Box<dyn AiProvider>> {
    let Some((name, provider_config)) = config.task_provider(task) else {
        warn!(task, "No provider configured for task.");
        return None;
    };
    match create_provider(provider_config) {
        Ok(provider) => {
            info!(task, provider = name, "Provider ready.");
            Some(provider)
        }
        Err(e) => {
            warn!(task, provider = name, error = %e, "Provider unavailable.");
            None
        }
    }
}

impl AppState {
    /// Assembles the state from already-built services.
    pub fn new(
        config: AppConfig,
        sqlite_provider: SqliteProvider,
        metadata_provider: Option<Box<dyn AiProvider>>,
        framework_provider: Option<Box<dyn AiProvider>>,
    ) -> Self {
        let seed_extractor = metadata_provider.map(|provider| {
            Arc::new(
                SeedExtractor::new(provider)
                    .with_chunk_chars(config.chunk_chars)
                    .with_concurrency(config.chunk_concurrency)
                    .with_timeout(Duration::from_secs(config.llm_timeout_secs))
                    .with_id_mode(config.seed_id_mode),
            )
        });
        let framework_generator = FrameworkGenerator::new(framework_provider)
            .with_timeout(Duration::from_secs(config.framework_timeout_secs));

        Self {
            config: Arc::new(config),
            sqlite_provider: Arc::new(sqlite_provider),
            seed_extractor,
            framework_generator: Arc::new(framework_generator),
        }
    }
}

/// Builds the shared application state from the configuration.
///
/// This function instantiates the providers for the metadata extraction and
/// framework generation tasks, opens the SQLite database and makes sure the
/// schema exists.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let metadata_provider = provider_for_task(&config, METADATA_EXTRACTION_TASK);
    let framework_provider = provider_for_task(&config, FRAMEWORK_GENERATION_TASK);

    if let Some(parent) = std::path::Path::new(&config.db_url).parent() {
        if !parent.as_os_str().is_empty() && config.db_url != ":memory:" {
            std::fs::create_dir_all(parent)?;
        }
    }
    let sqlite_provider = SqliteProvider::new(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized local storage provider (SQLite).");
    // Ensure the database schema is up-to-date on startup.
    sqlite_provider.initialize_schema().await?;

    Ok(AppState::new(
        config,
        sqlite_provider,
        metadata_provider,
        framework_provider,
    ))
}
