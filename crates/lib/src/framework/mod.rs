//! # Framework Generation
//!
//! Turns a metadata record into a framework: a structured playbook with steps,
//! artefacts, risks and escalation rules. A configured model does the writing;
//! without one, [`mock::build_mock_framework`] derives a framework from the
//! metadata alone.

pub mod family;
pub mod markdown;
pub mod mock;

pub use family::{ensure_family, Family};
pub use markdown::{export_filename, framework_to_markdown, framework_to_text};
pub use mock::build_mock_framework;

use crate::constants::DEFAULT_FRAMEWORK_TIMEOUT_SECS;
use crate::errors::PromptError;
use crate::prompts::framework::{
    framework_improve_prompt, framework_user_prompt, FRAMEWORK_IMPROVE_SYSTEM_PROMPT,
    FRAMEWORK_SYSTEM_PROMPT, JSON_REPAIR_SYSTEM_PROMPT,
};
use crate::providers::ai::AiProvider;
use crate::repair::robust_json_loads;
use crate::schema::Record;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const GENERATE_TEMPERATURE: f32 = 0.2;
const REPAIR_TEMPERATURE: f32 = 0.0;
const IMPROVE_TEMPERATURE: f32 = 0.3;

/// Produces frameworks from metadata, with or without a model.
#[derive(Debug, Clone)]
pub struct FrameworkGenerator {
    provider: Option<Box<dyn AiProvider>>,
    call_timeout: Duration,
}

impl Default for FrameworkGenerator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FrameworkGenerator {
    /// With `None`, every generation uses the deterministic builder.
    pub fn new(provider: Option<Box<dyn AiProvider>>) -> Self {
        Self {
            provider,
            call_timeout: Duration::from_secs(DEFAULT_FRAMEWORK_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Whether a framework model is configured.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    async fn call(
        &self,
        provider: &dyn AiProvider,
        system: &str,
        user: &str,
        temperature: f32,
    ) -> Result<String, PromptError> {
        tokio::time::timeout(
            self.call_timeout,
            provider.generate_with_temperature(system, user, temperature),
        )
        .await
        .map_err(|_| PromptError::Timeout(self.call_timeout.as_secs()))?
    }

    /// Generates a framework for `metadata`.
    ///
    /// Uses the deterministic builder when `use_mock` is set or no model is
    /// configured. A model answer that cannot be parsed gets exactly one repair
    /// call before the error is returned. The result always carries a `family`.
    #[instrument(skip(self, metadata))]
    pub async fn generate(&self, metadata: &Record, use_mock: bool) -> Result<Record, PromptError> {
        let provider = match &self.provider {
            Some(provider) if !use_mock => provider,
            _ => {
                info!("Building framework without a model.");
                return Ok(with_family(build_mock_framework(metadata)));
            }
        };

        let metadata_json = serde_json::to_string_pretty(metadata)?;
        let user_prompt = framework_user_prompt(&metadata_json);
        info!(prompt_chars = user_prompt.len(), "Requesting framework from model.");

        let raw = self
            .call(provider.as_ref(), FRAMEWORK_SYSTEM_PROMPT, &user_prompt, GENERATE_TEMPERATURE)
            .await?;
        debug!(response = %raw, "Framework model response received.");

        let framework = match robust_json_loads(&raw) {
            Ok(framework) => framework,
            Err(e) => {
                warn!(error = %e, "Framework response was not JSON; requesting a repair.");
                let repaired = self
                    .call(provider.as_ref(), JSON_REPAIR_SYSTEM_PROMPT, &raw, REPAIR_TEMPERATURE)
                    .await?;
                robust_json_loads(&repaired)?
            }
        };

        Ok(with_family(framework))
    }

    /// Asks the model to complete a user-edited framework without discarding edits.
    #[instrument(skip(self, framework))]
    pub async fn improve(&self, framework: &Value) -> Result<Record, PromptError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            PromptError::MissingAiProvider("no framework generation provider is configured".into())
        })?;
        let user_prompt = framework_improve_prompt(&serde_json::to_string_pretty(framework)?);
        let raw = self
            .call(
                provider.as_ref(),
                FRAMEWORK_IMPROVE_SYSTEM_PROMPT,
                &user_prompt,
                IMPROVE_TEMPERATURE,
            )
            .await?;
        Ok(robust_json_loads(&raw)?)
    }
}

fn with_family(mut framework: Record) -> Record {
    if framework.get("frameworks").is_some_and(Value::is_array) {
        return framework;
    }
    let family = ensure_family(&Value::Object(framework.clone()));
    framework.insert("family".to_string(), Value::String(family.as_str().to_string()));
    framework
}

/// Splits a generation result into its frameworks.
///
/// A model may answer with `{"frameworks": [...]}` to offer several points of
/// view; any other answer is a single framework.
pub fn into_frameworks(result: Record) -> Vec<Record> {
    match result.get("frameworks") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .map(with_family)
            .collect(),
        _ => vec![result],
    }
}
