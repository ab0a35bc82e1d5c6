//! # AI Provider Factory
//!
//! Builds provider instances from configuration so the server and CLI construct
//! them the same way.

use crate::{
    errors::PromptError,
    providers::ai::{local::LocalAiProvider, ollama::OllamaProvider, AiProvider},
    types::{ProviderConfig, ProviderKind},
};
use tracing::info;

// Unset `${VAR}` placeholders in config files come through as empty strings.
fn model_name(config: &ProviderConfig) -> Option<String> {
    config.model_name.clone().filter(|m| !m.is_empty())
}

/// Creates an AI provider from its configuration.
///
/// A `local` provider requires `api_url`; an `ollama` provider falls back to the
/// default loopback host.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn AiProvider>, PromptError> {
    let provider: Box<dyn AiProvider> = match config.provider {
        ProviderKind::Local => {
            let api_url = config.api_url.clone().filter(|u| !u.is_empty()).ok_or_else(|| {
                PromptError::MissingAiProvider(
                    "api_url must be set for a 'local' provider.".to_string(),
                )
            })?;
            info!(%api_url, model = ?config.model_name, "Configuring OpenAI-compatible provider.");
            let mut provider = LocalAiProvider::new(api_url, config.api_key.clone(), model_name(config))?;
            if let Some(temperature) = config.temperature {
                provider = provider.with_temperature(temperature);
            }
            Box::new(provider)
        }
        ProviderKind::Ollama => {
            info!(host = ?config.api_url, model = ?config.model_name, "Configuring Ollama provider.");
            Box::new(OllamaProvider::new(
                config.api_url.clone(),
                model_name(config),
            )?)
        }
    };
    Ok(provider)
}
