//! Shared configuration types.

use serde::Deserialize;

/// The API family a provider speaks.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Any OpenAI-compatible `chat/completions` endpoint.
    #[default]
    Local,
    /// A loopback Ollama server.
    Ollama,
}

/// Configuration for a specific AI provider.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    /// The type of provider (`local` or `ollama`).
    pub provider: ProviderKind,
    /// The API URL. For Ollama this is the host, e.g. `http://127.0.0.1:11434`.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key, which can be null for local providers.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}
