//! Provider for a local Ollama server.

use crate::{errors::PromptError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    format: &'a str,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Talks to Ollama's `/api/generate` endpoint in JSON mode.
///
/// Only loopback hosts are accepted, so document text never leaves the machine.
#[derive(Clone, Debug)]
pub struct OllamaProvider {
    client: ReqwestClient,
    host: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(host: Option<String>, model: Option<String>) -> Result<Self, PromptError> {
        let host = host
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_OLLAMA_HOST.to_string());
        if !is_loopback(&host) {
            return Err(PromptError::MissingAiProvider(format!(
                "Ollama host must be localhost or 127.0.0.1, got '{host}'"
            )));
        }
        let client = ReqwestClient::builder()
            .no_proxy()
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            model: model
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
        })
    }
}

fn is_loopback(host: &str) -> bool {
    host.starts_with("http://127.0.0.1") || host.starts_with("http://localhost")
}

#[async_trait]
impl AiProvider for OllamaProvider {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, PromptError> {
        let url = format!("{}/api/generate", self.host);
        let body = OllamaRequest {
            model: &self.model,
            prompt: user_prompt,
            system: system_prompt,
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: 0.0,
                top_p: 0.9,
            },
        };
        debug!(%url, model = %self.model, "Sending Ollama generate request.");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(error_text));
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;
        Ok(parsed.response.unwrap_or_default().trim().to_string())
    }
}
