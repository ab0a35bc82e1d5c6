use crate::{constants::CONTEXT_WINDOW_TOKENS, errors::PromptError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const MIN_OUTPUT_TOKENS: i64 = 300;
const MAX_OUTPUT_TOKENS: i64 = 1500;
const SAFETY_MARGIN_TOKENS: i64 = 200;

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct LocalAiRequest<'a> {
    messages: Vec<LocalAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    max_tokens: i64,
    stream: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct LocalAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct LocalAiResponse {
    choices: Vec<LocalAiChoice>,
}

#[derive(Deserialize, Debug)]
struct LocalAiChoice {
    message: LocalAiMessage,
}

/// Output token budget for a prompt, assuming two tokens per word and a 4096
/// token context window.
pub fn output_token_budget(user_prompt: &str) -> i64 {
    let input_estimate = user_prompt.split_whitespace().count() as i64 * 2;
    let available = CONTEXT_WINDOW_TOKENS - input_estimate - SAFETY_MARGIN_TOKENS;
    available.clamp(MIN_OUTPUT_TOKENS, MAX_OUTPUT_TOKENS)
}

// --- Local Provider implementation ---

/// A provider for any OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone, Debug)]
pub struct LocalAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
    temperature: f32,
}

impl LocalAiProvider {
    /// Creates a new `LocalAiProvider`.
    ///
    /// `api_url` is the full completions URL, e.g. `http://host/v1/chat/completions`.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            model,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Sets the default sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl AiProvider for LocalAiProvider {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, PromptError> {
        self.generate_with_temperature(system_prompt, user_prompt, self.temperature)
            .await
    }

    async fn generate_with_temperature(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, PromptError> {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(LocalAiMessage {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            });
        }
        messages.push(LocalAiMessage {
            role: "user".to_string(),
            content: user_prompt.to_string(),
        });

        let max_tokens = output_token_budget(user_prompt);
        debug!(max_tokens, temperature, url = %self.api_url, "Sending chat completion request.");

        let request_body = LocalAiRequest {
            messages,
            model: self.model.as_deref(),
            temperature,
            max_tokens,
            stream: false,
        };

        let mut request_builder = self.client.post(&self.api_url);

        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }

        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(error_text));
        }

        let local_ai_response: LocalAiResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        let raw_response = local_ai_response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        debug!(chars = raw_response.len(), "Received chat completion response.");
        Ok(raw_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_is_clamped() {
        assert_eq!(output_token_budget("short prompt"), 1500);
        let long = "word ".repeat(1700);
        assert_eq!(output_token_budget(&long), 300);
        let medium = "word ".repeat(1000);
        assert_eq!(output_token_budget(&medium), 4096 - 2000 - 200);
    }
}
