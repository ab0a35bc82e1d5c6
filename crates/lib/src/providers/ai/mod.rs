pub mod local;
pub mod ollama;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with a text-generation model.
///
/// Implementations wrap one HTTP API each; callers only see prompt in, text out.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, PromptError>;

    /// Generates a response with an explicit sampling temperature.
    ///
    /// Providers without a temperature knob fall back to [`AiProvider::generate`].
    async fn generate_with_temperature(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _temperature: f32,
    ) -> Result<String, PromptError> {
        self.generate(system_prompt, user_prompt).await
    }
}

dyn_clone::clone_trait_object!(AiProvider);
