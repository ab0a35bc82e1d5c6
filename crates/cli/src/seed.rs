use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use valorie::{
    constants::{DEFAULT_CHUNK_CHARS, DEFAULT_LLM_TIMEOUT_SECS},
    extract::guess_mime,
    providers::factory::create_provider,
    IdMode, ProviderConfig, ProviderKind, SeedExtractor, SeedInput,
};

/// Where the metadata model runs.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LlmType {
    /// An OpenAI-compatible chat-completions endpoint
    Local,
    /// An Ollama server on this machine
    Ollama,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdModeArg {
    Random,
    Hash,
}

impl From<IdModeArg> for IdMode {
    fn from(arg: IdModeArg) -> Self {
        match arg {
            IdModeArg::Random => IdMode::Random,
            IdModeArg::Hash => IdMode::Hash,
        }
    }
}

#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// A file path, or the raw text itself
    #[arg(required = true)]
    input: String,
    /// Model name
    #[arg(long, env = "LOCAL_AI_MODEL")]
    model: Option<String>,
    /// Model host: the chat-completions URL for `local`, the Ollama host for `ollama`
    #[arg(long, env = "LOCAL_AI_API_URL")]
    host: Option<String>,
    /// API key for a `local` endpoint
    #[arg(long, env = "LOCAL_AI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, value_enum, default_value_t = LlmType::Ollama)]
    llm_type: LlmType,
    /// How the document id is assigned when the model gives none
    #[arg(long, value_enum, default_value_t = IdModeArg::Random)]
    id_mode: IdModeArg,
    /// Characters per model call
    #[arg(long, default_value_t = DEFAULT_CHUNK_CHARS)]
    chunk_chars: usize,
    /// Per-call timeout in seconds
    #[arg(long, default_value_t = DEFAULT_LLM_TIMEOUT_SECS)]
    timeout: u64,
}

impl SeedArgs {
    fn provider_config(&self) -> ProviderConfig {
        let provider = match self.llm_type {
            LlmType::Local => ProviderKind::Local,
            LlmType::Ollama => ProviderKind::Ollama,
        };
        ProviderConfig {
            provider,
            api_url: self.host.clone(),
            api_key: self.api_key.clone(),
            model_name: self.model.clone(),
            temperature: None,
        }
    }
}

/// Reads `input` as a document when it names an existing file, otherwise
/// treats it as the text to extract from.
fn seed_input(input: &str) -> Result<SeedInput> {
    let path = Path::new(input);
    if !path.is_file() {
        return Ok(SeedInput::Text(input.to_string()));
    }
    let data = std::fs::read(path).with_context(|| format!("Failed to read '{input}'"))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(%filename, bytes = data.len(), "Reading document.");
    Ok(SeedInput::Document {
        mime: guess_mime(&filename).to_string(),
        data,
        filename,
    })
}

pub async fn handle_seed(args: SeedArgs) -> Result<()> {
    let provider = create_provider(&args.provider_config())?;
    let extractor = SeedExtractor::new(provider)
        .with_chunk_chars(args.chunk_chars)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_id_mode(args.id_mode.into());

    let record = extractor.extract_seed(seed_input(&args.input)?).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
