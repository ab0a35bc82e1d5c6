use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use std::io::Read;
use std::time::Duration;
use tracing::info;
use valorie::{
    constants::DEFAULT_FRAMEWORK_TIMEOUT_SECS, providers::factory::create_provider, schema::Record,
    FrameworkGenerator, ProviderConfig, ProviderKind,
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

#[derive(Parser, Debug)]
pub struct FrameworkArgs {
    /// Path to a metadata JSON file, or `-` for stdin
    #[arg(required = true)]
    metadata: String,
    #[arg(long, default_value = "gpt-4o")]
    model: String,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// API base URL, or a full chat-completions URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    base_url: Option<String>,
    /// Model call timeout in seconds
    #[arg(long, default_value_t = DEFAULT_FRAMEWORK_TIMEOUT_SECS)]
    timeout: u64,
    /// Output path, or `-` for stdout
    #[arg(long, default_value = "-")]
    out: String,
    /// Build the framework without calling the model
    #[arg(long)]
    dry_run: bool,
}

/// Expands an API base URL to its chat-completions endpoint.
fn chat_completions_url(base_url: Option<&str>) -> String {
    let base = base_url
        .filter(|b| !b.trim().is_empty())
        .unwrap_or(DEFAULT_BASE_URL)
        .trim_end_matches('/');
    if base.ends_with(CHAT_COMPLETIONS_PATH) {
        base.to_string()
    } else {
        format!("{base}{CHAT_COMPLETIONS_PATH}")
    }
}

fn load_metadata(source: &str) -> Result<Record> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read metadata from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read metadata file '{source}'"))?
    };
    match serde_json::from_str(&raw).context("Metadata is not valid JSON")? {
        Value::Object(record) => Ok(record),
        _ => bail!("Metadata must be a JSON object"),
    }
}

pub async fn handle_framework(args: FrameworkArgs) -> Result<()> {
    let metadata = load_metadata(&args.metadata)?;
    let api_key = args.api_key.clone().filter(|k| !k.is_empty());

    let generator = match api_key {
        Some(api_key) if !args.dry_run => {
            let config = ProviderConfig {
                provider: ProviderKind::Local,
                api_url: Some(chat_completions_url(args.base_url.as_deref())),
                api_key: Some(api_key),
                model_name: Some(args.model.clone()),
                temperature: None,
            };
            FrameworkGenerator::new(Some(create_provider(&config)?))
                .with_timeout(Duration::from_secs(args.timeout))
        }
        _ => {
            info!("No API key or dry run requested; using the offline builder.");
            FrameworkGenerator::new(None)
        }
    };

    let framework = generator.generate(&metadata, args.dry_run).await?;
    let json = serde_json::to_string_pretty(&framework)?;
    if args.out == "-" {
        println!("{json}");
    } else {
        std::fs::write(&args.out, json)
            .with_context(|| format!("Failed to write framework to '{}'", args.out))?;
        info!(path = %args.out, "Framework written.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_completions_url() {
        assert_eq!(
            chat_completions_url(None),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url(Some("http://localhost:8000/v1/")),
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url(Some("http://localhost:8000/v1/chat/completions")),
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(
            chat_completions_url(Some("  ")),
            "https://api.openai.com/v1/chat/completions"
        );
    }
}
