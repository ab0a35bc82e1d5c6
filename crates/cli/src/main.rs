//! # valorie: A CLI for the `valorie` pipeline
//!
//! `valorie seed` turns a document or text into seed metadata; `valorie
//! framework` turns seed metadata into a framework. Results go to stdout as
//! JSON, logs go to stderr.

mod framework;
mod seed;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log pipeline progress at debug level (unless RUST_LOG is set)
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract seed metadata from a file or raw text
    Seed(seed::SeedArgs),
    /// Generate a framework from seed metadata
    Framework(framework::FrameworkArgs),
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Seed(args) => seed::handle_seed(args).await,
        Commands::Framework(args) => framework::handle_framework(args).await,
    }
}
