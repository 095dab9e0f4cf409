mod commands;
mod config;
mod error;
mod loader;
mod script;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::ReplayJob;
use crate::config::{AppConfig, ConfigOverrides, DEFAULT_LOG_FILTER};
use crate::error::AppError;

#[derive(Parser, Debug)]
#[command(name = "trackedit", about = "Trace race-track layouts over a reference image")]
struct Cli {
    #[command(flatten)]
    config: ConfigOverrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a layout document and print a summary.
    Inspect { document: PathBuf },
    /// Replay JSON-lines input events through the editor, then export.
    Replay {
        #[arg(long, default_value = loader::STDIN_SOURCE, help = "Event script path, or - for stdin")]
        script: String,
        #[arg(long, help = "Document to load before replaying")]
        doc: Option<PathBuf>,
        #[arg(long, help = "Reference image to embed")]
        image: Option<PathBuf>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    /// Embed a reference image into an existing document.
    AttachImage {
        document: PathBuf,
        image: PathBuf,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // `.env` must be loaded before clap reads `env = ...` fallbacks.
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, "failed to load .env");
        }
    }

    let cli = Cli::parse();
    let config = AppConfig::resolve(&cli.config)?;
    tracing::debug!(?config, "configuration resolved");

    match cli.command {
        Command::Inspect { document } => {
            let summary = commands::inspect(&document).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Replay { script, doc, image, out } => {
            let job = ReplayJob { script, document: doc, image, out_dir: out };
            let written = commands::replay(&job, &config).await?;
            println!("{}", written.display());
        }
        Command::AttachImage { document, image, out } => {
            let written = commands::attach_image(&document, &image, &out, &config).await?;
            println!("{}", written.display());
        }
    }
    Ok(())
}
