mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "prodlink")]
#[command(about = "Resolve marketplace share links and extract product data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Resolve a URL or pasted share text to a canonical product URL
    Resolve {
        /// URL, short link, or free text containing one
        input: String,
    },
    /// Extract the embedded state object from a saved product page
    Extract {
        file: PathBuf,
        /// Print only the top-level keys of the extracted document
        #[arg(long)]
        keys: bool,
    },
    /// Project a saved state document (JSON or page markup) into a product
    Project {
        file: PathBuf,
        /// Canonical product URL; decides the vendor family
        #[arg(long)]
        url: String,
    },
    /// Resolve, download, extract, and project in one run
    Fetch { input: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = prodlink_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(
        env = %config.env,
        evaluator = %config.literal_evaluator,
        "configuration loaded"
    );

    let cli = Cli::parse();
    match cli.command {
        Commands::Resolve { input } => commands::run_resolve(&config, &input).await,
        Commands::Extract { file, keys } => {
            commands::run_extract(&config, &file, keys).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Project { file, url } => {
            commands::run_project(&config, &file, &url).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fetch { input } => {
            commands::run_fetch(&config, &input).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
