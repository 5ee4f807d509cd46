//! Subcommand handlers. Results go to stdout as JSON; logs go to stderr.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use prodlink_core::AppConfig;
use prodlink_scraper::{
    acquire, project, EmbeddedStateExtractor, HttpFetcher, HttpPageSource, ResolverOptions,
    UrlResolver,
};
use serde::Serialize;
use serde_json::Value;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Prints the resolution and exits non-zero when it did not succeed.
pub(crate) async fn run_resolve(config: &AppConfig, input: &str) -> anyhow::Result<ExitCode> {
    let fetcher = HttpFetcher::from_config(config)?;
    let resolver = UrlResolver::new(fetcher, ResolverOptions::from_config(config));

    let result = resolver.resolve(input).await;
    print_json(&result)?;

    if result.success {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

pub(crate) async fn run_extract(config: &AppConfig, file: &Path, keys: bool) -> anyhow::Result<()> {
    let markup = read_file(file)?;
    let state = EmbeddedStateExtractor::from_config(config)
        .extract(&markup)
        .await?;
    tracing::info!(
        anchor = %state.anchor,
        strategy = ?state.strategy,
        parse_mode = ?state.parse_mode,
        "extracted state from {}",
        file.display()
    );

    if keys {
        let names: Vec<&String> = state
            .document
            .as_object()
            .map(|map| map.keys().collect())
            .unwrap_or_default();
        return print_json(&names);
    }
    print_json(&state.document)
}

/// Accepts either a JSON document or page markup; markup goes through the
/// extractor first.
pub(crate) async fn run_project(config: &AppConfig, file: &Path, url: &str) -> anyhow::Result<()> {
    let contents = read_file(file)?;
    let document = match serde_json::from_str::<Value>(&contents) {
        Ok(document) => document,
        Err(_) => {
            tracing::debug!("input is not JSON; extracting embedded state");
            EmbeddedStateExtractor::from_config(config)
                .extract(&contents)
                .await?
                .document
        }
    };

    let product = project(&document, url)?;
    print_json(&product)
}

pub(crate) async fn run_fetch(config: &AppConfig, input: &str) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::from_config(config)?;
    let resolver = UrlResolver::new(&fetcher, ResolverOptions::from_config(config));
    let source = HttpPageSource::new(&fetcher, &config.desktop_user_agent);
    let extractor = EmbeddedStateExtractor::from_config(config);

    let acquisition = acquire(input, &resolver, &source, &extractor).await?;
    print_json(&acquisition)
}
