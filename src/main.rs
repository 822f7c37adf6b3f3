//! # Painel de Transparência
//!
//! Collects public indicators for six municipalities of the Bahia sertão
//! (Monte Santo, Cansanção, Uauá, Quijingue, Euclides da Cunha and Senhor do
//! Bonfim) and entrepreneurship news from G1 PEGN, and writes JSON reports.
//!
//! ## Reports
//!
//! - **news**: latest PEGN articles with tags, category and summary
//! - **social**: IBGE population, GDP per capita and HDI, ranked
//! - **spending**: SICONFI health and education spending, ranked
//! - **transparency**: Monte Santo compared against its neighbours
//!
//! ## Usage
//!
//! ```sh
//! painel_transparencia -j ./json all
//! ```
//!
//! Every network call degrades to a fallback value or a skipped item, so a
//! run only fails when its output cannot be written.

use clap::Parser;
use std::error::Error;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod fetchers;
mod models;
mod outputs;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use fetchers::{ibge::IbgeFetcher, siconfi::SiconfiFetcher, transparency::TransparencyFetcher};
use outputs::json;
use scrapers::pegn::{MAX_LINKS, PegnScraper};
use utils::{ensure_writable_dir, truncate_for_log};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("painel_transparencia starting up");

    let args = Cli::parse();
    info!(json_output_dir = %args.json_output_dir, command = ?args.command, "Parsed CLI arguments");

    if let Err(e) = ensure_writable_dir(&args.json_output_dir).await {
        error!(
            path = %args.json_output_dir,
            error = %e,
            "JSON output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let dir = args.json_output_dir.as_str();
    match args.command {
        Command::News { max_articles } => run_news(dir, max_articles).await?,
        Command::Social => run_social(dir).await?,
        Command::Spending { year } => run_spending(dir, year).await?,
        Command::Transparency => run_transparency(dir).await?,
        Command::All { max_articles, year } => {
            run_social(dir).await?;
            run_spending(dir, year).await?;
            run_transparency(dir).await?;
            run_news(dir, max_articles).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

#[instrument(level = "info")]
async fn run_news(dir: &str, max_articles: usize) -> Result<(), Box<dyn Error>> {
    if max_articles > MAX_LINKS {
        warn!(
            requested = max_articles,
            cap = MAX_LINKS,
            "Requested more articles than links discovered per run"
        );
    }

    let scraper = PegnScraper::new()?;
    let news = scraper.fetch_latest_news(max_articles).await;

    if news.is_empty() {
        warn!("No news found; nothing written");
        return Ok(());
    }

    let path = json::write_json(&news, dir, json::NEWS_FILE).await?;
    info!(count = news.len(), path = %path.display(), "News extracted and saved");

    for (i, article) in news.iter().take(3).enumerate() {
        info!(
            index = i + 1,
            title = %article.title,
            date = %article.date,
            category = %article.category,
            summary = %truncate_for_log(&article.summary, 100),
            "Preview"
        );
    }
    Ok(())
}

#[instrument(level = "info")]
async fn run_social(dir: &str) -> Result<(), Box<dyn Error>> {
    let report = IbgeFetcher::new()?.generate_social_comparison().await;
    let path = json::write_json(&report, dir, json::SOCIAL_FILE).await?;
    info!(count = report.data.len(), path = %path.display(), "Social report saved");
    Ok(())
}

#[instrument(level = "info")]
async fn run_spending(dir: &str, year: i32) -> Result<(), Box<dyn Error>> {
    let report = SiconfiFetcher::new(year)?.generate_municipal_comparison().await;
    let path = json::write_json(&report, dir, json::SPENDING_FILE).await?;
    info!(count = report.data.len(), path = %path.display(), "Spending report saved");
    Ok(())
}

#[instrument(level = "info")]
async fn run_transparency(dir: &str) -> Result<(), Box<dyn Error>> {
    let report = TransparencyFetcher::new()?.generate_transparency_comparison().await;
    let path = json::write_json(&report, dir, json::TRANSPARENCY_FILE).await?;
    info!(metrics = report.data.len(), path = %path.display(), "Transparency report saved");
    Ok(())
}
