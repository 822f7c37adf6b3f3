//! Command-line interface definitions.
//!
//! One subcommand per report, plus `all` to produce every report in a
//! single run.

use crate::fetchers::siconfi::DEFAULT_YEAR;
use crate::scrapers::pegn::DEFAULT_MAX_ARTICLES;
use clap::{Parser, Subcommand};

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Scrape the latest entrepreneurship news
/// painel_transparencia -j ./json news --max-articles 10
///
/// # SICONFI spending for a given year
/// painel_transparencia -j ./json spending --year 2022
///
/// # Everything
/// painel_transparencia -j ./json all
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output directory for the JSON files
    #[arg(short, long, default_value = ".")]
    pub json_output_dir: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Scrape entrepreneurship news from G1 PEGN
    News {
        /// Maximum number of articles to process (at most 20 are discovered)
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_ARTICLES)]
        max_articles: usize,
    },
    /// IBGE social indicators ranked by GDP per capita
    Social,
    /// SICONFI health and education spending ranked by total
    Spending {
        /// Fiscal year to request
        #[arg(short, long, default_value_t = DEFAULT_YEAR)]
        year: i32,
    },
    /// Transparency comparison for Monte Santo
    Transparency,
    /// Run every report
    All {
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_ARTICLES)]
        max_articles: usize,
        #[arg(short, long, default_value_t = DEFAULT_YEAR)]
        year: i32,
    },
}
