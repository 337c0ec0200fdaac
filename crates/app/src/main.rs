use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use expensetrend_core::AppConfig;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "expensetrend", version, about = "Credit card statement downloader and expense tracker")]
struct Cli {
    /// Config file (default: $EXPENSETREND_CONFIG, then the per-user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List supported banks
    Banks,

    /// Download statement PDFs from Gmail
    Download {
        /// Bank to search (default: all supported banks)
        #[arg(long)]
        bank: Option<String>,

        /// Only statements received on or after this date
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_day)]
        since: Option<NaiveDate>,

        /// Only statements received before this date
        #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_day)]
        to: Option<NaiveDate>,

        /// Maximum number of emails per bank
        #[arg(long, default_value_t = 100)]
        max_results: usize,

        /// Show what would be downloaded without downloading
        #[arg(long)]
        dry_run: bool,

        /// Parse downloaded statements into the database
        #[arg(long)]
        parse: bool,

        /// Delete all stored transactions first (with --parse)
        #[arg(long)]
        flush: bool,
    },

    /// Parse statement PDFs already on disk
    Parse {
        /// Bank to parse (default: all supported banks)
        #[arg(long)]
        bank: Option<String>,

        /// A single statement file
        #[arg(long, value_name = "PATH")]
        pdf: Option<PathBuf>,

        /// Delete all stored transactions first
        #[arg(long)]
        flush: bool,
    },

    /// Rewrite every stored date in DD/MM/YYYY form
    NormalizeDates,
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Banks => commands::list_banks(),
        Command::Download { bank, since, to, max_results, dry_run, parse, flush } => {
            let opts = commands::DownloadOptions { bank, since, to, max_results, dry_run, parse, flush };
            commands::download(&config, opts).await
        }
        Command::Parse { bank, pdf, flush } => commands::parse(&config, bank, pdf, flush).await,
        Command::NormalizeDates => commands::normalize_dates(&config).await,
    }
}
