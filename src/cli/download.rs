//! Download command implementation
//!
//! Resolves the user-facing flags into the chronological trading-date list
//! the pipeline consumes. Two modes, mutually exclusive: `--today` for the
//! current date only, or `--historical` with one date (single day) or two
//! dates (inclusive range). Weekends inside a range are skipped before the
//! pipeline ever runs; the archive normally has nothing for them, and the
//! rare weekend-with-data anomaly is handled through the offset-correction
//! table instead.

use crate::cli::CliError;
use crate::config;
use crate::fetcher::sgx_http::SgxHttpFetcher;
use crate::naming::NamingConvention;
use crate::output::store::FsUnitStore;
use crate::pipeline::{Pipeline, RunResult, RunStatus};
use crate::resolver::{IndexResolver, OffsetCorrection};
use crate::retry::RetryPolicy;
use chrono::{Datelike, Local, NaiveDate, Weekday};
use clap::{ArgGroup, Parser};
use std::path::{Path, PathBuf};
use tracing::info;

/// SGX derivatives archive downloader CLI
#[derive(Debug, Parser)]
#[command(
    name = "sgx-derivatives-downloader",
    about = "Download daily derivatives files from the SGX archive",
    version
)]
#[command(group(ArgGroup::new("mode").required(true).args(["today", "historical"])))]
pub struct Cli {
    /// Download today's files only
    #[arg(long)]
    pub today: bool,

    /// Download historical files: one date (single day) or two dates
    /// (inclusive range) in YYYY-MM-DD format
    #[arg(long, num_args = 1..=2, value_name = "DATE", value_parser = parse_date)]
    pub historical: Vec<NaiveDate>,

    /// Directory downloaded units are written under
    #[arg(long, default_value = "downloads", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Directory run logs are written under
    #[arg(long, default_value = "logs", value_name = "DIR")]
    pub log_dir: PathBuf,

    /// JSON file of index offset corrections
    #[arg(long, value_name = "FILE")]
    pub corrections: Option<PathBuf>,

    /// Fetch attempts per date before it is recorded as failed
    #[arg(long, default_value_t = config::MAX_ATTEMPTS, value_name = "N")]
    pub max_attempts: u32,

    /// Consecutive failed dates before the run halts
    #[arg(long, default_value_t = config::BREAKER_THRESHOLD, value_name = "N")]
    pub breaker_threshold: u32,

    /// Override the archive base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}

impl Cli {
    /// Expand the mode flags into the chronological trading-date list.
    pub fn trading_dates(&self) -> Result<Vec<NaiveDate>, CliError> {
        let (start, end) = if self.today {
            let today = Local::now().date_naive();
            (today, today)
        } else {
            match self.historical.as_slice() {
                [single] => (*single, *single),
                [start, end] => (*start, *end),
                // clap enforces 1..=2 values and the mode group
                _ => unreachable!("clap enforces --today or 1-2 --historical dates"),
            }
        };

        if start > end {
            return Err(CliError::InvalidArgument(format!(
                "start date {start} must be earlier than or equal to end date {end}"
            )));
        }

        Ok(expand_trading_dates(start, end))
    }

    /// Run the download pipeline for the requested dates.
    pub async fn execute(&self) -> Result<RunResult, CliError> {
        let dates = self.trading_dates()?;
        if dates.is_empty() {
            info!("no trading dates in the requested range, nothing to do");
            return Ok(RunResult {
                status: RunStatus::Completed,
                outcomes: Vec::new(),
            });
        }

        let corrections = match &self.corrections {
            Some(path) => load_corrections(path)?,
            None => Vec::new(),
        };
        if !corrections.is_empty() {
            info!("loaded {} offset correction(s)", corrections.len());
        }

        let resolver = IndexResolver::new(config::default_anchor(), corrections);

        let mut naming = NamingConvention::default();
        if let Some(base_url) = &self.base_url {
            naming = naming.with_base_url(base_url);
        }
        let fetcher = SgxHttpFetcher::new(naming)?;
        let store = FsUnitStore::new(&self.output_dir);

        let pipeline = Pipeline::new(resolver, fetcher, store)
            .with_retry_policy(RetryPolicy::default().with_max_attempts(self.max_attempts))
            .with_breaker_threshold(self.breaker_threshold);

        info!(
            "starting download run for {} trading date(s), {} to {}",
            dates.len(),
            dates[0],
            dates[dates.len() - 1]
        );
        Ok(pipeline.run(&dates).await)
    }
}

/// Parse a YYYY-MM-DD date argument.
fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| format!("'{input}' is not a valid date in YYYY-MM-DD format"))
}

/// Expand an inclusive date range into its weekdays, in order.
fn expand_trading_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| {
            let is_weekend = matches!(d.weekday(), Weekday::Sat | Weekday::Sun);
            if is_weekend {
                info!("skipping weekend date {d}");
            }
            !is_weekend
        })
        .collect()
}

/// Load the offset-correction table from a JSON file.
///
/// Format: `[{"effective_from": "2025-03-10", "adjustment": 1}]`
fn load_corrections(path: &Path) -> Result<Vec<OffsetCorrection>, CliError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
