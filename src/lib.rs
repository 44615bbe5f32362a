//! # SGX Derivatives Downloader Library
//!
//! A library for unattended retrieval of the Singapore Exchange (SGX) daily
//! derivatives archive files. The archive indexes files by an incrementing
//! counter rather than by calendar date, so the core of this crate is the
//! deterministic mapping from a trading date to that counter, wrapped in a
//! retry-and-circuit-breaker pipeline that survives multi-day fetch runs.
//!
//! ## Features
//!
//! - **Date-to-index resolution**: pure weekday arithmetic from a known anchor,
//!   with an offset-correction table for dates where the archive silently
//!   shifted (unexpected weekend data)
//! - **Atomic fetch units**: the four files published per trading date are
//!   downloaded and validated as one unit - all four or nothing
//! - **Bounded retry**: exponential backoff with a fixed attempt budget per date
//! - **Circuit breaker**: a run halts after sustained consecutive date failures
//!   instead of hammering an unavailable server
//! - **Structured run results**: every run ends with an ordered list of failed
//!   dates for manual recovery
//!
//! ## Quick Start
//!
//! ```no_run
//! use sgx_derivatives_downloader::config;
//! use sgx_derivatives_downloader::fetcher::sgx_http::SgxHttpFetcher;
//! use sgx_derivatives_downloader::naming::NamingConvention;
//! use sgx_derivatives_downloader::output::store::FsUnitStore;
//! use sgx_derivatives_downloader::pipeline::Pipeline;
//! use sgx_derivatives_downloader::resolver::IndexResolver;
//! use sgx_derivatives_downloader::retry::RetryPolicy;
//! use chrono::NaiveDate;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = IndexResolver::new(config::default_anchor(), Vec::new());
//! let fetcher = SgxHttpFetcher::new(NamingConvention::default())?;
//! let store = FsUnitStore::new("downloads");
//!
//! let pipeline = Pipeline::new(resolver, fetcher, store)
//!     .with_retry_policy(RetryPolicy::default());
//!
//! let dates = vec![NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()];
//! let result = pipeline.run(&dates).await;
//! println!("failed dates: {:?}", result.failed_dates());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`resolver`] - Trading date to archive index resolution
//! - [`naming`] - Archive file-naming convention as injectable configuration
//! - [`fetcher`] - Atomic per-date fetch unit (HTTP and trait seam)
//! - [`retry`] - Bounded retry with backoff around one fetch unit
//! - [`breaker`] - Consecutive-failure circuit breaker
//! - [`pipeline`] - Sequential per-date orchestration and run results
//! - [`output`] - Persistence of validated file units
//! - [`cli`] - Command-line interface and date-range expansion

#![warn(missing_docs)]
#![warn(clippy::all)]

use bytes::Bytes;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Consecutive-failure circuit breaker
pub mod breaker;

/// CLI command implementations
pub mod cli;

/// Retry, breaker, and HTTP configuration constants
pub mod config;

/// Data fetchers
pub mod fetcher;

/// Run-keyed tracing setup
pub mod logging;

/// Archive file-naming convention
pub mod naming;

/// File unit persistence
pub mod output;

/// Per-date download orchestration
pub mod pipeline;

/// Date-to-index resolution
pub mod resolver;

/// Bounded retry with backoff
pub mod retry;

// Re-export commonly used types
pub use breaker::CircuitBreaker;
pub use pipeline::{Pipeline, RunResult, RunStatus};
pub use resolver::{IndexAnchor, IndexResolver, OffsetCorrection};

/// Position of a trading date in the archive's incrementing file counter.
///
/// Derived from an [`IndexResolver`], never stored independently of the date
/// that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchiveIndex(pub u32);

impl std::fmt::Display for ArchiveIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One retrieved archive file, held in memory until the whole unit validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// File name from the naming convention (e.g. "TC.txt")
    pub name: String,
    /// Raw file contents
    pub contents: Bytes,
}

/// The atomic group of four files published for one trading date.
///
/// A `FileUnit` is only constructed once every file has been retrieved and
/// date-validated, so holding one is proof the unit is complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUnit {
    /// Trading date the unit belongs to
    pub date: NaiveDate,
    /// Archive index the unit was fetched under
    pub index: ArchiveIndex,
    /// The retrieved files, in naming-convention order
    pub files: Vec<FetchedFile>,
}

/// Diagnostic classification of a failed attempt or terminal date failure.
///
/// All kinds are treated uniformly by retry and breaker logic; the kind is
/// preserved for logging and the manual-recovery record only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Date outside the range the anchor/correction table defines
    #[serde(rename = "invalid_date")]
    InvalidDate,
    /// One or more files absent on the archive
    #[serde(rename = "not_found")]
    NotFound,
    /// A retrieved file's embedded date disagrees with the requested date
    #[serde(rename = "date_mismatch")]
    DateMismatch,
    /// Connection or timeout failure
    #[serde(rename = "network")]
    Network,
    /// Anything unclassified, including persistence errors
    #[serde(rename = "unknown")]
    Unknown,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::InvalidDate => "invalid date",
            FailureKind::NotFound => "not found",
            FailureKind::DateMismatch => "date mismatch",
            FailureKind::Network => "network error",
            FailureKind::Unknown => "unknown error",
        };
        write!(f, "{s}")
    }
}
