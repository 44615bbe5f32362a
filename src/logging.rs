//! Run-keyed tracing setup
//!
//! One run writes one log file named by its start timestamp
//! (`logs/{YYYYmmdd_HHMMSS}.log`, DEBUG and above) alongside stdout output at
//! INFO unless overridden by `RUST_LOG`. Setting `LOG_FORMAT=json` switches
//! the stdout layer to JSON records.

use chrono::Local;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default stdout filter when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "sgx_derivatives_downloader=info";

/// Initialize tracing with a per-run log file under `log_dir`.
///
/// Returns the path of the created log file, which doubles as the run's log
/// identity.
pub fn init(log_dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir)?;

    let run_key = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = log_dir.join(format!("{run_key}.log"));
    let log_file = Arc::new(File::create(&log_path)?);

    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(log_file)
        .with_filter(LevelFilter::DEBUG);

    if json_format {
        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_filter(stdout_filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(file_layer)
            .with(tracing_subscriber::fmt::layer().with_filter(stdout_filter))
            .init();
    }

    Ok(log_path)
}
