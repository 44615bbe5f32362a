//! CLI error types and conversions

use crate::fetcher::FetchError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetchError),

    /// Corrections file could not be read
    #[error("failed to read corrections file: {0}")]
    CorrectionsIo(#[from] std::io::Error),

    /// Corrections file could not be parsed
    #[error("failed to parse corrections file: {0}")]
    CorrectionsFormat(#[from] serde_json::Error),
}
