//! Data fetcher implementations
//!
//! A fetcher retrieves the atomic four-file unit for one (date, index) pair.
//! The trait seam exists so the retry controller and pipeline can be exercised
//! with scripted fetchers in tests; production code uses
//! [`sgx_http::SgxHttpFetcher`].

use crate::{FailureKind, FileUnit};
use crate::ArchiveIndex;
use async_trait::async_trait;
use chrono::NaiveDate;

pub mod sgx_http;

/// Fetch errors, mirroring the diagnostic taxonomy in [`FailureKind`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A file in the unit is absent on the archive
    #[error("file not found: {0}")]
    NotFound(String),

    /// A retrieved file's embedded date disagrees with the requested date
    #[error("date mismatch: {file} reports {actual}, requested {requested}")]
    DateMismatch {
        /// File whose marker disagreed
        file: String,
        /// Date embedded in the retrieved file name
        actual: NaiveDate,
        /// Date the unit was requested for
        requested: NaiveDate,
    },

    /// Connection or timeout failure
    #[error("network error: {0}")]
    Network(String),

    /// Anything unclassified
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl FetchError {
    /// Diagnostic classification of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::NotFound(_) => FailureKind::NotFound,
            FetchError::DateMismatch { .. } => FailureKind::DateMismatch,
            FetchError::Network(_) => FailureKind::Network,
            FetchError::Unknown(_) => FailureKind::Unknown,
        }
    }
}

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Retrieves the atomic file unit for one trading date.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Fetch and validate the complete file unit for `date` under `index`.
    ///
    /// The unit is all-or-nothing: any missing file, date mismatch, or
    /// transport failure on any member discards the whole unit and returns
    /// the corresponding error. Implementations must not keep partial
    /// results.
    async fn fetch_unit(&self, date: NaiveDate, index: ArchiveIndex) -> FetchResult<FileUnit>;
}

#[async_trait]
impl<'a, T: ArchiveFetcher + ?Sized> ArchiveFetcher for &'a T {
    async fn fetch_unit(&self, date: NaiveDate, index: ArchiveIndex) -> FetchResult<FileUnit> {
        (**self).fetch_unit(date, index).await
    }
}
