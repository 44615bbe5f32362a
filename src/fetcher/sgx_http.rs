//! SGX archive HTTP fetcher
//!
//! Retrieves the four files of one trading date from the SGX derivatives
//! archive. The archive answers requests for missing indices with a redirect
//! to an error page rather than a 404, and embeds the trading date in the
//! `Content-Disposition` file name of the data files, which is how index
//! drift (the weekend-offset anomaly) is detected.
//!
//! Transport and validation are separate stages: [`SgxHttpFetcher`] first
//! transfers all four raw responses, then the unit is assembled and
//! validated as a whole - any invalid member discards the entire unit.

use crate::config::HTTP_TIMEOUT_SECS;
use crate::fetcher::{ArchiveFetcher, FetchError, FetchResult};
use crate::naming::NamingConvention;
use crate::{ArchiveIndex, FetchedFile, FileUnit};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Datelike, NaiveDate};
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info};

/// Marker in the final URL when the archive redirects a missing file.
const ERROR_PAGE_MARKER: &str = "CustomErrorPage";

/// One file's transport outcome, prior to unit validation.
#[derive(Debug, Clone)]
struct RawFileResponse {
    file_name: String,
    status: StatusCode,
    final_url: String,
    content_disposition: Option<String>,
    body: Bytes,
}

/// HTTP fetcher for the SGX derivatives archive.
pub struct SgxHttpFetcher {
    client: Client,
    naming: NamingConvention,
}

impl SgxHttpFetcher {
    /// Create a fetcher for the given naming convention.
    ///
    /// Requests carry a fixed timeout so a stalled connection surfaces as a
    /// network failure instead of suspending the run.
    pub fn new(naming: NamingConvention) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetchError::Unknown(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, naming })
    }

    /// Transfer one file of the unit, without validating it.
    async fn transfer_file(
        &self,
        index: ArchiveIndex,
        file_name: &str,
    ) -> FetchResult<RawFileResponse> {
        let url = self.naming.url(index, file_name);
        debug!("requesting {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        let final_url = response.url().as_str().to_string();
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(RawFileResponse {
            file_name: file_name.to_string(),
            status,
            final_url,
            content_disposition,
            body,
        })
    }
}

#[async_trait]
impl ArchiveFetcher for SgxHttpFetcher {
    async fn fetch_unit(&self, date: NaiveDate, index: ArchiveIndex) -> FetchResult<FileUnit> {
        info!(
            "downloading files for {date} ({}) under index {index}",
            date.weekday()
        );

        let mut responses = Vec::with_capacity(self.naming.file_names.len());
        for file_name in &self.naming.file_names {
            responses.push(self.transfer_file(index, file_name).await?);
        }

        let unit = assemble_unit(&self.naming, date, index, responses)?;
        info!("all {} files retrieved for {date}", unit.files.len());
        Ok(unit)
    }
}

/// Validate all raw responses and assemble the atomic unit.
///
/// Any invalid member fails the whole unit; the files validated before it
/// are dropped with the error, so no partial unit can escape this function.
fn assemble_unit(
    naming: &NamingConvention,
    date: NaiveDate,
    index: ArchiveIndex,
    responses: Vec<RawFileResponse>,
) -> FetchResult<FileUnit> {
    let mut files = Vec::with_capacity(responses.len());
    for raw in responses {
        files.push(validate_file(naming, date, raw)?);
    }
    Ok(FileUnit { date, index, files })
}

/// Validate one raw response against the requested date.
fn validate_file(
    naming: &NamingConvention,
    date: NaiveDate,
    raw: RawFileResponse,
) -> FetchResult<FetchedFile> {
    // Missing files come back as a redirect to an error page
    if raw.final_url.contains(ERROR_PAGE_MARKER) {
        return Err(FetchError::NotFound(raw.file_name));
    }

    if raw.status == StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound(raw.file_name));
    }
    if raw.status.is_server_error() {
        return Err(FetchError::Network(format!(
            "server error {} for {}",
            raw.status, raw.file_name
        )));
    }
    if !raw.status.is_success() {
        return Err(FetchError::Unknown(format!(
            "unexpected status {} for {}",
            raw.status, raw.file_name
        )));
    }

    if naming.has_date_marker(&raw.file_name) {
        let disposition = raw.content_disposition.as_deref().unwrap_or_default();
        match embedded_date(disposition) {
            Some(actual) if actual == date => {
                debug!("{} date marker matches {date}", raw.file_name);
            }
            Some(actual) => {
                return Err(FetchError::DateMismatch {
                    file: raw.file_name,
                    actual,
                    requested: date,
                });
            }
            None => {
                return Err(FetchError::Unknown(format!(
                    "no date marker in Content-Disposition for {}: {disposition:?}",
                    raw.file_name
                )));
            }
        }
    }

    Ok(FetchedFile {
        name: raw.file_name,
        contents: raw.body,
    })
}

/// Extract the first valid YYYYMMDD run from a `Content-Disposition` value.
///
/// File names look like `WEBPXTICK_DT-20250109.zip` or `TC_20250109.txt`;
/// the first eight-digit run that parses as a calendar date wins.
fn embedded_date(disposition: &str) -> Option<NaiveDate> {
    let bytes = disposition.as_bytes();
    for start in 0..bytes.len().saturating_sub(7) {
        let window = &bytes[start..start + 8];
        if !window.iter().all(u8::is_ascii_digit) {
            continue;
        }
        // ASCII digits only, so the slice is valid UTF-8
        if let Some(candidate) = disposition.get(start..start + 8) {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, "%Y%m%d") {
                return Some(date);
            }
        }
    }
    None
}
