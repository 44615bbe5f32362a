//! End-to-end pipeline scenarios with scripted fetchers and an in-memory store
//!
//! These tests exercise the resolve -> retry -> breaker pipeline without any
//! network or filesystem I/O: a scripted [`ArchiveFetcher`] decides per date
//! whether the unit succeeds, and a memory-backed [`UnitStore`] records what
//! would have been persisted.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use sgx_derivatives_downloader::fetcher::{ArchiveFetcher, FetchError, FetchResult};
use sgx_derivatives_downloader::output::{OutputResult, UnitStore};
use sgx_derivatives_downloader::pipeline::{Pipeline, RunStatus};
use sgx_derivatives_downloader::resolver::{IndexAnchor, IndexResolver};
use sgx_derivatives_downloader::retry::RetryPolicy;
use sgx_derivatives_downloader::{ArchiveIndex, FailureKind, FetchedFile, FileUnit};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A retry policy with the default 3-attempt budget but no waiting.
fn fast_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::ZERO, Duration::ZERO)
}

/// `count` consecutive weekdays starting from a weekday.
fn weekdays_from(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    use chrono::Datelike;
    start
        .iter_days()
        .filter(|d| d.weekday().number_from_monday() <= 5)
        .take(count)
        .collect()
}

/// Fetcher that fails configured dates with a configured kind and records
/// every request it receives.
#[derive(Default)]
struct ScriptedFetcher {
    failing: HashMap<NaiveDate, FailureKind>,
    requests: Mutex<Vec<(NaiveDate, ArchiveIndex)>>,
}

impl ScriptedFetcher {
    fn failing_on(dates: &[NaiveDate], kind: FailureKind) -> Self {
        Self {
            failing: dates.iter().map(|d| (*d, kind)).collect(),
            ..Self::default()
        }
    }

    fn requested_dates(&self) -> Vec<NaiveDate> {
        self.requests.lock().unwrap().iter().map(|r| r.0).collect()
    }

    fn requests(&self) -> Vec<(NaiveDate, ArchiveIndex)> {
        self.requests.lock().unwrap().clone()
    }
}

fn error_for(kind: FailureKind, date: NaiveDate) -> FetchError {
    match kind {
        FailureKind::NotFound => FetchError::NotFound("WEBPXTICK_DT.zip".to_string()),
        FailureKind::DateMismatch => FetchError::DateMismatch {
            file: "TC.txt".to_string(),
            actual: date.pred_opt().unwrap(),
            requested: date,
        },
        FailureKind::Network => FetchError::Network("connection timed out".to_string()),
        _ => FetchError::Unknown("scripted failure".to_string()),
    }
}

#[async_trait]
impl ArchiveFetcher for ScriptedFetcher {
    async fn fetch_unit(&self, date: NaiveDate, index: ArchiveIndex) -> FetchResult<FileUnit> {
        self.requests.lock().unwrap().push((date, index));
        match self.failing.get(&date) {
            Some(kind) => Err(error_for(*kind, date)),
            None => Ok(FileUnit {
                date,
                index,
                files: vec![FetchedFile {
                    name: "TC.txt".to_string(),
                    contents: Bytes::from_static(b"contract data"),
                }],
            }),
        }
    }
}

#[derive(Default)]
struct MemoryStore {
    units: Mutex<Vec<FileUnit>>,
}

impl MemoryStore {
    fn persisted_dates(&self) -> Vec<NaiveDate> {
        self.units.lock().unwrap().iter().map(|u| u.date).collect()
    }
}

impl UnitStore for MemoryStore {
    fn persist(&self, unit: &FileUnit) -> OutputResult<()> {
        self.units.lock().unwrap().push(unit.clone());
        Ok(())
    }
}

/// Anchor used throughout: 2025-01-02 (Thursday) published under index 1.
fn test_resolver() -> IndexResolver {
    IndexResolver::new(
        IndexAnchor::new(date(2025, 1, 2), ArchiveIndex(1)),
        Vec::new(),
    )
}

#[tokio::test]
async fn test_scenario_single_date_success() {
    // 2025-01-09 is five weekdays after the anchor, so it resolves to index 6
    let pipeline = Pipeline::new(
        test_resolver(),
        ScriptedFetcher::default(),
        MemoryStore::default(),
    )
    .with_retry_policy(fast_policy());

    let result = pipeline.run(&[date(2025, 1, 9)]).await;

    assert_eq!(result.status, RunStatus::Completed);
    assert!(result.failed_dates().is_empty());
    assert_eq!(result.outcomes.len(), 1);
    assert!(result.outcomes[0].is_success());
    assert_eq!(result.outcomes[0].index, Some(ArchiveIndex(6)));
    assert_eq!(result.outcomes[0].attempts.len(), 1);
}

#[tokio::test]
async fn test_scenario_single_date_resolves_expected_index() {
    let fetcher = ScriptedFetcher::default();
    let store = MemoryStore::default();
    let requested = date(2025, 1, 9);

    let result = {
        let pipeline =
            Pipeline::new(test_resolver(), &fetcher, &store).with_retry_policy(fast_policy());
        pipeline.run(&[requested]).await
    };

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.succeeded_count(), 1);
    assert_eq!(fetcher.requests(), vec![(requested, ArchiveIndex(6))]);
    assert_eq!(store.persisted_dates(), vec![requested]);
}

#[tokio::test]
async fn test_scenario_sustained_failure_trips_breaker() {
    // 13 trading dates; dates 3 through 12 fail every attempt. The breaker
    // reaches 10 consecutive failures when date 12's outcome is recorded, so
    // date 13 must never be attempted.
    let dates = weekdays_from(date(2025, 1, 6), 13);
    let failing = &dates[2..12];
    let fetcher = ScriptedFetcher::failing_on(failing, FailureKind::Network);
    let store = MemoryStore::default();

    let pipeline = Pipeline::new(test_resolver(), fetcher, store)
        .with_retry_policy(fast_policy())
        .with_breaker_threshold(10);

    let result = pipeline.run(&dates).await;

    assert_eq!(result.status, RunStatus::HaltedByBreaker);
    assert_eq!(result.outcomes.len(), 12);
    assert_eq!(result.failed_dates(), failing.to_vec());
    assert_eq!(result.succeeded_count(), 2);
}

#[tokio::test]
async fn test_breaker_halt_skips_remaining_dates() {
    let dates = weekdays_from(date(2025, 1, 6), 13);
    let fetcher = ScriptedFetcher::failing_on(&dates[2..12], FailureKind::Network);
    let store = MemoryStore::default();
    let last_date = dates[12];

    let result = {
        let pipeline = Pipeline::new(test_resolver(), &fetcher, &store)
            .with_retry_policy(fast_policy())
            .with_breaker_threshold(10);
        pipeline.run(&dates).await
    };

    assert_eq!(result.status, RunStatus::HaltedByBreaker);
    assert!(
        !fetcher.requested_dates().contains(&last_date),
        "date beyond the breaker trip must never be attempted"
    );
    // 2 successes at one attempt each, 10 failures at three attempts each
    assert_eq!(fetcher.requests().len(), 2 + 10 * 3);
    assert_eq!(store.persisted_dates(), dates[0..2].to_vec());
}

#[tokio::test]
async fn test_scenario_date_mismatch_counts_like_any_failure() {
    // A date failing with DateMismatch on all attempts is a terminal failure
    // of that kind, counted by the breaker identically to a network failure
    let mismatching = date(2025, 1, 9);
    let fetcher = ScriptedFetcher::failing_on(&[mismatching], FailureKind::DateMismatch);
    let store = MemoryStore::default();

    let result = {
        let pipeline = Pipeline::new(test_resolver(), fetcher, store)
            .with_retry_policy(fast_policy())
            .with_breaker_threshold(1);
        pipeline.run(&[mismatching]).await
    };

    assert_eq!(result.status, RunStatus::HaltedByBreaker);
    let failure = result.outcomes[0].result.unwrap_err();
    assert_eq!(failure.kind, FailureKind::DateMismatch);
    assert_eq!(failure.attempts, 3);
}

#[tokio::test]
async fn test_failed_unit_persists_nothing() {
    let failing = date(2025, 1, 9);
    let fetcher = ScriptedFetcher::failing_on(&[failing], FailureKind::NotFound);
    let store = MemoryStore::default();

    let result = {
        let pipeline =
            Pipeline::new(test_resolver(), fetcher, &store).with_retry_policy(fast_policy());
        pipeline.run(&[failing, date(2025, 1, 10)]).await
    };

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.failed_dates(), vec![failing]);
    // Only the succeeding date reached the store
    assert_eq!(store.persisted_dates(), vec![date(2025, 1, 10)]);
}

#[tokio::test]
async fn test_resolution_failure_counts_without_retries() {
    // Dates before the archive start cannot be fetched at all; they count as
    // terminal failures without consuming any attempts
    let resolver = IndexResolver::new(
        IndexAnchor::new(date(2025, 1, 6), ArchiveIndex(0)),
        Vec::new(),
    );
    let fetcher = ScriptedFetcher::default();
    let store = MemoryStore::default();
    let too_early = [date(2024, 12, 30), date(2024, 12, 31)];

    let result = {
        let pipeline = Pipeline::new(resolver, &fetcher, &store)
            .with_retry_policy(fast_policy())
            .with_breaker_threshold(2);
        pipeline.run(&too_early).await
    };

    assert_eq!(result.status, RunStatus::HaltedByBreaker);
    assert!(fetcher.requested_dates().is_empty());
    for outcome in &result.outcomes {
        assert!(outcome.attempts.is_empty());
        assert_eq!(outcome.index, None);
        let failure = outcome.result.unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidDate);
        assert_eq!(failure.attempts, 0);
    }
}

#[tokio::test]
async fn test_isolated_failures_do_not_halt_the_run() {
    let dates = weekdays_from(date(2025, 1, 6), 8);
    // Alternating failures never build a streak anywhere near the threshold
    let failing: Vec<NaiveDate> = dates.iter().copied().step_by(2).collect();
    let fetcher = ScriptedFetcher::failing_on(&failing, FailureKind::Network);
    let store = MemoryStore::default();

    let result = {
        let pipeline = Pipeline::new(test_resolver(), fetcher, store)
            .with_retry_policy(fast_policy())
            .with_breaker_threshold(10);
        pipeline.run(&dates).await
    };

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.outcomes.len(), 8);
    assert_eq!(result.failed_dates(), failing);
}
