//! Per-date download orchestration
//!
//! The pipeline walks the supplied trading dates strictly in order. Each date
//! is resolved to its archive index, fetched under the retry controller, and
//! its terminal outcome fed to the circuit breaker. A tripped breaker stops
//! the run immediately; remaining dates are never attempted and never
//! recorded. The run ends with a [`RunResult`] whose failed-dates subsequence
//! is the input to manual recovery.
//!
//! Execution is deliberately sequential: consecutive-failure counting only
//! makes sense over a total order of date outcomes.

use crate::breaker::CircuitBreaker;
use crate::config::BREAKER_THRESHOLD;
use crate::fetcher::ArchiveFetcher;
use crate::output::UnitStore;
use crate::resolver::IndexResolver;
use crate::retry::{fetch_with_retry, AttemptRecord, RetryPolicy, TerminalFailure};
use crate::{ArchiveIndex, FailureKind};
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every supplied date was processed
    Completed,
    /// The breaker tripped and remaining dates were not attempted
    HaltedByBreaker,
}

/// Final outcome of one trading date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateOutcome {
    /// The trading date
    pub date: NaiveDate,
    /// Resolved archive index, if resolution succeeded
    pub index: Option<ArchiveIndex>,
    /// Per-attempt records (empty when resolution itself failed)
    pub attempts: Vec<AttemptRecord>,
    /// Success, or the terminal failure after all attempts
    pub result: Result<(), TerminalFailure>,
}

impl DateOutcome {
    /// Whether the date's unit was downloaded and persisted.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ordered record of one whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// How the run ended
    pub status: RunStatus,
    /// Per-date outcomes in processing order (attempted dates only)
    pub outcomes: Vec<DateOutcome>,
}

impl RunResult {
    /// The ordered subsequence of dates that ended in terminal failure.
    ///
    /// This list is the sole input to manual recovery; dates the breaker cut
    /// off before they were attempted are not in it.
    pub fn failed_dates(&self) -> Vec<NaiveDate> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.date)
            .collect()
    }

    /// Number of dates whose unit was downloaded and persisted.
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }
}

/// Sequential per-date download pipeline.
///
/// Owns the resolver, fetcher, store, retry policy, and breaker threshold;
/// breaker state itself lives inside each [`run`](Pipeline::run) call.
pub struct Pipeline<F, S> {
    resolver: IndexResolver,
    fetcher: F,
    store: S,
    retry_policy: RetryPolicy,
    breaker_threshold: u32,
}

impl<F, S> Pipeline<F, S>
where
    F: ArchiveFetcher,
    S: UnitStore,
{
    /// Create a pipeline with the default retry policy and breaker threshold.
    pub fn new(resolver: IndexResolver, fetcher: F, store: S) -> Self {
        Self {
            resolver,
            fetcher,
            store,
            retry_policy: RetryPolicy::default(),
            breaker_threshold: BREAKER_THRESHOLD,
        }
    }

    /// Override the retry policy.
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Override the breaker trip threshold.
    pub fn with_breaker_threshold(mut self, threshold: u32) -> Self {
        self.breaker_threshold = threshold;
        self
    }

    /// Process the supplied chronologically ordered trading dates.
    ///
    /// Each date runs to its own natural success or terminal failure before
    /// the breaker is consulted, so no unit is ever cancelled mid-flight.
    pub async fn run(&self, dates: &[NaiveDate]) -> RunResult {
        let mut breaker = CircuitBreaker::new(self.breaker_threshold);
        let mut outcomes = Vec::with_capacity(dates.len());
        let mut status = RunStatus::Completed;

        for &date in dates {
            let outcome = self.process_date(date).await;
            let success = outcome.is_success();
            outcomes.push(outcome);

            breaker.record_outcome(success);
            if breaker.is_tripped() {
                error!(
                    "{} consecutive failed dates, circuit breaker tripped - halting run",
                    breaker.consecutive_failures()
                );
                status = RunStatus::HaltedByBreaker;
                break;
            }
        }

        let result = RunResult { status, outcomes };
        self.log_summary(&result);
        result
    }

    /// Resolve and fetch one date, returning its terminal outcome.
    async fn process_date(&self, date: NaiveDate) -> DateOutcome {
        let index = match self.resolver.resolve(date) {
            Ok(index) => index,
            Err(e) => {
                // No retry can fix a date the index table does not cover
                warn!("skipping fetch for {date}: {e}");
                return DateOutcome {
                    date,
                    index: None,
                    attempts: Vec::new(),
                    result: Err(TerminalFailure {
                        kind: FailureKind::InvalidDate,
                        attempts: 0,
                    }),
                };
            }
        };
        debug!("resolved {date} to archive index {index}");

        let report =
            fetch_with_retry(&self.fetcher, &self.store, date, index, &self.retry_policy).await;

        if let Err(failure) = &report.result {
            error!("giving up on {date}: {failure}");
        }

        DateOutcome {
            date,
            index: Some(index),
            attempts: report.attempts,
            result: report.result.map(|_| ()),
        }
    }

    fn log_summary(&self, result: &RunResult) {
        match result.status {
            RunStatus::Completed => info!(
                "run completed: {} of {} dates downloaded",
                result.succeeded_count(),
                result.outcomes.len()
            ),
            RunStatus::HaltedByBreaker => error!(
                "run halted by circuit breaker after {} dates",
                result.outcomes.len()
            ),
        }

        let failed = result.failed_dates();
        if !failed.is_empty() {
            warn!("dates requiring manual recovery: {failed:?}");
        }
    }
}
