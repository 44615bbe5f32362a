//! Bounded retry with backoff around one fetch unit
//!
//! Wraps a single date's fetch-and-persist in up to [`RetryPolicy::max_attempts`]
//! tries, sleeping an increasing backoff between attempts. The controller keeps
//! no state across invocations; everything it learns about a date is returned
//! in the [`RetryReport`] for the orchestrator to record.
//!
//! All failure kinds are retried uniformly. Differentiating policy by kind
//! (e.g. failing fast on a missing file) is a deliberate non-feature for now;
//! the kind is preserved for diagnostics only.

use crate::config::{INITIAL_BACKOFF_MS, MAX_ATTEMPTS, MAX_BACKOFF_MS};
use crate::fetcher::ArchiveFetcher;
use crate::output::UnitStore;
use crate::{ArchiveIndex, FailureKind};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Attempt budget and backoff schedule for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per date, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_backoff: Duration,
    /// Cap on the doubling backoff
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with an explicit schedule.
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
        }
    }

    /// Keep the default schedule but change the attempt budget.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Backoff delay after the given failed attempt (1-based).
    ///
    /// Doubles from the initial delay and is capped, so the schedule is
    /// non-decreasing across attempts.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32);
        let delay = self
            .initial_backoff
            .saturating_mul(2u32.saturating_pow(exponent));
        delay.min(self.max_backoff)
    }
}

/// One fetch try for one trading date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Attempt number, starting at 1
    pub attempt: u32,
    /// `None` on success, otherwise the failure classification
    pub failure: Option<FailureKind>,
}

impl AttemptRecord {
    /// Whether this attempt succeeded.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// A date outcome after all retry attempts were exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{kind} after {attempts} attempts")]
pub struct TerminalFailure {
    /// Last observed failure kind
    pub kind: FailureKind,
    /// Number of attempts made
    pub attempts: u32,
}

/// Everything the retry controller learned about one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryReport {
    /// Per-attempt records in order
    pub attempts: Vec<AttemptRecord>,
    /// `Ok(n)` if attempt `n` succeeded, otherwise the terminal failure
    pub result: Result<u32, TerminalFailure>,
}

/// Fetch and persist one date's unit, retrying per `policy`.
///
/// The persisted unit is part of the attempt: a persistence error counts as a
/// failed attempt of kind [`FailureKind::Unknown`] and is retried like any
/// fetch failure. Success on any attempt short-circuits the remaining budget.
pub async fn fetch_with_retry<F, S>(
    fetcher: &F,
    store: &S,
    date: NaiveDate,
    index: ArchiveIndex,
    policy: &RetryPolicy,
) -> RetryReport
where
    F: ArchiveFetcher + ?Sized,
    S: UnitStore + ?Sized,
{
    let mut attempts = Vec::with_capacity(policy.max_attempts as usize);
    let mut last_kind = FailureKind::Unknown;

    for attempt in 1..=policy.max_attempts {
        let failure = match fetcher.fetch_unit(date, index).await {
            Ok(unit) => match store.persist(&unit) {
                Ok(()) => None,
                Err(e) => {
                    warn!(
                        "attempt {attempt}/{}: unit for {date} fetched but not persisted: {e}",
                        policy.max_attempts
                    );
                    Some(FailureKind::Unknown)
                }
            },
            Err(e) => {
                warn!("attempt {attempt}/{}: {e}", policy.max_attempts);
                Some(e.kind())
            }
        };

        attempts.push(AttemptRecord { attempt, failure });

        match failure {
            None => {
                info!("unit for {date} downloaded on attempt {attempt}");
                return RetryReport {
                    attempts,
                    result: Ok(attempt),
                };
            }
            Some(kind) => {
                last_kind = kind;
                if attempt < policy.max_attempts {
                    let delay = policy.backoff(attempt);
                    debug!("retrying {date} after {delay:?}");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    RetryReport {
        attempts,
        result: Err(TerminalFailure {
            kind: last_kind,
            attempts: policy.max_attempts,
        }),
    }
}
