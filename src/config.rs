//! Download configuration constants

use crate::resolver::IndexAnchor;
use crate::ArchiveIndex;
use chrono::NaiveDate;

/// Maximum number of fetch attempts per trading date.
/// 3 attempts recovers from transient archive glitches without stalling a
/// multi-day run on a date that is genuinely unavailable.
pub const MAX_ATTEMPTS: u32 = 3;

/// Initial backoff delay in milliseconds.
/// The first retry waits 2 seconds, matching the archive's observed recovery
/// time for momentary errors.
pub const INITIAL_BACKOFF_MS: u64 = 2000;

/// Maximum backoff delay in milliseconds.
/// 30 seconds caps exponential backoff so a failing date costs at most about
/// a minute of waiting before it is recorded and the run moves on.
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Consecutive date-level failures before the circuit breaker trips.
/// 10 failed trading dates in a row means systemic unavailability rather than
/// isolated data gaps, so the run stops instead of hammering the server.
pub const BREAKER_THRESHOLD: u32 = 10;

/// Per-request HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Known (date, index) reference point for the SGX derivatives archive.
///
/// 2025-01-06 (a Monday) is published under index 5849. Update only if SGX
/// renumbers the archive wholesale; per-date drift belongs in the offset
/// correction table instead.
pub fn default_anchor() -> IndexAnchor {
    let date = NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid anchor date");
    IndexAnchor::new(date, ArchiveIndex(5849))
}
