//! Trading date to archive index resolution
//!
//! The SGX derivatives archive names each trading day's files by an integer
//! counter that increments once per weekday. Given one known (date, index)
//! anchor, any other date's index is pure weekday arithmetic - except that the
//! archive occasionally publishes data on a weekend, which permanently shifts
//! every later index by one or two. Those anomalies are compensated by an
//! append-only table of [`OffsetCorrection`] entries supplied as configuration.
//!
//! The resolver performs no I/O and never inspects the archive itself, so it
//! is fully deterministic and testable in isolation.

use crate::ArchiveIndex;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Resolution errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Requested date falls before the range the anchor and corrections define
    #[error("date {0} precedes the earliest entry the archive index covers")]
    BeforeArchiveStart(NaiveDate),
}

/// A known (date, index) reference point for the archive counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexAnchor {
    /// Calendar date of the anchor
    pub date: NaiveDate,
    /// Archive index published for that date
    pub index: ArchiveIndex,
}

impl IndexAnchor {
    /// Create a new anchor.
    pub fn new(date: NaiveDate, index: ArchiveIndex) -> Self {
        Self { date, index }
    }
}

/// A manually supplied index adjustment compensating for archive drift.
///
/// When the archive publishes unexpected weekend data, every index from that
/// point forward shifts. One correction entry records the signed shift and the
/// first date it applies to. The table is append-only configuration; the
/// resolver never mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetCorrection {
    /// First date the adjustment applies to (inclusive)
    pub effective_from: NaiveDate,
    /// Signed index adjustment from that date forward
    pub adjustment: i32,
}

/// Pure calendar/offset calculator mapping trading dates to archive indices.
#[derive(Debug, Clone)]
pub struct IndexResolver {
    anchor: IndexAnchor,
    corrections: Vec<OffsetCorrection>,
}

impl IndexResolver {
    /// Create a resolver from an anchor and an offset-correction table.
    ///
    /// Corrections are sorted by effective date at construction so callers may
    /// supply them in any order.
    pub fn new(anchor: IndexAnchor, mut corrections: Vec<OffsetCorrection>) -> Self {
        corrections.sort_by_key(|c| c.effective_from);
        Self {
            anchor,
            corrections,
        }
    }

    /// Resolve the archive index for a trading date.
    ///
    /// The naive index is the anchor index plus the number of weekdays between
    /// the anchor date and `date` (signed, so earlier dates resolve to smaller
    /// indices; `date == anchor.date` returns the anchor index unmodified).
    /// Weekend calendar days contribute zero. The sum of all corrections whose
    /// effective date is on or before `date` is then applied.
    ///
    /// # Errors
    /// [`ResolveError::BeforeArchiveStart`] if the corrected index would be
    /// negative, i.e. the date precedes the range the table defines.
    pub fn resolve(&self, date: NaiveDate) -> Result<ArchiveIndex, ResolveError> {
        let naive = i64::from(self.anchor.index.0)
            + weekday_ordinal(date)
            - weekday_ordinal(self.anchor.date);

        let correction: i64 = self
            .corrections
            .iter()
            .filter(|c| c.effective_from <= date)
            .map(|c| i64::from(c.adjustment))
            .sum();

        let index = naive + correction;
        if index < 0 {
            return Err(ResolveError::BeforeArchiveStart(date));
        }
        Ok(ArchiveIndex(index as u32))
    }

    /// The anchor this resolver counts from.
    pub fn anchor(&self) -> IndexAnchor {
        self.anchor
    }

    /// The correction table, sorted ascending by effective date.
    pub fn corrections(&self) -> &[OffsetCorrection] {
        &self.corrections
    }
}

/// Count of weekdays from a fixed Monday epoch through `date` inclusive.
///
/// Only differences of this function are meaningful: subtracting two values
/// yields the number of weekdays in the half-open span between the dates.
/// Saturdays and Sundays add nothing, so a weekend date shares its ordinal
/// with the preceding Friday.
fn weekday_ordinal(date: NaiveDate) -> i64 {
    let epoch = NaiveDate::from_ymd_opt(2000, 1, 3).expect("valid epoch date");
    let days = (date - epoch).num_days();
    let full_weeks = days.div_euclid(7);
    let remainder = days.rem_euclid(7); // 0 = Monday .. 6 = Sunday
    full_weeks * 5 + (remainder + 1).min(5)
}
