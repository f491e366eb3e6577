//! Live-mode memoization of answers.
//!
//! An answer stays correct until the next opening or closing, so in live
//! mode the last answer is kept together with the instant it expires. Queries
//! that move forward in time without crossing that instant get the same
//! shared answer back; callers can compare with
//! [`MatchResult::same_answer`] to see that nothing changed.
//!
//! The cache itself is not synchronized. [`VisitingHours`](crate::VisitingHours)
//! keeps it behind a mutex.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::domain::TimeValue;
use crate::query::MatchResult;
use crate::timezone::TimezoneAdapter;

/// The memoized answer and the window it is valid for.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Instant of the query that produced the answer.
    pub last_timestamp: DateTime<Utc>,

    /// First instant at which the answer may no longer hold.
    pub valid_until: DateTime<Utc>,

    /// The shared answer.
    pub last_match: Arc<MatchResult>,
}

impl CacheEntry {
    /// Returns true if a query at `at` can reuse this entry.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.last_timestamp <= at && at < self.valid_until
    }
}

/// Single-entry cache of the last answer.
#[derive(Debug, Default)]
pub struct LiveCache {
    entry: Option<CacheEntry>,
}

impl LiveCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached answer if it is still valid at `at`.
    ///
    /// A query earlier than the one that produced the entry is a miss.
    pub fn get(&self, at: DateTime<Utc>) -> Option<Arc<MatchResult>> {
        let entry = self.entry.as_ref()?;

        if entry.covers(at) {
            Some(entry.last_match.clone())
        } else {
            debug!(%at, valid_until = %entry.valid_until, "live cache miss");
            None
        }
    }

    /// Replace the cached entry.
    pub fn insert(&mut self, at: DateTime<Utc>, valid_until: DateTime<Utc>, answer: Arc<MatchResult>) {
        debug!(%at, %valid_until, open = answer.open, "live cache updated");
        self.entry = Some(CacheEntry {
            last_timestamp: at,
            valid_until,
            last_match: answer,
        });
    }

    /// Returns the current entry.
    pub fn entry(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    /// Drop the current entry.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

/// Returns the wall-clock time at which `answer` stops being valid.
///
/// Open answers expire when the matched interval closes. Closed answers
/// expire at the next opening if one is known, otherwise at midnight.
pub fn boundary_time(answer: &MatchResult) -> TimeValue {
    match (answer.open, answer.matched, answer.soonest) {
        (true, Some(matched), _) => matched.close,
        (false, _, Some(soonest)) => soonest,
        _ => TimeValue::END_OF_DAY,
    }
}

/// Returns the instant at which `answer`, computed at `at`, stops being
/// valid in `zone`.
pub fn valid_until<A: TimezoneAdapter + ?Sized>(
    answer: &MatchResult,
    adapter: &A,
    zone: Tz,
    at: DateTime<Utc>,
) -> DateTime<Utc> {
    boundary_time(answer).to_instant(adapter, zone, at)
}
