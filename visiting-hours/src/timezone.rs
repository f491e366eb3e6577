//! Conversion between instants and wall-clock times in IANA zones.
//!
//! Schedules are written in the wall-clock time of the venue's zone, which
//! may differ from the zone of the caller. The [`TimezoneAdapter`] trait is
//! the seam between the evaluation core and a zone database; the default
//! implementation is backed by `chrono-tz`.

use std::time::Duration;

use chrono::{
    DateTime, Datelike, Duration as ChronoDuration, LocalResult, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;
use moka::sync::Cache;

use crate::domain::is_leap_year;

/// Error returned when a zone name is not a known IANA zone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time zone: {0}")]
pub struct UnknownZone(pub String);

/// An instant broken down into wall-clock fields in some zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonedParts {
    pub year: i32,
    /// One-based month (1-12)
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub weekday: Weekday,
}

impl ZonedParts {
    /// Returns true if the local date falls in a leap year.
    pub fn is_leap_year(&self) -> bool {
        is_leap_year(self.year)
    }
}

/// Wall-clock ⇄ instant conversion for named zones.
pub trait TimezoneAdapter {
    /// Resolve a zone name; `None` means UTC.
    fn resolve(&self, zone: Option<&str>) -> Result<Tz, UnknownZone>;

    /// Express `instant` as wall-clock fields in `zone`.
    fn offset_instant(&self, instant: DateTime<Utc>, zone: Tz) -> ZonedParts;

    /// Returns the first instant at or after `reference` whose wall-clock
    /// time in `zone` is `hours:minutes`.
    ///
    /// `hours` may be 24 (with `minutes` 0), meaning the next local midnight.
    fn next_occurrence(
        &self,
        hours: u32,
        minutes: u32,
        zone: Tz,
        reference: DateTime<Utc>,
    ) -> DateTime<Utc>;
}

/// Configuration for the zone cache.
#[derive(Debug, Clone)]
pub struct ZoneCacheConfig {
    /// Maximum number of resolved zones kept.
    pub max_capacity: u64,

    /// How long a resolved zone stays cached after its last use.
    pub time_to_idle: Duration,
}

impl Default for ZoneCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 64,
            time_to_idle: Duration::from_secs(60 * 60),
        }
    }
}

/// [`TimezoneAdapter`] backed by the `chrono-tz` zone database.
///
/// Resolved zones are memoized in a cache owned by the adapter.
#[derive(Clone)]
pub struct ChronoTzAdapter {
    zones: Cache<String, Tz>,
}

impl ChronoTzAdapter {
    /// Create an adapter with the default cache configuration.
    pub fn new() -> Self {
        Self::with_config(&ZoneCacheConfig::default())
    }

    /// Create an adapter with the given cache configuration.
    pub fn with_config(config: &ZoneCacheConfig) -> Self {
        let zones = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_idle(config.time_to_idle)
            .build();

        Self { zones }
    }

    /// Number of zones currently cached.
    pub fn cached_zone_count(&self) -> u64 {
        self.zones.run_pending_tasks();
        self.zones.entry_count()
    }
}

impl Default for ChronoTzAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChronoTzAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChronoTzAdapter").finish_non_exhaustive()
    }
}

impl TimezoneAdapter for ChronoTzAdapter {
    fn resolve(&self, zone: Option<&str>) -> Result<Tz, UnknownZone> {
        let Some(name) = zone else {
            return Ok(Tz::UTC);
        };

        if let Some(tz) = self.zones.get(name) {
            return Ok(tz);
        }

        let tz: Tz = name.parse().map_err(|_| UnknownZone(name.to_string()))?;
        self.zones.insert(name.to_string(), tz);
        Ok(tz)
    }

    fn offset_instant(&self, instant: DateTime<Utc>, zone: Tz) -> ZonedParts {
        let local = instant.with_timezone(&zone);

        ZonedParts {
            year: local.year(),
            month: local.month(),
            day: local.day(),
            hour: local.hour(),
            minute: local.minute(),
            second: local.second(),
            weekday: local.weekday(),
        }
    }

    fn next_occurrence(
        &self,
        hours: u32,
        minutes: u32,
        zone: Tz,
        reference: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let today = reference.with_timezone(&zone).date_naive();
        let offset = ChronoDuration::minutes(i64::from(hours * 60 + minutes));

        // A repeated or skipped hour can put today's candidate before the
        // reference, so tomorrow's (and the day after, for 24:00) are kept.
        (0..=2)
            .map(|days| today.and_time(NaiveTime::MIN) + ChronoDuration::days(days) + offset)
            .flat_map(|local| local_candidates(zone, local))
            .filter(|candidate| *candidate >= reference)
            .min()
            .unwrap_or(reference)
    }
}

/// Every instant at which the wall clock in `zone` reaches `local`.
///
/// One instant normally, two in a repeated hour, and the end of the
/// transition for a time skipped by a gap.
fn local_candidates(zone: Tz, local: NaiveDateTime) -> Vec<DateTime<Utc>> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => vec![dt.with_timezone(&Utc)],
        LocalResult::Ambiguous(first, second) => {
            vec![first.with_timezone(&Utc), second.with_timezone(&Utc)]
        }
        LocalResult::None => vec![gap_transition(zone, local)],
    }
}

/// Resolve a local wall-clock time in `zone` to an instant.
///
/// Ambiguous times (clocks turned back) resolve to the earlier instant.
/// Times inside a gap (clocks turned forward) resolve to the transition
/// itself, the first instant whose wall clock is past them.
pub fn local_to_instant(zone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => gap_transition(zone, local),
    }
}

/// The instant the clocks jump over `local`, which lies inside a gap.
fn gap_transition(zone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    let offset_at = |utc: NaiveDateTime| zone.offset_from_utc_datetime(&utc).fix();
    let before = offset_at(local - ChronoDuration::days(1));
    let after = offset_at(local + ChronoDuration::days(1));

    // Read with the later offset, `local` is before the transition; read
    // with the earlier one it is after. Bisect between the two.
    let mut lo = local - ChronoDuration::seconds(i64::from(after.local_minus_utc()));
    let mut hi = local - ChronoDuration::seconds(i64::from(before.local_minus_utc()));

    while hi - lo > ChronoDuration::seconds(1) {
        let mid = lo + (hi - lo) / 2;
        if offset_at(mid) == before {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    Utc.from_utc_datetime(&hi)
}
