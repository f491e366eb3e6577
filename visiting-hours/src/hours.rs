//! The public entry point: a configured venue schedule.

use std::sync::{Arc, Mutex, PoisonError};

use chrono_tz::Tz;
use tracing::{debug, trace};

use crate::config::VisitingHoursConfig;
use crate::domain::{ConfigError, TimeValue};
use crate::index::{HoursIndex, IndexedDay};
use crate::input::{DateInput, QueryInput};
use crate::live::{LiveCache, valid_until};
use crate::query::{HourRange, MatchResult, Precedence};
use crate::timezone::{ChronoTzAdapter, TimezoneAdapter, UnknownZone};

/// Error from a schedule query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// The query named a zone the adapter does not know
    #[error(transparent)]
    UnknownZone(#[from] UnknownZone),
}

/// A venue's opening schedule, ready to answer queries.
///
/// The index is immutable after construction. In live mode the last answer
/// is memoized behind a mutex, so concurrent callers are serialized on that
/// lock for the duration of a query.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc, Weekday};
/// use visiting_hours::{RawDay, VisitingHours, VisitingHoursConfig, WeeklyConfig};
///
/// let config = VisitingHoursConfig::new().with_regular(
///     WeeklyConfig::new().with_day(Weekday::Mon, RawDay::open(&[("08:00", "12:00")])),
/// );
/// let hours = VisitingHours::new(config).unwrap();
///
/// // Monday 13 July 2020.
/// let at = Utc.with_ymd_and_hms(2020, 7, 13, 11, 15, 0).unwrap();
/// assert!(hours.is_open(at).unwrap().open);
/// ```
pub struct VisitingHours<A = ChronoTzAdapter> {
    index: HoursIndex,
    zone: Option<String>,
    live: bool,
    cache: Mutex<LiveCache>,
    adapter: A,
}

impl VisitingHours<ChronoTzAdapter> {
    /// Build from a configuration using the `chrono-tz` zone database.
    pub fn new(config: VisitingHoursConfig) -> Result<Self, ConfigError> {
        Self::with_adapter(config, ChronoTzAdapter::new())
    }
}

impl<A: TimezoneAdapter> VisitingHours<A> {
    /// Build from a configuration using a custom zone adapter.
    pub fn with_adapter(config: VisitingHoursConfig, adapter: A) -> Result<Self, ConfigError> {
        let index = HoursIndex::from_config(&config)?;

        if let Some(zone) = &config.zone {
            adapter
                .resolve(Some(zone))
                .map_err(|_| ConfigError::UnknownZone(zone.clone()))?;
        }

        debug!(
            weekdays = index.weekly().len(),
            overrides = index.special().len(),
            zone = config.zone.as_deref().unwrap_or("UTC"),
            live = config.live,
            "schedule ready"
        );

        Ok(Self {
            index,
            zone: config.zone,
            live: config.live,
            cache: Mutex::new(LiveCache::new()),
            adapter,
        })
    }

    /// Returns the normalized index.
    pub fn index(&self) -> &HoursIndex {
        &self.index
    }

    /// Returns the default zone name.
    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// Returns true if answers are memoized.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Decompose a query into wall-clock fields and the zone they are in.
    pub fn decompose(&self, input: QueryInput) -> Result<(DateInput, Tz), QueryError> {
        match input {
            QueryInput::Instant { at, zone } => {
                let name = zone.as_deref().or(self.zone.as_deref());
                let tz = self.adapter.resolve(name)?;
                let parts = self.adapter.offset_instant(at, tz);
                Ok((DateInput::from_parts(&parts, name, at), tz))
            }
            QueryInput::Fields(fields) => {
                let name = fields.zone.as_deref().or(self.zone.as_deref());
                let tz = self.adapter.resolve(name)?;
                Ok((fields, tz))
            }
        }
    }

    /// Is the venue open at the queried moment?
    ///
    /// In live mode the returned answer is shared with later queries for as
    /// long as it stays valid.
    pub fn is_open(&self, input: impl Into<QueryInput>) -> Result<Arc<MatchResult>, QueryError> {
        let (date, tz) = self.decompose(input.into())?;

        let Some(at) = date.timestamp.filter(|_| self.live) else {
            return Ok(Arc::new(self.evaluate(&date)));
        };

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(hit) = cache.get(at) {
            trace!(%at, "live cache hit");
            return Ok(hit);
        }

        let answer = Arc::new(self.evaluate(&date));
        let until = valid_until(&answer, &self.adapter, tz, at);
        cache.insert(at, until, answer.clone());

        Ok(answer)
    }

    fn evaluate(&self, date: &DateInput) -> MatchResult {
        self.index
            .is_open_at(date.calendar_day(), date.time_value(), self.live)
    }

    /// The opening intervals left on the queried day, including a trailing
    /// interval that runs past midnight.
    ///
    /// Intervals already in progress start at the queried time. Intervals
    /// that ended earlier are left out. The result is sorted by opening
    /// time. A range configured across midnight keeps its next-day close,
    /// so its `close` is not after its `open`; see
    /// [`HourRange::closes_next_day`].
    pub fn remaining_hours(
        &self,
        input: impl Into<QueryInput>,
    ) -> Result<Vec<HourRange>, QueryError> {
        let (date, _) = self.decompose(input.into())?;
        let day = date.calendar_day();
        let key = date.time_value();

        let special = self.index.overrides(day).find_map(|(precedence, record)| {
            (precedence == Precedence::SpecialDate).then_some(record)
        });
        let regular = self.index.weekly().day(date.weekday);

        let base = special
            .and_then(IndexedDay::configured)
            .or_else(|| regular.and_then(IndexedDay::configured))
            .unwrap_or_default();

        let mut remaining = Vec::with_capacity(base.len() + 1);
        let mut earliest = TimeValue::END_OF_DAY;

        for &(open, close) in base {
            if HourRange::new(open, close).closes_next_day() || close >= key {
                remaining.push(HourRange::new(open.max(key), close));
                earliest = earliest.min(open);
            }
        }

        if earliest > TimeValue::MIDNIGHT {
            let carried = self
                .index
                .overrides(day)
                .map(|(_, record)| record)
                .chain(regular)
                .find(|record| record.is_past_midnight());

            let tail = carried.and_then(|record| {
                record
                    .hours()
                    .iter()
                    .find(|&&(o, c)| o == TimeValue::MIDNIGHT && c > key && c < earliest)
            });

            if let Some(&(_, close)) = tail {
                remaining.push(HourRange::new(key, close));
            }
        }

        remaining.sort_by_key(|range| range.open);
        Ok(remaining)
    }
}

impl<A> std::fmt::Debug for VisitingHours<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisitingHours")
            .field("index", &self.index)
            .field("zone", &self.zone)
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}
