//! Query engine: resolves which record governs a date and searches it.
//!
//! Records are consulted in precedence order, first applicable wins:
//!
//! 1. the remainder of a 29 February override, on 1 March of a leap year;
//! 2. the remainder of a 28 February override, on 29 February, or on
//!    1 March of a year without a 29 February;
//! 3. an override for the calendar date itself;
//! 4. the regular weekday schedule.
//!
//! An override that only holds a past-midnight remainder has no open flag
//! of its own. Outside that remainder it says nothing, and the next rule is
//! consulted instead.

use std::sync::Arc;

use tracing::trace;

use crate::domain::{DateKey, SpecialKey, TimeValue};
use crate::index::{HoursIndex, IndexedDay};
use crate::input::CalendarDay;

/// An opening interval, `open` inclusive and `close` exclusive.
///
/// Ranges listed by [`remaining_hours`](crate::VisitingHours::remaining_hours)
/// may close on the following day, in which case `close <= open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    pub open: TimeValue,
    pub close: TimeValue,
}

impl HourRange {
    pub fn new(open: TimeValue, close: TimeValue) -> Self {
        Self { open, close }
    }

    /// Returns true if `at` lies in `[open, close)` on the same day.
    pub fn contains(&self, at: TimeValue) -> bool {
        self.open <= at && at < self.close
    }

    /// Returns true if the range runs past midnight and closes the next day.
    pub fn closes_next_day(&self) -> bool {
        self.close <= self.open
    }
}

/// The answer to "is the venue open?".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Whether an interval contains the queried time
    pub open: bool,

    /// The containing interval; present exactly when `open`
    pub matched: Option<HourRange>,

    /// The next opening later the same day. Only searched for in live
    /// mode, and only meaningful when closed.
    pub soonest: Option<TimeValue>,
}

impl MatchResult {
    /// Closed, with no known next opening.
    pub fn closed() -> Self {
        Self::default()
    }

    /// Closed, opening again at `soonest` if known.
    pub fn closed_until(soonest: Option<TimeValue>) -> Self {
        Self {
            soonest,
            ..Self::default()
        }
    }

    /// Open within `range`.
    pub fn open_in(range: HourRange) -> Self {
        Self {
            open: true,
            matched: Some(range),
            soonest: None,
        }
    }

    /// Returns true if two shared answers are the same cached answer.
    ///
    /// Live mode hands out the same allocation for as long as an answer
    /// stays valid, so pointer equality means "nothing changed".
    pub fn same_answer(a: &Arc<MatchResult>, b: &Arc<MatchResult>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

/// The rule that selected the record answering a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precedence {
    PostLeapYear,
    LeapYear,
    SpecialDate,
    Weekday,
}

/// A lookup of one time against one record.
#[derive(Debug, Clone, Copy)]
pub struct HoursQuery<'a> {
    key: TimeValue,
    day: Option<&'a IndexedDay>,
    skip_soonest: bool,
}

impl<'a> HoursQuery<'a> {
    /// Create a query. The next opening is only searched for when
    /// `find_soonest` is set and the record is configured open.
    pub fn new(key: TimeValue, day: Option<&'a IndexedDay>, find_soonest: bool) -> Self {
        let configured_open = day.is_some_and(IndexedDay::is_open);

        Self {
            key,
            day,
            skip_soonest: !find_soonest || !configured_open,
        }
    }

    /// Answer from a regular weekday record. A missing record is closed.
    pub fn check_day(&self) -> MatchResult {
        match self.day {
            Some(day) if !day.is_closed_all_day() => self.find_hour(day),
            _ => MatchResult::closed(),
        }
    }

    /// Answer from an override record.
    ///
    /// Returns `None` when there is no record, or when the record has no
    /// open flag and no interval contains the time.
    pub fn check_special_day(&self) -> Option<MatchResult> {
        let day = self.day?;
        let result = self.check_day();

        (result.open || day.open_flag().is_some()).then_some(result)
    }

    fn find_hour(&self, day: &IndexedDay) -> MatchResult {
        let key = self.key;

        if self.skip_soonest {
            return day
                .hours()
                .iter()
                .map(|&(o, c)| HourRange::new(o, c))
                .find(|range| range.contains(key))
                .map_or_else(MatchResult::closed, MatchResult::open_in);
        }

        let mut soonest: Option<TimeValue> = None;

        for &(o, c) in day.hours() {
            let range = HourRange::new(o, c);
            if range.contains(key) {
                return MatchResult::open_in(range);
            }

            if o > key && soonest.is_none_or(|s| o < s) {
                soonest = Some(o);
            }
        }

        MatchResult::closed_until(soonest)
    }
}

impl HoursIndex {
    /// Override records that apply to `day`, highest precedence first.
    pub fn overrides(
        &self,
        day: CalendarDay,
    ) -> impl Iterator<Item = (Precedence, &IndexedDay)> + '_ {
        let special = self.special();

        let post_leap_year = (day.is_first_of_march() && day.is_leap_year)
            .then(|| special.get(SpecialKey::PostLeapYear))
            .flatten();
        let leap_year = (day.is_leap_day() || (day.is_first_of_march() && !day.is_leap_year))
            .then(|| special.get(SpecialKey::LeapYear))
            .flatten();
        let date = DateKey::new(day.day, day.month)
            .ok()
            .and_then(|key| special.date(key));

        [
            (Precedence::PostLeapYear, post_leap_year),
            (Precedence::LeapYear, leap_year),
            (Precedence::SpecialDate, date),
        ]
        .into_iter()
        .filter_map(|(precedence, record)| record.map(|r| (precedence, r)))
    }

    /// Returns true if any override applies to `day`.
    pub fn has_override(&self, day: CalendarDay) -> bool {
        self.overrides(day).next().is_some()
    }

    /// Evaluate the schedule at time `at` on `day`.
    ///
    /// With `find_soonest` set, a closed answer from a day configured open
    /// also reports the next opening later that day.
    pub fn is_open_at(&self, day: CalendarDay, at: TimeValue, find_soonest: bool) -> MatchResult {
        self.resolve(day, at, find_soonest).1
    }

    /// Like [`is_open_at`](Self::is_open_at), also reporting which rule
    /// produced the answer.
    pub fn resolve(
        &self,
        day: CalendarDay,
        at: TimeValue,
        find_soonest: bool,
    ) -> (Precedence, MatchResult) {
        for (precedence, record) in self.overrides(day) {
            if let Some(result) = HoursQuery::new(at, Some(record), find_soonest).check_special_day()
            {
                trace!(?precedence, open = result.open, %at, "answered by override");
                return (precedence, result);
            }
        }

        let regular = self.weekly().day(day.weekday);
        let result = HoursQuery::new(at, regular, find_soonest).check_day();
        trace!(open = result.open, %at, "answered by weekly schedule");

        (Precedence::Weekday, result)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::config::{RawDay, VisitingHoursConfig, WeeklyConfig};
    use chrono::Weekday;
    use proptest::prelude::*;

    fn wednesday() -> CalendarDay {
        CalendarDay {
            weekday: Weekday::Wed,
            month: 6,
            day: 15,
            is_leap_year: true,
        }
    }

    prop_compose! {
        fn interval()(open in 0u32..1439, len in 1u32..600) -> (TimeValue, TimeValue) {
            let close = (open + len).min(1440);
            (TimeValue::from_minutes(open).unwrap(), TimeValue::from_minutes(close).unwrap())
        }
    }

    fn single_interval_index(open: TimeValue, close: TimeValue, is_open: bool) -> HoursIndex {
        let (open, close) = (open.to_string(), close.to_string());
        let raw = RawDay {
            is_open,
            ..RawDay::open(&[(open.as_str(), close.as_str())])
        };
        let config = VisitingHoursConfig::new()
            .with_regular(WeeklyConfig::new().with_day(Weekday::Wed, raw));
        HoursIndex::from_config(&config).unwrap()
    }

    proptest! {
        /// Opening time is inside, closing time is outside
        #[test]
        fn interval_bounds_are_half_open((open, close) in interval()) {
            let index = single_interval_index(open, close, true);

            let at_open = index.is_open_at(wednesday(), open, false);
            prop_assert!(at_open.open);
            prop_assert_eq!(at_open.matched, Some(HourRange::new(open, close)));

            if close < TimeValue::END_OF_DAY {
                prop_assert!(!index.is_open_at(wednesday(), close, false).open);
            }
        }

        /// A day configured closed is closed at every minute
        #[test]
        fn closed_day_never_opens((open, close) in interval(), at in 0u32..1440) {
            let index = single_interval_index(open, close, false);
            let at = TimeValue::from_minutes(at).unwrap();

            let result = index.is_open_at(wednesday(), at, true);
            prop_assert!(!result.open);
            prop_assert!(result.matched.is_none());
        }

        /// Open answers carry a containing match; closed answers carry a
        /// soonest opening strictly later than the query
        #[test]
        fn answers_are_consistent((open, close) in interval(), at in 0u32..1440) {
            let index = single_interval_index(open, close, true);
            let at = TimeValue::from_minutes(at).unwrap();

            let result = index.is_open_at(wednesday(), at, true);
            prop_assert_eq!(result.open, result.matched.is_some());
            if let Some(matched) = result.matched {
                prop_assert!(matched.contains(at));
            }
            if let Some(soonest) = result.soonest {
                prop_assert!(!result.open);
                prop_assert!(soonest > at);
            }
        }
    }
}
