//! Query inputs.
//!
//! A query is either an absolute instant (optionally tagged with the zone to
//! evaluate it in) or a set of already decomposed wall-clock fields.

use chrono::{DateTime, Utc, Weekday};

use crate::domain::TimeValue;
use crate::timezone::ZonedParts;

/// The calendar facts the query engine needs about a local date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub weekday: Weekday,
    /// Zero-based month (0-11)
    pub month: u32,
    pub day: u32,
    pub is_leap_year: bool,
}

impl CalendarDay {
    /// Returns true on 29 February.
    pub fn is_leap_day(&self) -> bool {
        self.month == 1 && self.day == 29
    }

    /// Returns true on 1 March.
    pub fn is_first_of_march(&self) -> bool {
        self.month == 2 && self.day == 1
    }
}

/// Wall-clock fields of a query, already expressed in the evaluation zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateInput {
    /// Zero-based month (0-11)
    pub month: u32,
    pub day: u32,
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
    pub is_leap_year: bool,

    /// Zone the fields are expressed in; the default zone when absent
    pub zone: Option<String>,

    /// The instant the fields describe. Live caching needs it; queries
    /// without one are always evaluated afresh.
    pub timestamp: Option<DateTime<Utc>>,
}

impl DateInput {
    /// Build the fields from a zoned breakdown of `timestamp`.
    pub fn from_parts(parts: &ZonedParts, zone: Option<&str>, timestamp: DateTime<Utc>) -> Self {
        Self {
            month: parts.month - 1,
            day: parts.day,
            weekday: parts.weekday,
            hour: parts.hour,
            minute: parts.minute,
            is_leap_year: parts.is_leap_year(),
            zone: zone.map(str::to_string),
            timestamp: Some(timestamp),
        }
    }

    /// Returns the time of day as a [`TimeValue`], clamped to a valid time.
    pub fn time_value(&self) -> TimeValue {
        TimeValue::from_hm(self.hour.min(23), self.minute.min(59)).unwrap_or(TimeValue::MIDNIGHT)
    }

    /// Returns the calendar part of the fields.
    pub fn calendar_day(&self) -> CalendarDay {
        CalendarDay {
            weekday: self.weekday,
            month: self.month,
            day: self.day,
            is_leap_year: self.is_leap_year,
        }
    }
}

/// Input accepted by [`VisitingHours`](crate::VisitingHours) queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryInput {
    /// An instant, evaluated in `zone` or the configured default zone
    Instant {
        at: DateTime<Utc>,
        zone: Option<String>,
    },
    /// Pre-decomposed wall-clock fields
    Fields(DateInput),
}

impl QueryInput {
    /// An instant evaluated in the configured default zone.
    pub fn at(at: DateTime<Utc>) -> Self {
        QueryInput::Instant { at, zone: None }
    }

    /// An instant evaluated in `zone`.
    pub fn in_zone(at: DateTime<Utc>, zone: impl Into<String>) -> Self {
        QueryInput::Instant {
            at,
            zone: Some(zone.into()),
        }
    }
}

impl From<DateTime<Utc>> for QueryInput {
    fn from(at: DateTime<Utc>) -> Self {
        QueryInput::at(at)
    }
}

impl From<DateInput> for QueryInput {
    fn from(fields: DateInput) -> Self {
        QueryInput::Fields(fields)
    }
}
