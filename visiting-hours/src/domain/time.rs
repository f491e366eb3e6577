//! Time-of-day values for opening hours.
//!
//! Opening hours are configured as "HH:MM" strings. Internally a time is a
//! single integer `hour * 100 + minute`, so interval checks are plain integer
//! comparisons. `24:00` is allowed and marks the end of the day.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::timezone::TimezoneAdapter;

/// Error returned when parsing or constructing an invalid time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A wall-clock time of day encoded as `hour * 100 + minute`.
///
/// Valid values lie in `0..=2400` with a minute part below 60. `2400` is the
/// exclusive end of a day and only ever appears as a closing time.
///
/// # Examples
///
/// ```
/// use visiting_hours::domain::TimeValue;
///
/// let t = TimeValue::parse_hhmm("23:30").unwrap();
/// assert_eq!(t.value(), 2330);
/// assert_eq!(t.hours(), 23);
/// assert_eq!(t.minutes(), 30);
/// assert_eq!(t.to_string(), "23:30");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeValue(u16);

impl TimeValue {
    /// Midnight at the start of a day.
    pub const MIDNIGHT: TimeValue = TimeValue(0);

    /// Midnight at the end of a day.
    pub const END_OF_DAY: TimeValue = TimeValue(2400);

    /// Create a time from its integer encoding.
    pub fn new(value: u16) -> Result<Self, TimeError> {
        Self::from_hm(u32::from(value / 100), u32::from(value % 100))
    }

    /// Create a time from an hour and minute pair.
    ///
    /// # Examples
    ///
    /// ```
    /// use visiting_hours::domain::TimeValue;
    ///
    /// assert_eq!(TimeValue::from_hm(8, 5).unwrap().value(), 805);
    /// assert!(TimeValue::from_hm(24, 0).is_ok());
    /// assert!(TimeValue::from_hm(24, 1).is_err());
    /// assert!(TimeValue::from_hm(12, 60).is_err());
    /// ```
    pub fn from_hm(hours: u32, minutes: u32) -> Result<Self, TimeError> {
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        if hours > 24 || (hours == 24 && minutes != 0) {
            return Err(TimeError::new("time must be between 00:00 and 24:00"));
        }

        // Bounded above by 2400, fits in u16.
        Ok(Self((hours * 100 + minutes) as u16))
    }

    /// Create a time from minutes since midnight (`0..=1440`).
    pub fn from_minutes(minutes: u32) -> Result<Self, TimeError> {
        Self::from_hm(minutes / 60, minutes % 60)
    }

    /// Parse a time from "HH:MM" format.
    ///
    /// # Examples
    ///
    /// ```
    /// use visiting_hours::domain::TimeValue;
    ///
    /// assert!(TimeValue::parse_hhmm("00:00").is_ok());
    /// assert!(TimeValue::parse_hhmm("24:00").is_ok());
    ///
    /// assert!(TimeValue::parse_hhmm("1430").is_err());
    /// assert!(TimeValue::parse_hhmm("14:3").is_err());
    /// assert!(TimeValue::parse_hhmm("25:00").is_err());
    /// ```
    pub fn parse_hhmm(s: &str) -> Result<Self, TimeError> {
        // Must be exactly 5 characters: HH:MM
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;

        Self::from_hm(hour, minute)
    }

    /// Returns the integer encoding.
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Returns the hour (0-24).
    pub fn hours(&self) -> u32 {
        u32::from(self.0 / 100)
    }

    /// Returns the minute (0-59).
    pub fn minutes(&self) -> u32 {
        u32::from(self.0 % 100)
    }

    /// Returns the number of minutes since midnight.
    pub fn minutes_since_midnight(&self) -> u32 {
        self.hours() * 60 + self.minutes()
    }

    /// Returns the zero-padded "HH:MM" form.
    pub fn military(&self) -> String {
        self.to_string()
    }

    /// Resolve this wall-clock time to the first instant at or after
    /// `reference` at which it occurs in `zone`.
    pub fn to_instant<A: TimezoneAdapter + ?Sized>(
        &self,
        adapter: &A,
        zone: Tz,
        reference: DateTime<Utc>,
    ) -> DateTime<Utc> {
        adapter.next_occurrence(self.hours(), self.minutes(), zone, reference)
    }
}

impl FromStr for TimeValue {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hhmm(s)
    }
}

impl fmt::Debug for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimeValue({:02}:{:02})", self.hours(), self.minutes())
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hours(), self.minutes())
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

const MINUTES_PER_DAY: u32 = 24 * 60;

/// List every wall-clock slot aligned to `step_mins` between `start` and
/// `end`, both inclusive.
///
/// The first slot is `start` rounded up to the step. When `end` is earlier
/// than `start` the range runs past midnight and slots after midnight are
/// reported as times on the next day ("00:00", "00:30", ...).
///
/// # Examples
///
/// ```
/// use visiting_hours::domain::{TimeValue, minute_steps};
///
/// let t = |s| TimeValue::parse_hhmm(s).unwrap();
///
/// let slots: Vec<String> = minute_steps(t("08:01"), t("09:14"), 15)
///     .iter()
///     .map(|v| v.to_string())
///     .collect();
/// assert_eq!(slots, ["08:15", "08:30", "08:45", "09:00"]);
///
/// let overnight: Vec<String> = minute_steps(t("23:30"), t("01:00"), 30)
///     .iter()
///     .map(|v| v.to_string())
///     .collect();
/// assert_eq!(overnight, ["23:30", "00:00", "00:30", "01:00"]);
/// ```
pub fn minute_steps(start: TimeValue, end: TimeValue, step_mins: u32) -> Vec<TimeValue> {
    if step_mins == 0 {
        return Vec::new();
    }

    let first = start.minutes_since_midnight().div_ceil(step_mins) * step_mins;
    let wraps = end < start;
    let last = if wraps {
        end.minutes_since_midnight() + MINUTES_PER_DAY
    } else {
        end.minutes_since_midnight()
    };

    (first..=last)
        .step_by(step_mins as usize)
        .filter_map(|m| {
            let m = if wraps && m >= MINUTES_PER_DAY {
                m - MINUTES_PER_DAY
            } else {
                m
            };
            TimeValue::from_minutes(m).ok()
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn valid_time()(hour in 0u32..24, minute in 0u32..60) -> String {
            format!("{:02}:{:02}", hour, minute)
        }
    }

    proptest! {
        /// Any valid HH:MM string parses successfully
        #[test]
        fn valid_hhmm_parses(time_str in valid_time()) {
            prop_assert!(TimeValue::parse_hhmm(&time_str).is_ok());
        }

        /// Parsing then displaying returns the original string
        #[test]
        fn parse_display_roundtrip(time_str in valid_time()) {
            let parsed = TimeValue::parse_hhmm(&time_str).unwrap();
            prop_assert_eq!(parsed.to_string(), time_str);
        }

        /// Hours and minutes are derived from the integer encoding
        #[test]
        fn derived_views_match_encoding(hour in 0u32..24, minute in 0u32..60) {
            let v = TimeValue::from_hm(hour, minute).unwrap();
            prop_assert_eq!(v.hours(), u32::from(v.value()) / 100);
            prop_assert_eq!(v.minutes(), u32::from(v.value()) % 100);
        }

        /// Ordering of values agrees with ordering of minutes since midnight
        #[test]
        fn ordering_matches_minutes(a in 0u32..=1440, b in 0u32..=1440) {
            let ta = TimeValue::from_minutes(a).unwrap();
            let tb = TimeValue::from_minutes(b).unwrap();
            prop_assert_eq!(ta.cmp(&tb), a.cmp(&b));
        }

        /// Hours above 24 are rejected
        #[test]
        fn invalid_hour_rejected(hour in 25u32..100, minute in 0u32..60) {
            let s = format!("{:02}:{:02}", hour, minute);
            prop_assert!(TimeValue::parse_hhmm(&s).is_err());
        }

        /// Minutes above 59 are rejected
        #[test]
        fn invalid_minute_rejected(hour in 0u32..24, minute in 60u32..100) {
            let s = format!("{:02}:{:02}", hour, minute);
            prop_assert!(TimeValue::parse_hhmm(&s).is_err());
        }

        /// Every step lies on the requested grid
        #[test]
        fn steps_are_aligned(
            start in 0u32..1440,
            end in 0u32..1440,
            step in prop::sample::select(vec![5u32, 10, 15, 30, 60]),
        ) {
            let slots = minute_steps(
                TimeValue::from_minutes(start).unwrap(),
                TimeValue::from_minutes(end).unwrap(),
                step,
            );
            for slot in slots {
                prop_assert_eq!(slot.minutes_since_midnight() % step, 0);
            }
        }
    }
}
