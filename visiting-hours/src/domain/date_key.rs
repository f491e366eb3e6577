//! Calendar keys for date-specific overrides.

use std::fmt;

use chrono::{Datelike, NaiveDate};

/// Error returned when parsing an invalid override date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date: {reason}")]
pub struct InvalidDate {
    reason: &'static str,
}

impl InvalidDate {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Leap year used to validate day/month pairs and step between them.
///
/// Using a leap year means 29 February is a valid key.
const REFERENCE_YEAR: i32 = 1972;

/// A day of the year without a year, with a zero-based month.
///
/// # Examples
///
/// ```
/// use visiting_hours::domain::DateKey;
///
/// let christmas = DateKey::parse("25/12").unwrap();
/// assert_eq!(christmas.day(), 25);
/// assert_eq!(christmas.month(), 11);
/// assert_eq!(christmas.to_string(), "25/11");
///
/// assert!(DateKey::parse("29/02").is_ok());
/// assert!(DateKey::parse("30/02").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateKey {
    month: u8,
    day: u8,
}

impl DateKey {
    /// Create a key from a day of month and a zero-based month.
    pub fn new(day: u32, month: u32) -> Result<Self, InvalidDate> {
        if month > 11 {
            return Err(InvalidDate::new("month must be 1-12"));
        }
        NaiveDate::from_ymd_opt(REFERENCE_YEAR, month + 1, day)
            .ok_or_else(|| InvalidDate::new("day does not exist in month"))?;

        // Both bounded by the calendar check above.
        Ok(Self {
            month: month as u8,
            day: day as u8,
        })
    }

    /// Parse a key from "DD/MM" format with a one-based month.
    ///
    /// Single-digit day and month parts are accepted ("1/3").
    pub fn parse(s: &str) -> Result<Self, InvalidDate> {
        let (day, month) = s
            .split_once('/')
            .ok_or_else(|| InvalidDate::new("expected DD/MM format"))?;

        let day = parse_number(day).ok_or_else(|| InvalidDate::new("invalid day digits"))?;
        let month = parse_number(month).ok_or_else(|| InvalidDate::new("invalid month digits"))?;

        if month == 0 {
            return Err(InvalidDate::new("month must be 1-12"));
        }

        Self::new(day, month - 1)
    }

    /// Returns the day of month (1-31).
    pub fn day(&self) -> u32 {
        u32::from(self.day)
    }

    /// Returns the zero-based month (0-11).
    pub fn month(&self) -> u32 {
        u32::from(self.month)
    }

    /// Returns the key that receives the past-midnight remainder of an
    /// interval configured on this date.
    ///
    /// Whether 29 February exists depends on the year being evaluated, so the
    /// day after 28 February and the day after 29 February are routed to the
    /// synthetic leap keys and resolved at query time.
    ///
    /// # Examples
    ///
    /// ```
    /// use visiting_hours::domain::{DateKey, SpecialKey};
    ///
    /// let key = |s| DateKey::parse(s).unwrap();
    ///
    /// assert_eq!(key("13/07").next(), SpecialKey::Date(key("14/07")));
    /// assert_eq!(key("31/12").next(), SpecialKey::Date(key("01/01")));
    /// assert_eq!(key("28/02").next(), SpecialKey::LeapYear);
    /// assert_eq!(key("29/02").next(), SpecialKey::PostLeapYear);
    /// ```
    pub fn next(&self) -> SpecialKey {
        match (self.month, self.day) {
            (1, 28) => SpecialKey::LeapYear,
            (1, 29) => SpecialKey::PostLeapYear,
            _ => {
                let tomorrow = self.reference_date().and_then(|d| d.succ_opt());
                match tomorrow {
                    Some(d) => SpecialKey::Date(Self {
                        month: d.month0() as u8,
                        day: d.day() as u8,
                    }),
                    // Unreachable for validated keys; stay on the same date.
                    None => SpecialKey::Date(*self),
                }
            }
        }
    }

    fn reference_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(REFERENCE_YEAR, self.month() + 1, self.day())
    }
}

impl fmt::Debug for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DateKey({}/{})", self.day, self.month)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.day, self.month)
    }
}

/// A key in the override index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialKey {
    /// A concrete calendar date.
    Date(DateKey),
    /// Remainder of a 28 February override; lands on 29 February in leap
    /// years and on 1 March otherwise.
    LeapYear,
    /// Remainder of a 29 February override; lands on 1 March of a leap year.
    PostLeapYear,
}

impl fmt::Display for SpecialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecialKey::Date(key) => key.fmt(f),
            SpecialKey::LeapYear => f.write_str("__leapYear"),
            SpecialKey::PostLeapYear => f.write_str("__postLeapYear"),
        }
    }
}

/// Returns true if `year` has a 29 February.
pub fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
