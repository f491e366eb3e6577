//! Normalized schedule for a single weekday or date.

use crate::domain::TimeValue;

/// A half-open `[open, close)` interval within one day.
pub type Interval = (TimeValue, TimeValue);

/// Normalized opening intervals for one weekday or calendar date.
///
/// Every interval satisfies `open < close`. An interval configured across
/// midnight is stored as `(open, 24:00)` here and `(00:00, close)` on the
/// following day's record, which then has `past_midnight` set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexedDay {
    pub(crate) hours: Vec<Interval>,
    pub(crate) open: Option<bool>,
    pub(crate) past_midnight: bool,
    pub(crate) configured: Option<Vec<Interval>>,
}

impl IndexedDay {
    /// Returns the normalized intervals, past-midnight remainders first.
    pub fn hours(&self) -> &[Interval] {
        &self.hours
    }

    /// Returns the configured open flag.
    ///
    /// `None` for a record that only exists to hold the past-midnight
    /// remainder of the previous day.
    pub fn open_flag(&self) -> Option<bool> {
        self.open
    }

    /// Returns true if the open flag was configured as open.
    pub fn is_open(&self) -> bool {
        self.open == Some(true)
    }

    /// Returns true if this record holds a remainder carried over midnight.
    pub fn is_past_midnight(&self) -> bool {
        self.past_midnight
    }

    /// Returns the intervals as configured, before the midnight split.
    ///
    /// `None` when the record was never configured itself.
    pub fn configured(&self) -> Option<&[Interval]> {
        self.configured.as_deref()
    }

    /// Returns true if the day is closed outright: not configured open and
    /// holding no remainder from the day before.
    pub fn is_closed_all_day(&self) -> bool {
        !self.is_open() && !self.past_midnight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeValue {
        TimeValue::parse_hhmm(s).unwrap()
    }

    #[test]
    fn default_is_unconfigured() {
        let day = IndexedDay::default();
        assert!(day.hours().is_empty());
        assert_eq!(day.open_flag(), None);
        assert!(!day.is_open());
        assert!(!day.is_past_midnight());
        assert!(day.configured().is_none());
        assert!(day.is_closed_all_day());
    }

    #[test]
    fn remainder_only_is_not_closed_all_day() {
        let day = IndexedDay {
            hours: vec![(TimeValue::MIDNIGHT, t("03:30"))],
            past_midnight: true,
            ..Default::default()
        };
        assert!(!day.is_closed_all_day());
        assert_eq!(day.open_flag(), None);
    }

    #[test]
    fn configured_closed_day() {
        let day = IndexedDay {
            open: Some(false),
            configured: Some(Vec::new()),
            ..Default::default()
        };
        assert!(day.is_closed_all_day());
        assert_eq!(day.configured(), Some(&[][..]));
    }
}
