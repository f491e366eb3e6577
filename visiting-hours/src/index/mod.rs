//! Interval index built from a schedule configuration.
//!
//! The index is built once and never mutated afterwards, so it can be shared
//! between threads freely. It holds two maps:
//!
//! - a weekly map from weekday to [`IndexedDay`], and
//! - an override map from calendar date (plus two synthetic leap-year keys)
//!   to [`IndexedDay`].

mod builder;
mod day;

use std::collections::HashMap;

use chrono::Weekday;

use crate::config::VisitingHoursConfig;
use crate::domain::{ConfigError, DateKey, SpecialKey, weekday_index};

pub use builder::{build_special, build_weekly};
pub use day::{IndexedDay, Interval};

/// Normalized weekly schedule, one slot per weekday (Sunday = 0).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyIndex {
    days: [Option<IndexedDay>; 7],
}

impl WeeklyIndex {
    /// Returns the record for a weekday, or `None` if it has no hours.
    pub fn day(&self, weekday: Weekday) -> Option<&IndexedDay> {
        self.days[weekday_index(weekday)].as_ref()
    }

    /// Number of weekdays with a record.
    pub fn len(&self) -> usize {
        self.days.iter().filter(|d| d.is_some()).count()
    }

    /// Returns true if no weekday has a record.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalized calendar overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecialIndex {
    dates: HashMap<SpecialKey, IndexedDay>,
}

impl SpecialIndex {
    /// Returns the record stored under a key.
    pub fn get(&self, key: SpecialKey) -> Option<&IndexedDay> {
        self.dates.get(&key)
    }

    /// Returns the record for a calendar date.
    pub fn date(&self, key: DateKey) -> Option<&IndexedDay> {
        self.get(SpecialKey::Date(key))
    }

    /// Number of keys, synthetic leap keys included.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if there are no overrides.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// The complete index: weekly schedule plus overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoursIndex {
    weekly: WeeklyIndex,
    special: SpecialIndex,
}

impl HoursIndex {
    /// Build the index from a configuration.
    pub fn from_config(config: &VisitingHoursConfig) -> Result<Self, ConfigError> {
        let weekly = match &config.regular {
            Some(regular) => build_weekly(regular)?,
            None => WeeklyIndex::default(),
        };
        let special = match &config.special {
            Some(special) => build_special(special)?,
            None => SpecialIndex::default(),
        };

        Ok(Self { weekly, special })
    }

    /// Returns the weekly schedule.
    pub fn weekly(&self) -> &WeeklyIndex {
        &self.weekly
    }

    /// Returns the overrides.
    pub fn special(&self) -> &SpecialIndex {
        &self.special
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RawDay, SpecialDay, WeeklyConfig};

    #[test]
    fn empty_config_builds_empty_index() {
        let index = HoursIndex::from_config(&VisitingHoursConfig::new()).unwrap();
        assert!(index.weekly().is_empty());
        assert!(index.special().is_empty());
    }

    #[test]
    fn from_config_builds_both_maps() {
        let config = VisitingHoursConfig::new()
            .with_regular(
                WeeklyConfig::new()
                    .with_day(Weekday::Sun, RawDay::closed())
                    .with_day(Weekday::Mon, RawDay::open(&[("23:30", "03:30")])),
            )
            .with_special(vec![SpecialDay::new("25/12", RawDay::closed())]);

        let index = HoursIndex::from_config(&config).unwrap();

        // Sunday, Monday and Tuesday (the remainder target).
        assert_eq!(index.weekly().len(), 3);
        assert!(index.weekly().day(Weekday::Wed).is_none());

        let christmas = DateKey::parse("25/12").unwrap();
        assert_eq!(index.special().date(christmas).unwrap().open_flag(), Some(false));
    }

    #[test]
    fn from_config_propagates_errors() {
        let config = VisitingHoursConfig::new().with_special(vec![SpecialDay {
            date: None,
            day: RawDay::closed(),
        }]);
        assert!(HoursIndex::from_config(&config).is_err());
    }
}
