//! Schedule configuration.
//!
//! The configuration mirrors the JSON document venues are described with:
//!
//! ```json
//! {
//!   "zone": "Europe/Amsterdam",
//!   "live": true,
//!   "regular": {
//!     "monday": { "isOpen": true, "hours": [{ "open": "08:00", "close": "12:00" }] },
//!     "sunday": { "isOpen": false }
//!   },
//!   "special": [{ "date": "25/12", "isOpen": false }]
//! }
//! ```

use std::collections::BTreeMap;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ConfigError, DateKey, TimeValue, WEEKDAYS, weekday_from_name, weekday_index, weekday_name,
};

/// One configured opening, as wall-clock strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInterval {
    /// Opening time in HH:MM format
    pub open: String,

    /// Closing time in HH:MM format; earlier than `open` when the venue
    /// closes after midnight
    pub close: String,
}

impl RawInterval {
    /// Create an interval from opening and closing strings.
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    /// Parse both ends of the interval.
    pub fn parse(&self) -> Result<(TimeValue, TimeValue), ConfigError> {
        Ok((parse_time(&self.open)?, parse_time(&self.close)?))
    }
}

fn parse_time(value: &str) -> Result<TimeValue, ConfigError> {
    TimeValue::parse_hhmm(value).map_err(|source| ConfigError::InvalidTime {
        value: value.to_string(),
        source,
    })
}

/// Configuration of a single weekday or override date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDay {
    /// Whether the venue opens at all on this day
    pub is_open: bool,

    /// Opening intervals, in configuration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hours: Vec<RawInterval>,
}

impl RawDay {
    /// An open day with the given `(open, close)` intervals.
    pub fn open(hours: &[(&str, &str)]) -> Self {
        Self {
            is_open: true,
            hours: hours
                .iter()
                .map(|(open, close)| RawInterval::new(*open, *close))
                .collect(),
        }
    }

    /// A day on which the venue stays closed.
    pub fn closed() -> Self {
        Self::default()
    }
}

/// An override for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialDay {
    /// Date in "DD/MM" format. Required; kept optional so a missing date is
    /// reported as a configuration error rather than a decode error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    #[serde(flatten)]
    pub day: RawDay,
}

impl SpecialDay {
    /// Create an override for `date` ("DD/MM").
    pub fn new(date: impl Into<String>, day: RawDay) -> Self {
        Self {
            date: Some(date.into()),
            day,
        }
    }

    /// Parse the override date.
    pub fn key(&self, position: usize) -> Result<DateKey, ConfigError> {
        let date = self
            .date
            .as_deref()
            .ok_or(ConfigError::MissingDate { position })?;

        DateKey::parse(date).map_err(|source| ConfigError::InvalidDate {
            value: date.to_string(),
            source,
        })
    }
}

/// The recurring weekly schedule.
///
/// Weekdays without an entry have no configured hours and evaluate as
/// closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, RawDay>",
    into = "BTreeMap<String, RawDay>"
)]
pub struct WeeklyConfig {
    days: [Option<RawDay>; 7],
}

impl WeeklyConfig {
    /// Create an empty weekly schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration for one weekday.
    pub fn with_day(mut self, weekday: Weekday, day: RawDay) -> Self {
        self.days[weekday_index(weekday)] = Some(day);
        self
    }

    /// Returns the configuration for a weekday, if any.
    pub fn day(&self, weekday: Weekday) -> Option<&RawDay> {
        self.days[weekday_index(weekday)].as_ref()
    }

    /// Iterate over configured weekdays, Sunday first.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &RawDay)> {
        WEEKDAYS
            .iter()
            .zip(self.days.iter())
            .filter_map(|(weekday, day)| day.as_ref().map(|d| (*weekday, d)))
    }
}

impl TryFrom<BTreeMap<String, RawDay>> for WeeklyConfig {
    type Error = ConfigError;

    fn try_from(map: BTreeMap<String, RawDay>) -> Result<Self, Self::Error> {
        map.into_iter().try_fold(Self::new(), |config, (name, day)| {
            let weekday =
                weekday_from_name(&name).ok_or_else(|| ConfigError::UnknownWeekday(name))?;
            Ok(config.with_day(weekday, day))
        })
    }
}

impl From<WeeklyConfig> for BTreeMap<String, RawDay> {
    fn from(config: WeeklyConfig) -> Self {
        config
            .iter()
            .map(|(weekday, day)| (weekday_name(weekday).to_string(), day.clone()))
            .collect()
    }
}

/// Configuration for a [`VisitingHours`](crate::VisitingHours) instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitingHoursConfig {
    /// Recurring weekly schedule
    #[serde(default)]
    pub regular: Option<WeeklyConfig>,

    /// Calendar-date overrides, in precedence order of definition
    #[serde(default)]
    pub special: Option<Vec<SpecialDay>>,

    /// IANA zone the schedule is written in; UTC when absent
    #[serde(default)]
    pub zone: Option<String>,

    /// Memoize answers until the next opening or closing
    #[serde(default)]
    pub live: bool,
}

impl VisitingHoursConfig {
    /// Create an empty configuration: always closed, UTC, not live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a configuration from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the weekly schedule.
    pub fn with_regular(mut self, regular: WeeklyConfig) -> Self {
        self.regular = Some(regular);
        self
    }

    /// Set the date overrides.
    pub fn with_special(mut self, special: Vec<SpecialDay>) -> Self {
        self.special = Some(special);
        self
    }

    /// Set the default zone.
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Enable or disable live caching.
    pub fn live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }
}
