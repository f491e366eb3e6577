//! Venue visiting hours.
//!
//! Answers "is this venue open right now?" from a weekly schedule plus
//! date-specific overrides. Intervals may run past midnight, overrides for
//! 28 and 29 February spill over correctly in leap and non-leap years, and
//! schedules are evaluated in the venue's IANA zone. In live mode the last
//! answer is memoized until the next opening or closing.

pub mod config;
pub mod domain;
pub mod hours;
pub mod index;
pub mod input;
pub mod live;
pub mod query;
pub mod timezone;

pub use config::{RawDay, RawInterval, SpecialDay, VisitingHoursConfig, WeeklyConfig};
pub use domain::{ConfigError, TimeValue, minute_steps};
pub use hours::{QueryError, VisitingHours};
pub use input::{DateInput, QueryInput};
pub use query::{HourRange, MatchResult};
pub use timezone::{ChronoTzAdapter, TimezoneAdapter};
