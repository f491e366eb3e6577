//! Domain types for opening-hours evaluation.
//!
//! This module contains the validated value types the schedule index is
//! built from. All types enforce their invariants at construction time, so
//! code that receives these types can trust their validity.

mod date_key;
mod error;
mod time;
mod weekday;

pub use date_key::{DateKey, InvalidDate, SpecialKey, is_leap_year};
pub use error::ConfigError;
pub use time::{TimeError, TimeValue, minute_steps};
pub use weekday::{WEEKDAYS, weekday_from_index, weekday_from_name, weekday_index, weekday_name};
