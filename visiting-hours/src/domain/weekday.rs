//! Sunday-first weekday numbering used by schedules.

use chrono::Weekday;

/// Weekdays in schedule order, indexed from Sunday = 0.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

const NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Returns the schedule index of a weekday (Sunday = 0).
pub fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_sunday() as usize
}

/// Returns the weekday at a schedule index, wrapping modulo 7.
pub fn weekday_from_index(index: usize) -> Weekday {
    WEEKDAYS[index % 7]
}

/// Returns the lowercase configuration name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    NAMES[weekday_index(day)]
}

/// Look up a weekday by its lowercase configuration name.
pub fn weekday_from_name(name: &str) -> Option<Weekday> {
    NAMES
        .iter()
        .position(|n| *n == name)
        .map(weekday_from_index)
}
