//! Normalization of raw schedules into indexed day records.
//!
//! Building is two passes. The first pass parses every configured day,
//! keeps same-day intervals and queues the part of any interval that runs
//! past midnight. The second pass prepends each queued remainder to the
//! record of the day it lands on, creating that record if needed and
//! keeping whatever flags it already has.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::Weekday;
use tracing::{debug, trace};

use crate::config::{RawDay, SpecialDay, WeeklyConfig};
use crate::domain::{ConfigError, SpecialKey, TimeValue, weekday_from_index, weekday_index};

use super::day::IndexedDay;
use super::{SpecialIndex, WeeklyIndex};

/// Build the weekly index from the recurring schedule.
///
/// A remainder past Saturday midnight lands on Sunday.
pub fn build_weekly(regular: &WeeklyConfig) -> Result<WeeklyIndex, ConfigError> {
    let entries = regular
        .iter()
        .map(|(weekday, day)| Ok((weekday, next_weekday(weekday), day)));

    let records = normalize(entries)?;

    let mut index = WeeklyIndex::default();
    for (weekday, record) in records {
        index.days[weekday_index(weekday)] = Some(record);
    }

    debug!(days = index.len(), "built weekly index");
    Ok(index)
}

/// Build the override index from the list of special dates.
///
/// Fails if an entry has no date or an unparseable date.
pub fn build_special(special: &[SpecialDay]) -> Result<SpecialIndex, ConfigError> {
    let entries = special.iter().enumerate().map(|(position, entry)| {
        let key = entry.key(position)?;
        Ok((SpecialKey::Date(key), key.next(), &entry.day))
    });

    let records = normalize(entries)?;

    debug!(dates = records.len(), "built special index");
    Ok(SpecialIndex { dates: records })
}

fn next_weekday(weekday: Weekday) -> Weekday {
    weekday_from_index(weekday_index(weekday) + 1)
}

/// Normalize `(key, next key, day)` entries into one record per key.
///
/// Entries sharing a key are merged in order: the later open flag wins and
/// intervals accumulate.
fn normalize<'a, K, I>(entries: I) -> Result<HashMap<K, IndexedDay>, ConfigError>
where
    K: Copy + Eq + Hash + std::fmt::Display,
    I: IntoIterator<Item = Result<(K, K, &'a RawDay), ConfigError>>,
{
    let mut records: HashMap<K, IndexedDay> = HashMap::new();
    let mut remainders: Vec<(K, TimeValue)> = Vec::new();

    for entry in entries {
        let (key, next, day) = entry?;
        let record = records.entry(key).or_default();

        record.open = Some(day.is_open);
        let configured = record.configured.get_or_insert_with(Vec::new);

        for interval in &day.hours {
            let (open, close) = interval.parse()?;
            configured.push((open, close));

            if open < close {
                record.hours.push((open, close));
                continue;
            }

            // Crosses midnight.
            if open < TimeValue::END_OF_DAY {
                record.hours.push((open, TimeValue::END_OF_DAY));
            }
            if close > TimeValue::MIDNIGHT {
                remainders.push((next, close));
            }
        }
    }

    let carried = remainders.len();
    for (target, close) in remainders {
        trace!(%target, %close, "carrying interval past midnight");
        let record = records.entry(target).or_default();
        record.hours.insert(0, (TimeValue::MIDNIGHT, close));
        record.past_midnight = true;
    }

    debug!(records = records.len(), carried, "normalized schedule");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawInterval;
    use crate::domain::DateKey;

    fn t(s: &str) -> TimeValue {
        TimeValue::parse_hhmm(s).unwrap()
    }

    fn key(s: &str) -> SpecialKey {
        SpecialKey::Date(DateKey::parse(s).unwrap())
    }

    fn weekly(days: &[(Weekday, RawDay)]) -> WeeklyIndex {
        let config = days
            .iter()
            .fold(WeeklyConfig::new(), |c, (d, raw)| c.with_day(*d, raw.clone()));
        build_weekly(&config).unwrap()
    }

    #[test]
    fn same_day_intervals_kept_in_order() {
        let index = weekly(&[(
            Weekday::Tue,
            RawDay::open(&[("19:00", "23:00"), ("08:00", "18:00")]),
        )]);

        let tue = index.day(Weekday::Tue).unwrap();
        assert_eq!(tue.hours(), [(t("19:00"), t("23:00")), (t("08:00"), t("18:00"))]);
        assert_eq!(tue.open_flag(), Some(true));
        assert!(!tue.is_past_midnight());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn midnight_split() {
        let index = weekly(&[(Weekday::Mon, RawDay::open(&[("23:30", "03:30")]))]);

        let mon = index.day(Weekday::Mon).unwrap();
        assert_eq!(mon.hours(), [(t("23:30"), TimeValue::END_OF_DAY)]);
        assert_eq!(mon.configured().unwrap(), [(t("23:30"), t("03:30"))]);

        let tue = index.day(Weekday::Tue).unwrap();
        assert_eq!(tue.hours(), [(TimeValue::MIDNIGHT, t("03:30"))]);
        assert!(tue.is_past_midnight());
        assert_eq!(tue.open_flag(), None);
        assert!(tue.configured().is_none());
    }

    #[test]
    fn saturday_wraps_to_sunday() {
        let index = weekly(&[
            (Weekday::Sun, RawDay::closed()),
            (Weekday::Sat, RawDay::open(&[("20:00", "02:00")])),
        ]);

        let sun = index.day(Weekday::Sun).unwrap();
        assert_eq!(sun.hours(), [(TimeValue::MIDNIGHT, t("02:00"))]);
        assert!(sun.is_past_midnight());
        assert_eq!(sun.open_flag(), Some(false));
    }

    #[test]
    fn remainder_prepended_to_configured_day() {
        let index = weekly(&[
            (Weekday::Mon, RawDay::open(&[("22:00", "01:00")])),
            (Weekday::Tue, RawDay::open(&[("08:00", "18:00")])),
        ]);

        let tue = index.day(Weekday::Tue).unwrap();
        assert_eq!(
            tue.hours(),
            [(TimeValue::MIDNIGHT, t("01:00")), (t("08:00"), t("18:00"))]
        );
        assert_eq!(tue.open_flag(), Some(true));
        assert_eq!(tue.configured().unwrap(), [(t("08:00"), t("18:00"))]);
    }

    #[test]
    fn remainder_survives_closed_target() {
        let index = weekly(&[
            (Weekday::Mon, RawDay::open(&[("22:00", "01:00")])),
            (Weekday::Tue, RawDay::closed()),
        ]);

        let tue = index.day(Weekday::Tue).unwrap();
        assert_eq!(tue.open_flag(), Some(false));
        assert!(tue.is_past_midnight());
        assert_eq!(tue.hours(), [(TimeValue::MIDNIGHT, t("01:00"))]);
    }

    #[test]
    fn closing_at_midnight_carries_nothing() {
        let index = weekly(&[(Weekday::Fri, RawDay::open(&[("18:00", "00:00")]))]);

        let fri = index.day(Weekday::Fri).unwrap();
        assert_eq!(fri.hours(), [(t("18:00"), TimeValue::END_OF_DAY)]);
        assert!(index.day(Weekday::Sat).is_none());
    }

    #[test]
    fn closing_at_end_of_day_is_same_day() {
        let index = weekly(&[(Weekday::Fri, RawDay::open(&[("18:00", "24:00")]))]);

        let fri = index.day(Weekday::Fri).unwrap();
        assert_eq!(fri.hours(), [(t("18:00"), TimeValue::END_OF_DAY)]);
        assert!(index.day(Weekday::Sat).is_none());
    }

    #[test]
    fn invalid_time_fails_build() {
        let config = WeeklyConfig::new().with_day(
            Weekday::Mon,
            RawDay {
                is_open: true,
                hours: vec![RawInterval::new("8:00", "12:00")],
            },
        );
        assert!(matches!(
            build_weekly(&config),
            Err(ConfigError::InvalidTime { .. })
        ));
    }

    #[test]
    fn special_dates_keyed_by_day_and_month() {
        let index = build_special(&[
            SpecialDay::new("13/07", RawDay::open(&[("12:00", "20:00")])),
            SpecialDay::new("14/07", RawDay::closed()),
        ])
        .unwrap();

        let jul13 = index.get(key("13/07")).unwrap();
        assert_eq!(jul13.hours(), [(t("12:00"), t("20:00"))]);
        assert_eq!(index.get(key("14/07")).unwrap().open_flag(), Some(false));
        assert!(index.get(key("15/07")).is_none());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn special_wrap_to_next_date() {
        let index =
            build_special(&[SpecialDay::new("16/07", RawDay::open(&[("20:00", "02:00")]))])
                .unwrap();

        let next = index.get(key("17/07")).unwrap();
        assert_eq!(next.hours(), [(TimeValue::MIDNIGHT, t("02:00"))]);
        assert!(next.is_past_midnight());
        assert_eq!(next.open_flag(), None);
    }

    #[test]
    fn special_wrap_across_new_year() {
        let index =
            build_special(&[SpecialDay::new("31/12", RawDay::open(&[("20:00", "04:00")]))])
                .unwrap();

        assert!(index.get(key("01/01")).unwrap().is_past_midnight());
    }

    #[test]
    fn special_leap_aliases() {
        let index = build_special(&[
            SpecialDay::new("28/02", RawDay::open(&[("23:00", "03:00")])),
            SpecialDay::new("29/02", RawDay::open(&[("22:00", "02:00")])),
        ])
        .unwrap();

        let leap = index.get(SpecialKey::LeapYear).unwrap();
        assert_eq!(leap.hours(), [(TimeValue::MIDNIGHT, t("03:00"))]);

        let post = index.get(SpecialKey::PostLeapYear).unwrap();
        assert_eq!(post.hours(), [(TimeValue::MIDNIGHT, t("02:00"))]);

        // Leap day itself keeps its own record untouched by the 28th.
        let feb29 = index.get(key("29/02")).unwrap();
        assert_eq!(feb29.hours(), [(t("22:00"), TimeValue::END_OF_DAY)]);
        assert!(!feb29.is_past_midnight());
        assert!(index.get(key("01/03")).is_none());
    }

    #[test]
    fn duplicate_dates_merge() {
        let index = build_special(&[
            SpecialDay::new("01/05", RawDay::open(&[("10:00", "12:00")])),
            SpecialDay::new("01/05", RawDay::open(&[("14:00", "16:00")])),
        ])
        .unwrap();

        let may1 = index.get(key("01/05")).unwrap();
        assert_eq!(may1.hours().len(), 2);
        assert_eq!(may1.configured().unwrap().len(), 2);
    }

    #[test]
    fn missing_date_is_fatal() {
        let entries = [
            SpecialDay::new("01/05", RawDay::closed()),
            SpecialDay {
                date: None,
                day: RawDay::closed(),
            },
        ];
        assert!(matches!(
            build_special(&entries),
            Err(ConfigError::MissingDate { position: 1 })
        ));
    }

    #[test]
    fn invalid_date_is_fatal() {
        let entries = [SpecialDay::new("32/01", RawDay::closed())];
        assert!(matches!(
            build_special(&entries),
            Err(ConfigError::InvalidDate { .. })
        ));
    }
}
