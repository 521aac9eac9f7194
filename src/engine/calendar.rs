use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

/// Kind of override a calendar entry applies to its date.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CalendarEntryType {
    Holiday,
    NonWorkingDay,
    ShortDay,
}

impl CalendarEntryType {
    // Holiday > NonWorkingDay > ShortDay
    fn rank(self) -> u8 {
        match self {
            CalendarEntryType::Holiday => 3,
            CalendarEntryType::NonWorkingDay => 2,
            CalendarEntryType::ShortDay => 1,
        }
    }
}

/// What the calendar says about a single date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    #[default]
    Regular,
    ShortDay,
    Holiday,
    NonWorkingDay,
}

impl DayKind {
    /// Holidays and declared non-working days suppress attendance expectation.
    pub fn is_holiday(self) -> bool {
        matches!(self, DayKind::Holiday | DayKind::NonWorkingDay)
    }

    pub fn is_short_day(self) -> bool {
        self == DayKind::ShortDay
    }
}

impl From<CalendarEntryType> for DayKind {
    fn from(entry: CalendarEntryType) -> Self {
        match entry {
            CalendarEntryType::Holiday => DayKind::Holiday,
            CalendarEntryType::NonWorkingDay => DayKind::NonWorkingDay,
            CalendarEntryType::ShortDay => DayKind::ShortDay,
        }
    }
}

/// Yes/no calendar predicates consumed by the day planner.
pub trait HolidayCalendar {
    fn day_kind(&self, date: NaiveDate) -> DayKind;

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.day_kind(date).is_holiday()
    }

    fn is_short_day(&self, date: NaiveDate) -> bool {
        self.day_kind(date).is_short_day()
    }
}

/// In-memory view over a set of calendar entries.
#[derive(Debug, Clone, Default)]
pub struct CalendarSnapshot {
    dated: HashMap<NaiveDate, CalendarEntryType>,
    recurring: HashMap<(u32, u32), CalendarEntryType>,
}

impl CalendarSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. Recurring entries match the same month/day in every year.
    /// When two entries hit the same day the stronger one wins.
    pub fn add(&mut self, date: NaiveDate, entry: CalendarEntryType, recurring: bool) {
        fn keep_stronger<K: std::hash::Hash + Eq>(
            map: &mut HashMap<K, CalendarEntryType>,
            key: K,
            entry: CalendarEntryType,
        ) {
            map.entry(key)
                .and_modify(|existing| {
                    if entry.rank() > existing.rank() {
                        *existing = entry;
                    }
                })
                .or_insert(entry);
        }

        if recurring {
            keep_stronger(&mut self.recurring, (date.month(), date.day()), entry);
        } else {
            keep_stronger(&mut self.dated, date, entry);
        }
    }

    pub fn len(&self) -> usize {
        self.dated.len() + self.recurring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HolidayCalendar for CalendarSnapshot {
    fn day_kind(&self, date: NaiveDate) -> DayKind {
        let dated = self.dated.get(&date).copied();
        let recurring = self.recurring.get(&(date.month(), date.day())).copied();

        match (dated, recurring) {
            (Some(a), Some(b)) => {
                if a.rank() >= b.rank() {
                    a.into()
                } else {
                    b.into()
                }
            }
            (Some(e), None) | (None, Some(e)) => e.into(),
            (None, None) => DayKind::Regular,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_calendar_is_regular() {
        let cal = CalendarSnapshot::new();
        assert!(cal.is_empty());
        assert_eq!(cal.day_kind(day(2025, 5, 1)), DayKind::Regular);
        assert!(!cal.is_holiday(day(2025, 5, 1)));
    }

    #[test]
    fn recurring_entries_match_every_year() {
        let mut cal = CalendarSnapshot::new();
        cal.add(day(2020, 12, 25), CalendarEntryType::Holiday, true);
        cal.add(day(2025, 2, 4), CalendarEntryType::Holiday, false);

        assert!(cal.is_holiday(day(2025, 12, 25)));
        assert!(cal.is_holiday(day(2031, 12, 25)));
        assert!(cal.is_holiday(day(2025, 2, 4)));
        assert!(!cal.is_holiday(day(2026, 2, 4)));
    }

    #[test]
    fn stronger_entry_wins_on_the_same_day() {
        let mut cal = CalendarSnapshot::new();
        cal.add(day(2025, 12, 31), CalendarEntryType::ShortDay, true);
        assert!(cal.is_short_day(day(2025, 12, 31)));

        cal.add(day(2025, 12, 31), CalendarEntryType::Holiday, false);
        assert_eq!(cal.day_kind(day(2025, 12, 31)), DayKind::Holiday);
        assert_eq!(cal.day_kind(day(2026, 12, 31)), DayKind::ShortDay);

        cal.add(day(2025, 12, 31), CalendarEntryType::ShortDay, false);
        assert_eq!(cal.day_kind(day(2025, 12, 31)), DayKind::Holiday);
    }

    #[test]
    fn non_working_day_counts_as_holiday() {
        let mut cal = CalendarSnapshot::new();
        cal.add(day(2025, 6, 2), CalendarEntryType::NonWorkingDay, false);
        assert!(cal.is_holiday(day(2025, 6, 2)));
        assert!(!cal.is_short_day(day(2025, 6, 2)));
    }

    #[test]
    fn entry_type_string_forms() {
        assert_eq!(CalendarEntryType::NonWorkingDay.as_ref(), "non_working_day");
        assert_eq!(
            CalendarEntryType::from_str("short_day").unwrap(),
            CalendarEntryType::ShortDay
        );
        assert!(CalendarEntryType::from_str("vacation").is_err());
    }
}
