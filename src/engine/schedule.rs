use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::calendar::DayKind;
use super::error::EngineError;

/// Share of the normal span worked on a short (pre-holiday) day.
pub const SHORT_DAY_FACTOR: f64 = 0.6;

/// Per-weekday working flags, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDays([bool; 7]);

impl WorkingDays {
    /// Monday to Friday.
    pub const WEEKDAYS: Self = Self([true, true, true, true, true, false, false]);

    /// Build from a slice that must hold exactly one flag per weekday.
    pub fn from_flags(flags: &[bool]) -> Result<Self, EngineError> {
        let flags: [bool; 7] = flags.try_into().map_err(|_| EngineError::UnmappedWeekday {
            mask: flags.iter().map(|&f| if f { '1' } else { '0' }).collect(),
        })?;
        Ok(Self(flags))
    }

    /// Parse the persisted `1111100` form.
    pub fn parse_mask(mask: &str) -> Result<Self, EngineError> {
        let unmapped = || EngineError::UnmappedWeekday {
            mask: mask.to_string(),
        };

        let flags = mask
            .chars()
            .map(|c| match c {
                '1' => Ok(true),
                '0' => Ok(false),
                _ => Err(unmapped()),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_flags(&flags).map_err(|_| unmapped())
    }

    pub fn to_mask(&self) -> String {
        self.0.iter().map(|&f| if f { '1' } else { '0' }).collect()
    }

    pub fn flags(&self) -> [bool; 7] {
        self.0
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0[weekday.num_days_from_monday() as usize]
    }
}

/// How a schedule defines the working day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Fixed start and end. `end < start` wraps past midnight.
    Fixed { start: NaiveTime, end: NaiveTime },
    /// Only the total number of hours matters.
    Flexible { total_hours: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulePolicy {
    pub mode: ScheduleMode,
    pub working_days: WorkingDays,
    /// Grace period applied to arrival and departure variance.
    pub flex_allowance_minutes: i64,
}

impl SchedulePolicy {
    pub fn fixed(
        start: NaiveTime,
        end: NaiveTime,
        working_days: WorkingDays,
        flex_allowance_minutes: i64,
    ) -> Self {
        Self {
            mode: ScheduleMode::Fixed { start, end },
            working_days,
            flex_allowance_minutes,
        }
    }

    pub fn flexible(total_hours: f64, working_days: WorkingDays, flex_allowance_minutes: i64) -> Self {
        Self {
            mode: ScheduleMode::Flexible { total_hours },
            working_days,
            flex_allowance_minutes,
        }
    }

    pub fn is_flexible(&self) -> bool {
        matches!(self.mode, ScheduleMode::Flexible { .. })
    }

    /// Reject policies whose numbers make no sense for a working day.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.flex_allowance_minutes < 0 {
            return Err(EngineError::invalid_schedule(
                "flex allowance must not be negative",
            ));
        }

        match self.mode {
            ScheduleMode::Fixed { start, end } if start == end => Err(
                EngineError::invalid_schedule("start and end time must differ"),
            ),
            ScheduleMode::Flexible { total_hours }
                if !total_hours.is_finite() || total_hours <= 0.0 || total_hours > 24.0 =>
            {
                Err(EngineError::invalid_schedule(
                    "total work hours must be within (0, 24]",
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Length of a fixed shift, adding a day when it wraps past midnight.
pub fn shift_span(start: NaiveTime, end: NaiveTime) -> Duration {
    let span = end.signed_duration_since(start);
    if end < start {
        span + Duration::hours(24)
    } else {
        span
    }
}

pub fn is_working_day(policy: &SchedulePolicy, weekday: Weekday) -> bool {
    policy.working_days.contains(weekday)
}

/// Expected hours for `date`, ignoring calendar overrides.
pub fn expected_work_hours(policy: &SchedulePolicy, date: NaiveDate) -> f64 {
    if !is_working_day(policy, date.weekday()) {
        return 0.0;
    }

    match policy.mode {
        ScheduleMode::Flexible { total_hours } => total_hours,
        ScheduleMode::Fixed { start, end } => hours(shift_span(start, end)),
    }
}

/// Expected hours for `date` once the calendar override for that day is applied.
pub fn adjusted_expected_hours(policy: &SchedulePolicy, date: NaiveDate, day: DayKind) -> f64 {
    if day.is_holiday() {
        return 0.0;
    }

    let base = expected_work_hours(policy, date);
    if day.is_short_day() {
        base * SHORT_DAY_FACTOR
    } else {
        base
    }
}

pub(crate) fn hours(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn office() -> SchedulePolicy {
        SchedulePolicy::fixed(t(9, 0), t(17, 0), WorkingDays::WEEKDAYS, 15)
    }

    #[test]
    fn non_working_day_expects_nothing() {
        // 2025-01-04 is a Saturday
        let sat = day(2025, 1, 4);
        assert_eq!(expected_work_hours(&office(), sat), 0.0);

        let flex = SchedulePolicy::flexible(8.0, WorkingDays::WEEKDAYS, 0);
        assert_eq!(expected_work_hours(&flex, sat), 0.0);
    }

    #[test]
    fn flexible_schedule_uses_total_hours_on_any_working_day() {
        let flex = SchedulePolicy::flexible(7.5, WorkingDays([true; 7]), 0);
        for d in 1..=14 {
            assert_eq!(expected_work_hours(&flex, day(2025, 3, d)), 7.5);
        }
    }

    #[test]
    fn fixed_schedule_is_hour_difference() {
        // Monday
        assert_eq!(expected_work_hours(&office(), day(2025, 1, 6)), 8.0);

        let half = SchedulePolicy::fixed(t(8, 30), t(13, 0), WorkingDays::WEEKDAYS, 0);
        assert_eq!(expected_work_hours(&half, day(2025, 1, 6)), 4.5);
    }

    #[test]
    fn night_shift_wraps_past_midnight() {
        let night = SchedulePolicy::fixed(t(22, 0), t(6, 0), WorkingDays::WEEKDAYS, 10);
        assert_eq!(expected_work_hours(&night, day(2025, 1, 6)), 8.0);
        assert_eq!(shift_span(t(22, 0), t(6, 0)), Duration::hours(8));
    }

    #[test]
    fn calendar_overrides_scale_or_zero_hours() {
        let mon = day(2025, 1, 6);
        assert_eq!(adjusted_expected_hours(&office(), mon, DayKind::Regular), 8.0);
        assert!((adjusted_expected_hours(&office(), mon, DayKind::ShortDay) - 4.8).abs() < 1e-9);
        assert_eq!(adjusted_expected_hours(&office(), mon, DayKind::Holiday), 0.0);
        assert_eq!(adjusted_expected_hours(&office(), mon, DayKind::NonWorkingDay), 0.0);
    }

    #[test]
    fn working_day_mask_round_trips_and_rejects_garbage() {
        let days = WorkingDays::parse_mask("1111110").unwrap();
        assert!(days.contains(Weekday::Sat));
        assert!(!days.contains(Weekday::Sun));
        assert_eq!(days.to_mask(), "1111110");

        assert!(matches!(
            WorkingDays::parse_mask("11111"),
            Err(EngineError::UnmappedWeekday { .. })
        ));
        assert!(matches!(
            WorkingDays::parse_mask("11x1100"),
            Err(EngineError::UnmappedWeekday { .. })
        ));
        assert!(WorkingDays::from_flags(&[true; 8]).is_err());
    }

    #[test]
    fn validate_rejects_degenerate_policies() {
        assert!(office().validate().is_ok());
        assert!(SchedulePolicy::fixed(t(9, 0), t(9, 0), WorkingDays::WEEKDAYS, 0)
            .validate()
            .is_err());
        assert!(SchedulePolicy::flexible(0.0, WorkingDays::WEEKDAYS, 0)
            .validate()
            .is_err());
        assert!(SchedulePolicy::fixed(t(9, 0), t(17, 0), WorkingDays::WEEKDAYS, -1)
            .validate()
            .is_err());
    }
}
