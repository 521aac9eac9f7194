use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::error::EngineError;
use super::schedule::{SHORT_DAY_FACTOR, hours, shift_span};
use super::status::{AttendanceCode, DisplayStatus, display_status};

/// Worked hours above `expected * OVERTIME_BAND` count as overtime on flexible days.
pub const OVERTIME_BAND: f64 = 1.05;
/// Worked hours below `expected * UNDERTIME_BAND` count as leaving early on flexible days.
pub const UNDERTIME_BAND: f64 = 0.95;

/// Rules the classifier applies to a complete day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Only total hours are compared against the expectation.
    Flexible,
    /// Arrival and departure are compared against the scheduled times.
    Fixed {
        start: NaiveTime,
        end: NaiveTime,
        flex_allowance_minutes: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationInput {
    /// Day the attendance belongs to; fixed schedules start on this date.
    pub work_date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub expected_work_hours: f64,
    pub mode: EvaluationMode,
    pub is_short_day: bool,
}

impl ClassificationInput {
    pub fn is_flexible_schedule(&self) -> bool {
        matches!(self.mode, EvaluationMode::Flexible)
    }
}

/// Outcome of classifying one employee-day.
///
/// Each `*_minutes` field is `Some` exactly when its flag is set.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceVerdict {
    pub is_complete: bool,
    pub is_late_arrival: bool,
    pub is_early_departure: bool,
    pub is_overtime: bool,
    pub is_early_arrival: bool,
    pub late_minutes: Option<i64>,
    pub early_departure_minutes: Option<i64>,
    pub overtime_minutes: Option<i64>,
    pub early_arrival_minutes: Option<i64>,
    pub work_duration: Option<Duration>,
    pub is_flexible_schedule: bool,
    pub expected_work_hours: f64,
    pub attendance_code: AttendanceCode,
}

impl AttendanceVerdict {
    fn empty(input: &ClassificationInput, code: AttendanceCode) -> Self {
        Self {
            is_complete: false,
            is_late_arrival: false,
            is_early_departure: false,
            is_overtime: false,
            is_early_arrival: false,
            late_minutes: None,
            early_departure_minutes: None,
            overtime_minutes: None,
            early_arrival_minutes: None,
            work_duration: None,
            is_flexible_schedule: input.is_flexible_schedule(),
            expected_work_hours: input.expected_work_hours,
            attendance_code: code,
        }
    }

    pub fn display_status(&self) -> DisplayStatus {
        display_status(self)
    }

    pub fn work_duration_minutes(&self) -> Option<i64> {
        self.work_duration.map(|d| d.num_minutes())
    }

    fn mark_late(&mut self, minutes: i64) {
        self.is_late_arrival = true;
        self.late_minutes = Some(minutes);
    }

    fn mark_early_departure(&mut self, minutes: i64) {
        self.is_early_departure = true;
        self.early_departure_minutes = Some(minutes);
    }

    fn mark_overtime(&mut self, minutes: i64) {
        self.is_overtime = true;
        self.overtime_minutes = Some(minutes);
    }

    fn mark_early_arrival(&mut self, minutes: i64) {
        self.is_early_arrival = true;
        self.early_arrival_minutes = Some(minutes);
    }
}

/// Classify one day of punches.
pub fn classify(input: &ClassificationInput) -> Result<AttendanceVerdict, EngineError> {
    let (check_in, check_out) = match (input.check_in, input.check_out) {
        (None, None) => return Ok(AttendanceVerdict::empty(input, AttendanceCode::Absent)),
        (Some(_), None) => return Ok(AttendanceVerdict::empty(input, AttendanceCode::Working)),
        (None, Some(check_out)) => return Err(EngineError::OrphanCheckOut { check_out }),
        (Some(check_in), Some(check_out)) => (check_in, check_out),
    };

    if check_out < check_in {
        return Err(EngineError::InvalidTimeOrdering {
            check_in,
            check_out,
        });
    }

    let mut verdict = AttendanceVerdict::empty(input, AttendanceCode::Present);
    let worked = check_out - check_in;
    verdict.is_complete = true;
    verdict.work_duration = Some(worked);

    match input.mode {
        EvaluationMode::Flexible => {
            classify_flexible(&mut verdict, worked, input.expected_work_hours)
        }
        EvaluationMode::Fixed {
            start,
            end,
            flex_allowance_minutes,
        } => {
            let span = shift_span(start, end);
            let span = if input.is_short_day {
                Duration::seconds((span.num_seconds() as f64 * SHORT_DAY_FACTOR).round() as i64)
            } else {
                span
            };
            let scheduled_start = input.work_date.and_time(start);
            let scheduled_end = scheduled_start + span;

            classify_fixed(
                &mut verdict,
                (check_in - scheduled_start).num_minutes(),
                (check_out - scheduled_end).num_minutes(),
                flex_allowance_minutes,
            )
        }
    }

    Ok(verdict)
}

fn classify_flexible(verdict: &mut AttendanceVerdict, worked: Duration, expected: f64) {
    let actual = hours(worked);

    if actual > expected * OVERTIME_BAND {
        verdict.mark_overtime(to_minutes(actual - expected));
    } else if actual < expected * UNDERTIME_BAND {
        verdict.mark_early_departure(to_minutes(expected - actual));
    }

    verdict.attendance_code = if verdict.is_overtime {
        AttendanceCode::Overtime
    } else {
        AttendanceCode::Present
    };
}

fn classify_fixed(verdict: &mut AttendanceVerdict, arrival: i64, departure: i64, allowance: i64) {
    if arrival > allowance {
        verdict.mark_late(arrival - allowance);
    } else if arrival < -allowance {
        verdict.mark_early_arrival(-arrival - allowance);
    }

    if departure < -allowance {
        verdict.mark_early_departure(-departure - allowance);
    } else if departure > allowance {
        verdict.mark_overtime(departure - allowance);
    }

    verdict.attendance_code = match (verdict.is_late_arrival, verdict.is_early_departure) {
        (true, true) => AttendanceCode::LateAndEarlyDeparture,
        (true, false) => AttendanceCode::Late,
        (false, true) => AttendanceCode::EarlyDeparture,
        _ if verdict.is_overtime => AttendanceCode::Overtime,
        _ if verdict.is_early_arrival => AttendanceCode::EarlyArrival,
        _ => AttendanceCode::Present,
    };
}

fn to_minutes(hours: f64) -> i64 {
    (hours * 60.0).round() as i64
}
