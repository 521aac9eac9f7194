use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::engine::{AttendanceCode, AttendanceVerdict};

/// One row per employee per date.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,
    pub date: NaiveDate,
    pub check_in_time: Option<NaiveDateTime>,
    pub check_out_time: Option<NaiveDateTime>,
    pub work_duration_minutes: Option<i64>,
    pub is_complete: bool,
    pub is_late_arrival: bool,
    pub is_early_departure: bool,
    pub is_overtime: bool,
    pub is_early_arrival: bool,
    pub late_minutes: Option<i64>,
    pub early_departure_minutes: Option<i64>,
    pub overtime_minutes: Option<i64>,
    pub early_arrival_minutes: Option<i64>,
    pub is_flexible_schedule: bool,
    pub expected_work_hours: f64,
    pub attendance_code: String,
    pub notes: Option<String>,
}

impl Attendance {
    /// Rebuild the verdict stored in this row, for display purposes.
    ///
    /// Duration comes from the punch times when both exist so the half-day
    /// check sees seconds, not the rounded minute column.
    pub fn verdict(&self) -> Result<AttendanceVerdict, strum::ParseError> {
        let work_duration = match (self.check_in_time, self.check_out_time) {
            (Some(check_in), Some(check_out)) => Some(check_out - check_in),
            _ => self.work_duration_minutes.map(Duration::minutes),
        };

        Ok(AttendanceVerdict {
            is_complete: self.is_complete,
            is_late_arrival: self.is_late_arrival,
            is_early_departure: self.is_early_departure,
            is_overtime: self.is_overtime,
            is_early_arrival: self.is_early_arrival,
            late_minutes: self.late_minutes,
            early_departure_minutes: self.early_departure_minutes,
            overtime_minutes: self.overtime_minutes,
            early_arrival_minutes: self.early_arrival_minutes,
            work_duration,
            is_flexible_schedule: self.is_flexible_schedule,
            expected_work_hours: self.expected_work_hours,
            attendance_code: AttendanceCode::from_str(&self.attendance_code)?,
        })
    }
}
