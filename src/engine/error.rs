use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Errors raised while evaluating schedules or classifying a day.
///
/// The engine only reports these; it never logs or retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Check-out precedes check-in
    #[error("check-out {check_out} precedes check-in {check_in}")]
    InvalidTimeOrdering {
        check_in: NaiveDateTime,
        check_out: NaiveDateTime,
    },

    /// A check-out was supplied without a check-in
    #[error("check-out {check_out} has no matching check-in")]
    OrphanCheckOut { check_out: NaiveDateTime },

    /// No fixed or flexible schedule resolvable for the employee
    #[error("no work schedule resolvable for employee {employee_id} on {date}")]
    MissingSchedule { employee_id: u64, date: NaiveDate },

    /// Working-day flags that cannot be mapped onto the seven weekdays
    #[error("working days {mask:?} do not map onto seven weekdays")]
    UnmappedWeekday { mask: String },

    /// Schedule fields inconsistent with its mode
    #[error("invalid schedule: {message}")]
    InvalidSchedule { message: String },
}

impl EngineError {
    pub fn invalid_schedule(message: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            message: message.into(),
        }
    }
}
