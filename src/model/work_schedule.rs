use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::{EngineError, SchedulePolicy, WorkingDays};

/// `work_schedules` row. Which of the time/hour columns matter depends on `is_flexible`,
/// so rows are turned into a [`SchedulePolicy`] before anything reads them.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkSchedule {
    pub id: u64,
    pub name: String,
    pub is_flexible: bool,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub total_work_hours: Option<f64>,
    pub working_days: String,
    pub flex_allowance_minutes: i64,
    pub department_id: Option<u64>,
}

impl WorkSchedule {
    pub fn policy(&self) -> Result<SchedulePolicy, EngineError> {
        policy_from_parts(
            self.is_flexible,
            self.start_time,
            self.end_time,
            self.total_work_hours,
            WorkingDays::parse_mask(&self.working_days)?,
            self.flex_allowance_minutes,
        )
        .map_err(|e| match e {
            EngineError::InvalidSchedule { message } => {
                EngineError::invalid_schedule(format!("schedule {}: {message}", self.id))
            }
            other => other,
        })
    }
}

/// Build a validated policy from the flag-plus-optional-fields shape used in
/// storage and request bodies.
pub fn policy_from_parts(
    is_flexible: bool,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    total_work_hours: Option<f64>,
    working_days: WorkingDays,
    flex_allowance_minutes: i64,
) -> Result<SchedulePolicy, EngineError> {
    let policy = if is_flexible {
        let total = total_work_hours.ok_or_else(|| {
            EngineError::invalid_schedule("flexible schedule has no total work hours")
        })?;
        SchedulePolicy::flexible(total, working_days, flex_allowance_minutes)
    } else {
        match (start_time, end_time) {
            (Some(start), Some(end)) => {
                SchedulePolicy::fixed(start, end, working_days, flex_allowance_minutes)
            }
            _ => {
                return Err(EngineError::invalid_schedule(
                    "fixed schedule is missing start or end time",
                ));
            }
        }
    };

    policy.validate()?;
    Ok(policy)
}

fn weekdays() -> Vec<bool> {
    WorkingDays::WEEKDAYS.flags().to_vec()
}

/// Schedule rules as they arrive in request bodies.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ScheduleRules {
    #[schema(example = false)]
    pub is_flexible: bool,

    #[schema(example = "09:00:00", value_type = Option<String>, format = "time")]
    pub start_time: Option<NaiveTime>,

    #[schema(example = "17:00:00", value_type = Option<String>, format = "time")]
    pub end_time: Option<NaiveTime>,

    /// Required when `is_flexible` is set
    #[schema(example = 8.0)]
    pub total_work_hours: Option<f64>,

    /// Seven flags, Monday first
    #[serde(default = "weekdays")]
    #[schema(example = json!([true, true, true, true, true, false, false]))]
    pub working_days: Vec<bool>,

    #[serde(default)]
    #[schema(example = 15)]
    pub flex_allowance_minutes: i64,
}

impl ScheduleRules {
    pub fn policy(&self) -> Result<SchedulePolicy, EngineError> {
        policy_from_parts(
            self.is_flexible,
            self.start_time,
            self.end_time,
            self.total_work_hours,
            WorkingDays::from_flags(&self.working_days)?,
            self.flex_allowance_minutes,
        )
    }

    pub fn working_days_mask(&self) -> Result<String, EngineError> {
        Ok(WorkingDays::from_flags(&self.working_days)?.to_mask())
    }
}

impl From<&WorkSchedule> for ScheduleRules {
    fn from(row: &WorkSchedule) -> Self {
        let working_days = WorkingDays::parse_mask(&row.working_days)
            .map(|days| days.flags().to_vec())
            .unwrap_or_default();

        Self {
            is_flexible: row.is_flexible,
            start_time: row.start_time,
            end_time: row.end_time,
            total_work_hours: row.total_work_hours,
            working_days,
            flex_allowance_minutes: row.flex_allowance_minutes,
        }
    }
}
