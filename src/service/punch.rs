use std::future::Future;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

use crate::error::AppError;
use crate::repo;

/// One check-in/check-out pair for a day, already reduced from raw punches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayPunches {
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
}

impl DayPunches {
    pub fn is_empty(&self) -> bool {
        self.check_in.is_none() && self.check_out.is_none()
    }
}

/// Source of day punches for an employee.
pub trait PunchReader {
    fn day_punches(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> impl Future<Output = Result<DayPunches, AppError>> + Send;
}

/// Reads the pair kept on the attendance row by the check-in/check-out endpoints.
#[derive(Clone)]
pub struct MySqlPunchReader {
    pool: MySqlPool,
}

impl MySqlPunchReader {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl PunchReader for MySqlPunchReader {
    async fn day_punches(&self, employee_id: u64, date: NaiveDate) -> Result<DayPunches, AppError> {
        let row = repo::attendance::find_by_day(&self.pool, employee_id, date).await?;

        Ok(row
            .map(|a| DayPunches {
                check_in: a.check_in_time,
                check_out: a.check_out_time,
            })
            .unwrap_or_default())
    }
}
