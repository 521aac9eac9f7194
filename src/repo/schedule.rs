use sqlx::MySqlPool;

use crate::model::employee::Employee;
use crate::model::work_schedule::{ScheduleRules, WorkSchedule};

pub(crate) const COLUMNS: &str = "id, name, is_flexible, start_time, end_time, total_work_hours, \
     working_days, flex_allowance_minutes, department_id";

pub async fn find(pool: &MySqlPool, schedule_id: u64) -> Result<Option<WorkSchedule>, sqlx::Error> {
    sqlx::query_as::<_, WorkSchedule>(&format!(
        "SELECT {COLUMNS} FROM work_schedules WHERE id = ?"
    ))
    .bind(schedule_id)
    .fetch_optional(pool)
    .await
}

/// Oldest schedule attached to the department.
pub async fn department_default(
    pool: &MySqlPool,
    department_id: u64,
) -> Result<Option<WorkSchedule>, sqlx::Error> {
    sqlx::query_as::<_, WorkSchedule>(&format!(
        "SELECT {COLUMNS} FROM work_schedules WHERE department_id = ? ORDER BY id LIMIT 1"
    ))
    .bind(department_id)
    .fetch_optional(pool)
    .await
}

/// Employee assignment first, department default otherwise.
pub async fn resolve_for_employee(
    pool: &MySqlPool,
    employee: &Employee,
) -> Result<Option<WorkSchedule>, sqlx::Error> {
    match employee.work_schedule_id {
        Some(schedule_id) => find(pool, schedule_id).await,
        None => department_default(pool, employee.department_id).await,
    }
}

pub async fn list(pool: &MySqlPool) -> Result<Vec<WorkSchedule>, sqlx::Error> {
    sqlx::query_as::<_, WorkSchedule>(&format!(
        "SELECT {COLUMNS} FROM work_schedules ORDER BY id"
    ))
    .fetch_all(pool)
    .await
}

/// Column values of a schedule about to be written.
pub struct ScheduleValues<'a> {
    pub name: &'a str,
    pub rules: &'a ScheduleRules,
    pub working_days: String,
    pub department_id: Option<u64>,
}

pub async fn insert(pool: &MySqlPool, values: &ScheduleValues<'_>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO work_schedules
        (name, is_flexible, start_time, end_time, total_work_hours, working_days,
         flex_allowance_minutes, department_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(values.name)
    .bind(values.rules.is_flexible)
    .bind(values.rules.start_time)
    .bind(values.rules.end_time)
    .bind(values.rules.total_work_hours)
    .bind(&values.working_days)
    .bind(values.rules.flex_allowance_minutes)
    .bind(values.department_id)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

/// Returns false when no schedule has that id.
pub async fn update(
    pool: &MySqlPool,
    schedule_id: u64,
    values: &ScheduleValues<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE work_schedules
        SET name = ?, is_flexible = ?, start_time = ?, end_time = ?, total_work_hours = ?,
            working_days = ?, flex_allowance_minutes = ?, department_id = ?
        WHERE id = ?
        "#,
    )
    .bind(values.name)
    .bind(values.rules.is_flexible)
    .bind(values.rules.start_time)
    .bind(values.rules.end_time)
    .bind(values.rules.total_work_hours)
    .bind(&values.working_days)
    .bind(values.rules.flex_allowance_minutes)
    .bind(values.department_id)
    .bind(schedule_id)
    .execute(pool)
    .await?;

    // rows_affected counts matched rows, so an unchanged update still reports 1
    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &MySqlPool, schedule_id: u64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM work_schedules WHERE id = ?")
        .bind(schedule_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Employees pinned to this schedule.
pub async fn assigned_employees(pool: &MySqlPool, schedule_id: u64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees WHERE work_schedule_id = ?")
        .bind(schedule_id)
        .fetch_one(pool)
        .await
}
