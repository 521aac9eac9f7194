use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::model::employee::Employee;

pub async fn find(pool: &MySqlPool, employee_id: u64) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        r#"
        SELECT
            id,
            employee_code,
            first_name,
            last_name,
            email,
            phone,
            department_id,
            hire_date,
            status,
            is_flexible_hours,
            required_work_hours_per_day,
            work_schedule_id
        FROM employees
        WHERE id = ?
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool)
    .await
}

pub async fn active_ids(pool: &MySqlPool) -> Result<Vec<u64>, sqlx::Error> {
    sqlx::query_scalar::<_, u64>("SELECT id FROM employees WHERE status = 'active' ORDER BY id")
        .fetch_all(pool)
        .await
}

/// Column values of a new employee.
pub struct NewEmployee<'a> {
    pub employee_code: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub department_id: u64,
    pub hire_date: NaiveDate,
    pub is_flexible_hours: bool,
    pub required_work_hours_per_day: f64,
    pub work_schedule_id: Option<u64>,
}

pub async fn insert(pool: &MySqlPool, employee: &NewEmployee<'_>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, first_name, last_name, email, phone, department_id, hire_date,
         is_flexible_hours, required_work_hours_per_day, work_schedule_id)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee.employee_code)
    .bind(employee.first_name)
    .bind(employee.last_name)
    .bind(employee.email)
    .bind(employee.phone)
    .bind(employee.department_id)
    .bind(employee.hire_date)
    .bind(employee.is_flexible_hours)
    .bind(employee.required_work_hours_per_day)
    .bind(employee.work_schedule_id)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

/// Change how an employee's days are judged. Returns false when the employee does not exist.
pub async fn update_schedule(
    pool: &MySqlPool,
    employee_id: u64,
    work_schedule_id: Option<u64>,
    is_flexible_hours: bool,
    required_work_hours_per_day: f64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE employees
        SET work_schedule_id = ?, is_flexible_hours = ?, required_work_hours_per_day = ?
        WHERE id = ?
        "#,
    )
    .bind(work_schedule_id)
    .bind(is_flexible_hours)
    .bind(required_work_hours_per_day)
    .bind(employee_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
