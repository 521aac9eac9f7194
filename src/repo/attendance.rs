use chrono::{NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;

use crate::engine::AttendanceVerdict;
use crate::model::attendance::Attendance;

const COLUMNS: &str = "id, employee_id, date, check_in_time, check_out_time, \
     work_duration_minutes, is_complete, is_late_arrival, is_early_departure, is_overtime, \
     is_early_arrival, late_minutes, early_departure_minutes, overtime_minutes, \
     early_arrival_minutes, is_flexible_schedule, expected_work_hours, attendance_code, notes";

pub async fn find(pool: &MySqlPool, attendance_id: u64) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!("SELECT {COLUMNS} FROM attendance WHERE id = ?"))
        .bind(attendance_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_day(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<Option<Attendance>, sqlx::Error> {
    sqlx::query_as::<_, Attendance>(&format!(
        "SELECT {COLUMNS} FROM attendance WHERE employee_id = ? AND date = ?"
    ))
    .bind(employee_id)
    .bind(date)
    .fetch_optional(pool)
    .await
}

/// Store a check-in. Returns false when the day already has one.
///
/// The connection reports matched rows rather than changed rows, so the write
/// is split: a fresh day is inserted, and an existing day (e.g. a pre-written
/// absence) only takes the punch while its check-in is still empty.
pub async fn record_check_in(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    at: NaiveDateTime,
) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query(
        r#"
        INSERT IGNORE INTO attendance (employee_id, date, check_in_time, attendance_code)
        VALUES (?, ?, ?, 'W')
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(at)
    .execute(pool)
    .await?;

    if inserted.rows_affected() > 0 {
        return Ok(true);
    }

    let filled = sqlx::query(
        r#"
        UPDATE attendance
        SET check_in_time = ?, attendance_code = 'W'
        WHERE employee_id = ?
        AND date = ?
        AND check_in_time IS NULL
        "#,
    )
    .bind(at)
    .bind(employee_id)
    .bind(date)
    .execute(pool)
    .await?;

    Ok(filled.rows_affected() > 0)
}

/// Store a check-out against an open check-in. Returns false when there is none.
pub async fn record_check_out(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    at: NaiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET check_out_time = ?
        WHERE employee_id = ?
        AND date = ?
        AND check_in_time IS NOT NULL
        AND check_out_time IS NULL
        "#,
    )
    .bind(at)
    .bind(employee_id)
    .bind(date)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Write the verdict for (employee, date), replacing any earlier one.
pub async fn upsert(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    verdict: &AttendanceVerdict,
    notes: Option<&str>,
) -> Result<Attendance, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO attendance (
            employee_id, date, check_in_time, check_out_time, work_duration_minutes,
            is_complete, is_late_arrival, is_early_departure, is_overtime, is_early_arrival,
            late_minutes, early_departure_minutes, overtime_minutes, early_arrival_minutes,
            is_flexible_schedule, expected_work_hours, attendance_code, notes
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            check_in_time = VALUES(check_in_time),
            check_out_time = VALUES(check_out_time),
            work_duration_minutes = VALUES(work_duration_minutes),
            is_complete = VALUES(is_complete),
            is_late_arrival = VALUES(is_late_arrival),
            is_early_departure = VALUES(is_early_departure),
            is_overtime = VALUES(is_overtime),
            is_early_arrival = VALUES(is_early_arrival),
            late_minutes = VALUES(late_minutes),
            early_departure_minutes = VALUES(early_departure_minutes),
            overtime_minutes = VALUES(overtime_minutes),
            early_arrival_minutes = VALUES(early_arrival_minutes),
            is_flexible_schedule = VALUES(is_flexible_schedule),
            expected_work_hours = VALUES(expected_work_hours),
            attendance_code = VALUES(attendance_code),
            notes = VALUES(notes)
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(check_in)
    .bind(check_out)
    .bind(verdict.work_duration_minutes())
    .bind(verdict.is_complete)
    .bind(verdict.is_late_arrival)
    .bind(verdict.is_early_departure)
    .bind(verdict.is_overtime)
    .bind(verdict.is_early_arrival)
    .bind(verdict.late_minutes)
    .bind(verdict.early_departure_minutes)
    .bind(verdict.overtime_minutes)
    .bind(verdict.early_arrival_minutes)
    .bind(verdict.is_flexible_schedule)
    .bind(verdict.expected_work_hours)
    .bind(verdict.attendance_code.as_ref())
    .bind(notes)
    .execute(pool)
    .await?;

    find_by_day(pool, employee_id, date)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

/// Remove a row for a day that has no punches, e.g. an absence later declared a holiday.
pub async fn delete_unpunched(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM attendance
        WHERE employee_id = ?
        AND date = ?
        AND check_in_time IS NULL
        AND check_out_time IS NULL
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[derive(Debug, Default)]
pub struct AttendanceFilter<'a> {
    pub employee_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub code: Option<&'a str>,
}

// typed binding for the dynamic WHERE clause
enum FilterValue<'a> {
    U64(u64),
    Date(NaiveDate),
    Str(&'a str),
}

/// Page through attendance rows, newest first. Returns the page and the total count.
pub async fn list(
    pool: &MySqlPool,
    filter: &AttendanceFilter<'_>,
    limit: u32,
    offset: u32,
) -> Result<(Vec<Attendance>, i64), sqlx::Error> {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(employee_id) = filter.employee_id {
        conditions.push("employee_id = ?");
        values.push(FilterValue::U64(employee_id));
    }
    if let Some(from) = filter.from {
        conditions.push("date >= ?");
        values.push(FilterValue::Date(from));
    }
    if let Some(to) = filter.to {
        conditions.push("date <= ?");
        values.push(FilterValue::Date(to));
    }
    if let Some(code) = filter.code {
        conditions.push("attendance_code = ?");
        values.push(FilterValue::Str(code));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!("SELECT COUNT(*) FROM attendance {where_clause}");
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for v in &values {
        count_query = match v {
            FilterValue::U64(n) => count_query.bind(*n),
            FilterValue::Date(d) => count_query.bind(*d),
            FilterValue::Str(s) => count_query.bind(*s),
        };
    }
    let total = count_query.fetch_one(pool).await?;

    let data_sql = format!(
        "SELECT {COLUMNS} FROM attendance {where_clause} \
         ORDER BY date DESC, employee_id LIMIT ? OFFSET ?"
    );
    let mut data_query = sqlx::query_as::<_, Attendance>(&data_sql);
    for v in &values {
        data_query = match v {
            FilterValue::U64(n) => data_query.bind(*n),
            FilterValue::Date(d) => data_query.bind(*d),
            FilterValue::Str(s) => data_query.bind(*s),
        };
    }
    let rows = data_query
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(pool)
        .await?;

    Ok((rows, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    async fn test_pool() -> MySqlPool {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let pool = crate::db::init_db(&url).await.unwrap();
        crate::db::run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed_employee(pool: &MySqlPool) -> u64 {
        let code = uuid::Uuid::new_v4().to_string()[..12].to_string();
        sqlx::query("INSERT IGNORE INTO departments (name) VALUES ('Attendance tests')")
            .execute(pool)
            .await
            .unwrap();
        let department_id: u64 =
            sqlx::query_scalar("SELECT id FROM departments WHERE name = 'Attendance tests'")
                .fetch_one(pool)
                .await
                .unwrap();

        sqlx::query(
            r#"
            INSERT INTO employees (employee_code, first_name, last_name, email, department_id, hire_date)
            VALUES (?, 'Test', 'Employee', ?, ?, '2025-01-01')
            "#,
        )
        .bind(&code)
        .bind(format!("{code}@attendance.test"))
        .bind(department_id)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_id()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    #[actix_web::test]
    #[ignore = "needs a MySQL database in TEST_DATABASE_URL"]
    async fn second_check_in_on_the_same_day_is_refused() {
        let pool = test_pool().await;
        let employee_id = seed_employee(&pool).await;
        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();

        assert!(record_check_in(&pool, employee_id, date, at(date, 9, 0)).await.unwrap());
        assert!(!record_check_in(&pool, employee_id, date, at(date, 9, 30)).await.unwrap());

        let row = find_by_day(&pool, employee_id, date).await.unwrap().unwrap();
        assert_eq!(row.check_in_time, Some(at(date, 9, 0)));
    }

    #[actix_web::test]
    #[ignore = "needs a MySQL database in TEST_DATABASE_URL"]
    async fn check_in_fills_a_stored_absence() {
        let pool = test_pool().await;
        let employee_id = seed_employee(&pool).await;
        let date = NaiveDate::from_ymd_opt(2025, 1, 7).unwrap();

        sqlx::query("INSERT INTO attendance (employee_id, date, attendance_code) VALUES (?, ?, 'A')")
            .bind(employee_id)
            .bind(date)
            .execute(&pool)
            .await
            .unwrap();

        assert!(record_check_in(&pool, employee_id, date, at(date, 8, 55)).await.unwrap());

        let row = find_by_day(&pool, employee_id, date).await.unwrap().unwrap();
        assert_eq!(row.check_in_time, Some(at(date, 8, 55)));
        assert_eq!(row.attendance_code, "W");
    }
}
