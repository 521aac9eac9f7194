use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::engine::CalendarEntryType;
use crate::model::work_calendar::WorkCalendarEntry;

pub(crate) const COLUMNS: &str = "id, entry_date, entry_type, is_recurring_annually, description";

/// Entries dated in `year` plus every recurring entry.
pub async fn entries_for_year(
    pool: &MySqlPool,
    year: i32,
) -> Result<Vec<WorkCalendarEntry>, sqlx::Error> {
    sqlx::query_as::<_, WorkCalendarEntry>(&format!(
        "SELECT {COLUMNS} FROM work_calendar \
         WHERE is_recurring_annually = TRUE OR YEAR(entry_date) = ? \
         ORDER BY entry_date"
    ))
    .bind(year)
    .fetch_all(pool)
    .await
}

pub async fn list(
    pool: &MySqlPool,
    year: Option<i32>,
) -> Result<Vec<WorkCalendarEntry>, sqlx::Error> {
    match year {
        Some(year) => entries_for_year(pool, year).await,
        None => {
            sqlx::query_as::<_, WorkCalendarEntry>(&format!(
                "SELECT {COLUMNS} FROM work_calendar ORDER BY entry_date"
            ))
            .fetch_all(pool)
            .await
        }
    }
}

pub async fn find(pool: &MySqlPool, entry_id: u64) -> Result<Option<WorkCalendarEntry>, sqlx::Error> {
    sqlx::query_as::<_, WorkCalendarEntry>(&format!(
        "SELECT {COLUMNS} FROM work_calendar WHERE id = ?"
    ))
    .bind(entry_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert(
    pool: &MySqlPool,
    entry_date: NaiveDate,
    entry_type: CalendarEntryType,
    is_recurring_annually: bool,
    description: Option<&str>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO work_calendar (entry_date, entry_type, is_recurring_annually, description)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(entry_date)
    .bind(entry_type.as_ref())
    .bind(is_recurring_annually)
    .bind(description)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

pub async fn delete(pool: &MySqlPool, entry_id: u64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM work_calendar WHERE id = ?")
        .bind(entry_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
