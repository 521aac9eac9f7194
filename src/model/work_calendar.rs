use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkCalendarEntry {
    pub id: u64,
    pub entry_date: NaiveDate,
    /// `holiday`, `non_working_day` or `short_day`
    pub entry_type: String,
    pub is_recurring_annually: bool,
    pub description: Option<String>,
}
