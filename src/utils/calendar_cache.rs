use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use futures_util::future::try_join_all;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;

use crate::engine::{CalendarEntryType, CalendarSnapshot, DayKind, HolidayCalendar};
use crate::model::work_calendar::WorkCalendarEntry;
use crate::repo;

/// One snapshot per calendar year.
pub static CALENDAR_CACHE: Lazy<Cache<i32, Arc<CalendarSnapshot>>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(16)
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

/// Bumped by every invalidation. A load only lands in the cache when no
/// invalidation happened while it was reading the database.
static GENERATION: AtomicU64 = AtomicU64::new(0);

/// Build a snapshot, skipping entries whose type is unknown.
pub fn snapshot(entries: &[WorkCalendarEntry]) -> CalendarSnapshot {
    let mut calendar = CalendarSnapshot::new();
    for entry in entries {
        match CalendarEntryType::from_str(&entry.entry_type) {
            Ok(kind) => calendar.add(entry.entry_date, kind, entry.is_recurring_annually),
            Err(_) => tracing::warn!(
                entry_id = entry.id,
                entry_type = %entry.entry_type,
                "Skipping calendar entry with unknown type"
            ),
        }
    }
    calendar
}

pub async fn calendar_for_year(pool: &MySqlPool, year: i32) -> Result<Arc<CalendarSnapshot>, sqlx::Error> {
    if let Some(calendar) = CALENDAR_CACHE.get(&year).await {
        return Ok(calendar);
    }

    let generation = GENERATION.load(Ordering::SeqCst);
    let entries = repo::calendar::entries_for_year(pool, year).await?;
    let calendar = Arc::new(snapshot(&entries));

    if !store(year, calendar.clone(), generation).await {
        tracing::debug!(year, "Calendar changed during load; not caching");
    }
    Ok(calendar)
}

// Returns false when the snapshot was read before the latest invalidation.
async fn store(year: i32, calendar: Arc<CalendarSnapshot>, generation: u64) -> bool {
    if GENERATION.load(Ordering::SeqCst) != generation {
        return false;
    }

    CALENDAR_CACHE.insert(year, calendar).await;

    if GENERATION.load(Ordering::SeqCst) != generation {
        CALENDAR_CACHE.invalidate(&year).await;
        return false;
    }
    true
}

pub async fn day_kind(pool: &MySqlPool, date: NaiveDate) -> Result<DayKind, sqlx::Error> {
    Ok(calendar_for_year(pool, date.year()).await?.day_kind(date))
}

/// Drop every cached year after a calendar edit.
pub fn invalidate() {
    GENERATION.fetch_add(1, Ordering::SeqCst);
    CALENDAR_CACHE.invalidate_all();
}

/// Load the given years up front.
pub async fn warmup_calendar_cache(pool: &MySqlPool, years: &[i32]) -> Result<()> {
    let calendars =
        try_join_all(years.iter().map(|&year| calendar_for_year(pool, year))).await?;
    let total_entries: usize = calendars.iter().map(|calendar| calendar.len()).sum();

    if calendars.iter().all(|calendar| calendar.is_empty()) {
        log::warn!("Work calendar has no entries; no holidays or short days will apply");
    }

    log::info!(
        "Calendar cache warmup complete: {} entries across {} years",
        total_entries,
        years.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, date: NaiveDate, kind: &str, recurring: bool) -> WorkCalendarEntry {
        WorkCalendarEntry {
            id,
            entry_date: date,
            entry_type: kind.to_string(),
            is_recurring_annually: recurring,
            description: None,
        }
    }

    #[test]
    fn snapshot_skips_unknown_entry_types() {
        let new_year = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let eve = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let odd = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();

        let calendar = snapshot(&[
            entry(1, new_year, "holiday", true),
            entry(2, eve, "short_day", false),
            entry(3, odd, "festival", false),
        ]);

        assert_eq!(calendar.len(), 2);
        assert!(calendar.is_holiday(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
        assert!(calendar.is_short_day(eve));
        assert_eq!(calendar.day_kind(odd), DayKind::Regular);
    }

    #[actix_web::test]
    async fn invalidate_drops_cached_years() {
        let mut calendar = CalendarSnapshot::new();
        calendar.add(
            NaiveDate::from_ymd_opt(1999, 7, 4).unwrap(),
            CalendarEntryType::Holiday,
            false,
        );
        CALENDAR_CACHE.insert(1999, Arc::new(calendar)).await;

        let cached = CALENDAR_CACHE.get(&1999).await.unwrap();
        assert!(cached.is_holiday(NaiveDate::from_ymd_opt(1999, 7, 4).unwrap()));

        invalidate();
        assert!(CALENDAR_CACHE.get(&1999).await.is_none());
    }

    #[actix_web::test]
    async fn snapshot_read_before_an_edit_is_not_cached() {
        let mut calendar = CalendarSnapshot::new();
        calendar.add(
            NaiveDate::from_ymd_opt(1987, 5, 1).unwrap(),
            CalendarEntryType::Holiday,
            false,
        );

        // a load that started before the last invalidation
        let stale = GENERATION.load(Ordering::SeqCst).wrapping_sub(1);
        assert!(!store(1987, Arc::new(calendar), stale).await);
        assert!(CALENDAR_CACHE.get(&1987).await.is_none());
    }
}
