use chrono::{Datelike, Local, NaiveDate};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{Instrument, debug, info, info_span, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::engine::schedule::SHORT_DAY_FACTOR;
use crate::engine::{
    ClassificationInput, DayKind, EngineError, EvaluationMode, ScheduleMode, SchedulePolicy,
    adjusted_expected_hours, classify, is_working_day,
};
use crate::error::{AppError, AppResult};
use crate::model::attendance::Attendance;
use crate::repo;
use crate::service::punch::{DayPunches, PunchReader};
use crate::utils::calendar_cache;

/// What a given employee owes on a given date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayPlan {
    pub work_date: NaiveDate,
    pub mode: EvaluationMode,
    pub expected_work_hours: f64,
    pub day_kind: DayKind,
    /// False on weekly days off, holidays and declared non-working days.
    pub attendance_expected: bool,
}

impl DayPlan {
    pub fn input(&self, punches: DayPunches) -> ClassificationInput {
        // Time worked on an off day is judged against zero expected hours.
        let (mode, expected_work_hours) = if self.attendance_expected {
            (self.mode, self.expected_work_hours)
        } else {
            (EvaluationMode::Flexible, 0.0)
        };

        ClassificationInput {
            work_date: self.work_date,
            check_in: punches.check_in,
            check_out: punches.check_out,
            expected_work_hours,
            mode,
            is_short_day: self.day_kind.is_short_day(),
        }
    }

    pub fn notes(&self) -> Option<&'static str> {
        match self.day_kind {
            DayKind::Holiday => Some("Holiday"),
            DayKind::NonWorkingDay => Some("Non-working day"),
            DayKind::ShortDay => Some("Short day"),
            DayKind::Regular if !self.attendance_expected => Some("Weekly day off"),
            DayKind::Regular => None,
        }
    }
}

/// Combine schedule, employee settings and the calendar into a day plan.
///
/// `flexible_hours` is the employee's required daily hours when the employee
/// is flagged flexible; it beats a fixed schedule. Working days always come
/// from the schedule.
pub fn plan_day(
    policy: &SchedulePolicy,
    flexible_hours: Option<f64>,
    date: NaiveDate,
    day_kind: DayKind,
) -> DayPlan {
    let attendance_expected = is_working_day(policy, date.weekday()) && !day_kind.is_holiday();

    let mode = match (policy.mode, flexible_hours) {
        (ScheduleMode::Fixed { start, end }, None) => EvaluationMode::Fixed {
            start,
            end,
            flex_allowance_minutes: policy.flex_allowance_minutes,
        },
        _ => EvaluationMode::Flexible,
    };

    let expected_work_hours = match flexible_hours {
        None => adjusted_expected_hours(policy, date, day_kind),
        Some(_) if !attendance_expected => 0.0,
        Some(required) if day_kind.is_short_day() => required * SHORT_DAY_FACTOR,
        Some(required) => required,
    };

    DayPlan {
        work_date: date,
        mode,
        expected_work_hours,
        day_kind,
        attendance_expected,
    }
}

/// Classify one employee-day and persist the verdict.
///
/// Returns `None` when nothing is owed and nothing was punched; any stale
/// unpunched row for that day is removed. Days after today are refused.
#[instrument(skip(pool, reader))]
pub async fn evaluate_day<R: PunchReader>(
    pool: &MySqlPool,
    reader: &R,
    employee_id: u64,
    date: NaiveDate,
) -> AppResult<Option<Attendance>> {
    ensure_not_future(date, Local::now().date_naive())?;

    let employee = repo::employee::find(pool, employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee"))?;

    let schedule = repo::schedule::resolve_for_employee(pool, &employee)
        .await?
        .ok_or(EngineError::MissingSchedule { employee_id, date })?;
    let policy = schedule.policy()?;

    let day_kind = calendar_cache::day_kind(pool, date).await?;
    let plan = plan_day(&policy, employee.flexible_hours(), date, day_kind);
    let punches = reader.day_punches(employee_id, date).await?;

    if !plan.attendance_expected && punches.is_empty() {
        let removed = repo::attendance::delete_unpunched(pool, employee_id, date).await?;
        debug!(?day_kind, removed, "No attendance owed and nothing punched");
        return Ok(None);
    }

    let verdict = classify(&plan.input(punches))?;

    let row = repo::attendance::upsert(
        pool,
        employee_id,
        date,
        punches.check_in,
        punches.check_out,
        &verdict,
        plan.notes(),
    )
    .await?;

    debug!(
        schedule_id = schedule.id,
        flexible_schedule = policy.is_flexible(),
        code = verdict.attendance_code.as_ref(),
        expected_hours = verdict.expected_work_hours,
        "Attendance classified"
    );

    Ok(Some(row))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecalculationFailure {
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecalculationSummary {
    pub run_id: String,
    pub employees: usize,
    pub days: usize,
    /// Days a row was written for
    pub processed: usize,
    /// Days with nothing owed and nothing punched
    pub skipped: usize,
    pub failures: Vec<RecalculationFailure>,
}

/// Punch data for a day only exists once the day has started.
pub fn ensure_not_future(date: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if date > today {
        return Err(AppError::bad_request(format!(
            "{date} is in the future; attendance can only be evaluated up to {today}"
        )));
    }
    Ok(())
}

/// Number of days in `from..=to`, bounded by `max_days` and by `today`.
pub fn validate_range(
    from: NaiveDate,
    to: NaiveDate,
    today: NaiveDate,
    max_days: usize,
) -> AppResult<usize> {
    if to < from {
        return Err(AppError::bad_request("`from` must not be after `to`"));
    }
    ensure_not_future(to, today)?;

    let days = (to - from).num_days() as usize + 1;
    if days > max_days {
        return Err(AppError::bad_request(format!(
            "Range covers {days} days, at most {max_days} allowed"
        )));
    }

    Ok(days)
}

/// Re-run classification for every (employee, date) key in the range.
///
/// Keys are independent, so they run concurrently. Failures are collected
/// per key rather than aborting the batch.
pub async fn recalculate<R: PunchReader>(
    pool: &MySqlPool,
    reader: &R,
    from: NaiveDate,
    to: NaiveDate,
    employee_id: Option<u64>,
    max_days: usize,
    concurrency: usize,
) -> AppResult<RecalculationSummary> {
    let days = validate_range(from, to, Local::now().date_naive(), max_days)?;

    let employees = match employee_id {
        Some(id) => vec![id],
        None => repo::employee::active_ids(pool).await?,
    };

    let run_id = Uuid::new_v4().to_string();
    let span = info_span!("recalculate", run_id = %run_id);

    let keys: Vec<(u64, NaiveDate)> = employees
        .iter()
        .flat_map(|&employee_id| from.iter_days().take(days).map(move |d| (employee_id, d)))
        .collect();

    let results: Vec<_> = async {
        info!(employees = employees.len(), days, "Recalculation started");

        stream::iter(keys)
            .map(|(employee_id, date)| async move {
                (employee_id, date, evaluate_day(pool, reader, employee_id, date).await)
            })
            .buffer_unordered(concurrency.max(1))
            .collect::<Vec<_>>()
            .await
    }
    .instrument(span.clone())
    .await;

    let mut summary = RecalculationSummary {
        run_id,
        employees: employees.len(),
        days,
        processed: 0,
        skipped: 0,
        failures: Vec::new(),
    };

    for (employee_id, date, result) in results {
        match result {
            Ok(Some(_)) => summary.processed += 1,
            Ok(None) => summary.skipped += 1,
            Err(e) => {
                span.in_scope(|| warn!(employee_id, %date, error = %e, "Recalculation failed"));
                summary.failures.push(RecalculationFailure {
                    employee_id,
                    date,
                    message: e.to_string(),
                });
            }
        }
    }

    summary.failures.sort_by_key(|f| (f.employee_id, f.date));

    span.in_scope(|| {
        info!(
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failures.len(),
            "Recalculation finished"
        )
    });

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{AttendanceCode, WorkingDays};
    use chrono::{NaiveDateTime, NaiveTime};

    const FLEX_SIX: Option<f64> = Some(6.0);

    fn office() -> SchedulePolicy {
        SchedulePolicy::fixed(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            WorkingDays::WEEKDAYS,
            15,
        )
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 6).unwrap()
    }

    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 11).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn fixed_schedule_plans_fixed_mode() {
        let plan = plan_day(&office(), None, monday(), DayKind::Regular);
        assert!(plan.attendance_expected);
        assert_eq!(plan.expected_work_hours, 8.0);
        assert!(matches!(
            plan.mode,
            EvaluationMode::Fixed { flex_allowance_minutes: 15, .. }
        ));
        assert_eq!(plan.notes(), None);
    }

    #[test]
    fn employee_flag_beats_fixed_schedule() {
        let plan = plan_day(&office(), FLEX_SIX, monday(), DayKind::Regular);
        assert_eq!(plan.mode, EvaluationMode::Flexible);
        assert_eq!(plan.expected_work_hours, 6.0);

        let short = plan_day(&office(), FLEX_SIX, monday(), DayKind::ShortDay);
        assert!((short.expected_work_hours - 3.6).abs() < 1e-9);
    }

    #[test]
    fn flexible_schedule_plans_flexible_mode() {
        let flex = SchedulePolicy::flexible(7.0, WorkingDays::WEEKDAYS, 0);
        let plan = plan_day(&flex, None, monday(), DayKind::Regular);
        assert_eq!(plan.mode, EvaluationMode::Flexible);
        assert_eq!(plan.expected_work_hours, 7.0);
    }

    #[test]
    fn holidays_and_days_off_owe_nothing() {
        let holiday = plan_day(&office(), None, monday(), DayKind::Holiday);
        assert!(!holiday.attendance_expected);
        assert_eq!(holiday.expected_work_hours, 0.0);
        assert_eq!(holiday.notes(), Some("Holiday"));

        let weekend = plan_day(&office(), FLEX_SIX, saturday(), DayKind::Regular);
        assert!(!weekend.attendance_expected);
        assert_eq!(weekend.expected_work_hours, 0.0);
        assert_eq!(weekend.notes(), Some("Weekly day off"));
    }

    #[test]
    fn work_on_a_holiday_is_all_overtime() {
        let plan = plan_day(&office(), None, monday(), DayKind::Holiday);
        let input = plan.input(DayPunches {
            check_in: Some(at(monday(), 10, 0)),
            check_out: Some(at(monday(), 12, 30)),
        });
        assert!(input.is_flexible_schedule());

        let verdict = classify(&input).unwrap();
        assert_eq!(verdict.attendance_code, AttendanceCode::Overtime);
        assert_eq!(verdict.overtime_minutes, Some(150));
    }

    #[test]
    fn short_day_flows_into_classification() {
        let plan = plan_day(&office(), None, monday(), DayKind::ShortDay);
        assert!((plan.expected_work_hours - 4.8).abs() < 1e-9);

        let verdict = classify(&plan.input(DayPunches {
            check_in: Some(at(monday(), 9, 0)),
            check_out: Some(at(monday(), 13, 50)),
        }))
        .unwrap();
        assert_eq!(verdict.attendance_code, AttendanceCode::Present);
    }

    #[test]
    fn range_validation() {
        let from = monday();
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(validate_range(from, from, today, 31).unwrap(), 1);
        assert_eq!(validate_range(from, saturday(), today, 31).unwrap(), 6);
        assert!(validate_range(saturday(), from, today, 31).is_err());
        assert!(validate_range(from, saturday(), today, 5).is_err());
    }

    #[test]
    fn ranges_reaching_past_today_are_refused() {
        let today = monday();
        let next_month = today + chrono::Duration::days(30);

        assert!(matches!(
            validate_range(today, next_month, today, 62),
            Err(AppError::BadRequest(_))
        ));
        assert!(validate_range(today - chrono::Duration::days(3), today, today, 62).is_ok());
    }

    #[test]
    fn only_past_and_current_days_are_evaluated() {
        let today = monday();
        assert!(ensure_not_future(today, today).is_ok());
        assert!(ensure_not_future(today.pred_opt().unwrap(), today).is_ok());
        assert!(matches!(
            ensure_not_future(today.succ_opt().unwrap(), today),
            Err(AppError::BadRequest(_))
        ));
    }

    #[actix_web::test]
    async fn evaluating_tomorrow_is_refused_before_any_lookup() {
        // lazy pool: any query would fail with a connection error
        let pool = sqlx::mysql::MySqlPoolOptions::new()
            .connect_lazy("mysql://nobody@127.0.0.1:1/none")
            .unwrap();
        let reader = crate::service::punch::MySqlPunchReader::new(pool.clone());
        let tomorrow = Local::now().date_naive().succ_opt().unwrap();

        let result = evaluate_day(&pool, &reader, 7, tomorrow).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
