use std::str::FromStr;

use actix_web::{HttpResponse, web};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::engine::{
    AttendanceCode, AttendanceVerdict, DayKind, DefaultFormatter, PresentationFormatter, classify,
};
use crate::error::{AppError, AppResult};
use crate::model::attendance::Attendance;
use crate::model::work_schedule::ScheduleRules;
use crate::repo::{self, attendance::AttendanceFilter};
use crate::service::attendance::{evaluate_day, plan_day, recalculate};
use crate::service::punch::{DayPunches, MySqlPunchReader};

/// Verdict fields plus their display text.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerdictResponse {
    #[schema(example = "L")]
    pub attendance_code: AttendanceCode,
    #[schema(example = "Late")]
    pub code_label: String,
    #[schema(example = "Late")]
    pub status: String,
    pub is_complete: bool,
    pub is_late_arrival: bool,
    pub is_early_departure: bool,
    pub is_overtime: bool,
    pub is_early_arrival: bool,
    #[schema(example = 5)]
    pub late_minutes: Option<i64>,
    pub early_departure_minutes: Option<i64>,
    pub overtime_minutes: Option<i64>,
    pub early_arrival_minutes: Option<i64>,
    #[schema(example = 460)]
    pub work_duration_minutes: Option<i64>,
    #[schema(example = "7h 40m")]
    pub work_duration: String,
    pub is_flexible_schedule: bool,
    #[schema(example = 8.0)]
    pub expected_work_hours: f64,
}

impl VerdictResponse {
    pub fn new(verdict: &AttendanceVerdict, formatter: &impl PresentationFormatter) -> Self {
        Self {
            attendance_code: verdict.attendance_code,
            code_label: formatter.code_label(verdict.attendance_code).to_string(),
            status: formatter.status(verdict),
            is_complete: verdict.is_complete,
            is_late_arrival: verdict.is_late_arrival,
            is_early_departure: verdict.is_early_departure,
            is_overtime: verdict.is_overtime,
            is_early_arrival: verdict.is_early_arrival,
            late_minutes: verdict.late_minutes,
            early_departure_minutes: verdict.early_departure_minutes,
            overtime_minutes: verdict.overtime_minutes,
            early_arrival_minutes: verdict.early_arrival_minutes,
            work_duration_minutes: verdict.work_duration_minutes(),
            work_duration: formatter.duration(verdict.work_duration),
            is_flexible_schedule: verdict.is_flexible_schedule,
            expected_work_hours: verdict.expected_work_hours,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "2025-01-06", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "2025-01-06T09:20:00", value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<NaiveDateTime>,
    #[schema(example = "2025-01-06T17:00:00", value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<NaiveDateTime>,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub verdict: VerdictResponse,
}

impl TryFrom<&Attendance> for AttendanceResponse {
    type Error = AppError;

    fn try_from(row: &Attendance) -> Result<Self, Self::Error> {
        let verdict = row.verdict().map_err(|_| {
            AppError::CorruptRecord(format!(
                "attendance {} has code {:?}",
                row.id, row.attendance_code
            ))
        })?;

        Ok(Self {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            check_in_time: row.check_in_time,
            check_out_time: row.check_out_time,
            notes: row.notes.clone(),
            verdict: VerdictResponse::new(&verdict, &DefaultFormatter),
        })
    }
}

/// Result of a punch. The punch is stored even when classification fails.
#[derive(Debug, Serialize, ToSchema)]
pub struct PunchResponse {
    #[schema(example = "Checked out successfully")]
    pub message: String,
    pub attendance: Option<AttendanceResponse>,
    /// Why the stored punch could not be classified, e.g. no schedule assigned
    pub classification_error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EvaluationResponse {
    #[schema(example = "Attendance evaluated")]
    pub message: String,
    /// Absent when nothing was owed and nothing was punched
    pub attendance: Option<AttendanceResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClassifyRequest {
    #[schema(example = "2025-01-06", value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(example = "2025-01-06T09:20:00", value_type = Option<String>, format = "date-time")]
    pub check_in: Option<NaiveDateTime>,
    #[schema(example = "2025-01-06T17:00:00", value_type = Option<String>, format = "date-time")]
    pub check_out: Option<NaiveDateTime>,
    pub schedule: ScheduleRules,
    /// Employee-level flexible hours; overrides a fixed schedule
    pub flexible_hours: Option<f64>,
    #[serde(default)]
    pub day_kind: DayKind,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClassifyResponse {
    pub attendance_expected: bool,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub verdict: VerdictResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EvaluateRequest {
    #[schema(example = 7)]
    pub employee_id: u64,
    #[schema(example = "2025-01-06", value_type = String, format = "date")]
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecalculateRequest {
    #[schema(example = "2025-01-01", value_type = String, format = "date")]
    pub from: NaiveDate,
    #[schema(example = "2025-01-31", value_type = String, format = "date")]
    pub to: NaiveDate,
    /// All active employees when absent
    pub employee_id: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub employee_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
    pub code: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceListResponse {
    pub data: Vec<AttendanceResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 42)]
    pub total: i64,
}

// Classify the day a punch was stored on. Only database failures fail the request.
async fn punch_outcome(
    pool: &MySqlPool,
    employee_id: u64,
    date: NaiveDate,
    message: &str,
) -> AppResult<PunchResponse> {
    let reader = MySqlPunchReader::new(pool.clone());

    match evaluate_day(pool, &reader, employee_id, date).await {
        Ok(row) => Ok(PunchResponse {
            message: message.to_string(),
            attendance: row.as_ref().map(AttendanceResponse::try_from).transpose()?,
            classification_error: None,
        }),
        Err(AppError::Database(e)) => Err(AppError::Database(e)),
        Err(e) => {
            warn!(employee_id, %date, error = %e, "Punch stored but not classified");
            Ok(PunchResponse {
                message: message.to_string(),
                attendance: None,
                classification_error: Some(e.to_string()),
            })
        }
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = PunchResponse),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let employee_id = auth.own_employee_id()?;
    let now = Local::now().naive_local();
    let date = now.date();

    if !repo::attendance::record_check_in(pool.get_ref(), employee_id, date, now).await? {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Already checked in today"
        })));
    }

    info!(employee_id, user = %auth.username, %now, "Checked in");

    let outcome = punch_outcome(pool.get_ref(), employee_id, date, "Checked in successfully").await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Check-out endpoint
///
/// Closes today's open check-in, or yesterday's when it was made less than
/// a day ago (night shift).
#[utoipa::path(
    post,
    path = "/api/v1/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = PunchResponse),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let employee_id = auth.own_employee_id()?;
    let now = Local::now().naive_local();
    let today = now.date();

    let mut work_date = None;
    if repo::attendance::record_check_out(pool.get_ref(), employee_id, today, now).await? {
        work_date = Some(today);
    } else if let Some(yesterday) = today.pred_opt() {
        let open = repo::attendance::find_by_day(pool.get_ref(), employee_id, yesterday)
            .await?
            .and_then(|row| row.check_in_time)
            .is_some_and(|check_in| now - check_in < Duration::hours(24));

        if open
            && repo::attendance::record_check_out(pool.get_ref(), employee_id, yesterday, now)
                .await?
        {
            work_date = Some(yesterday);
        }
    }

    let Some(work_date) = work_date else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "No active check-in found for today"
        })));
    };

    info!(employee_id, user = %auth.username, %work_date, %now, "Checked out");

    let outcome =
        punch_outcome(pool.get_ref(), employee_id, work_date, "Checked out successfully").await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Classify a day without storing anything
#[utoipa::path(
    post,
    path = "/api/v1/attendance/classify",
    request_body = ClassifyRequest,
    responses(
        (status = 200, description = "Classification preview", body = ClassifyResponse),
        (status = 422, description = "Invalid schedule or punch order", body = Object, example = json!({
            "message": "check-out 2025-01-06 08:00:00 precedes check-in 2025-01-06 09:00:00"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn classify_preview(body: web::Json<ClassifyRequest>) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let policy = request.schedule.policy()?;

    let plan = plan_day(&policy, request.flexible_hours, request.work_date, request.day_kind);
    let verdict = classify(&plan.input(DayPunches {
        check_in: request.check_in,
        check_out: request.check_out,
    }))?;

    Ok(HttpResponse::Ok().json(ClassifyResponse {
        attendance_expected: plan.attendance_expected,
        notes: plan.notes().map(str::to_string),
        verdict: VerdictResponse::new(&verdict, &DefaultFormatter),
    }))
}

/// Evaluate and store one employee-day
#[utoipa::path(
    post,
    path = "/api/v1/attendance/evaluate",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Day evaluated", body = EvaluationResponse),
        (status = 400, description = "Date is after today"),
        (status = 403, description = "HR/Admin/System only"),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "No schedule for the employee"),
        (status = 422, description = "Stored punches or schedule cannot be classified"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn evaluate(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<EvaluateRequest>,
) -> AppResult<HttpResponse> {
    auth.require_evaluator()?;

    let reader = MySqlPunchReader::new(pool.get_ref().clone());
    let row = evaluate_day(pool.get_ref(), &reader, body.employee_id, body.date).await?;

    let message = if row.is_some() {
        "Attendance evaluated"
    } else {
        "No attendance expected on this day"
    };

    Ok(HttpResponse::Ok().json(EvaluationResponse {
        message: message.to_string(),
        attendance: row.as_ref().map(AttendanceResponse::try_from).transpose()?,
    }))
}

/// Re-evaluate a date range
#[utoipa::path(
    post,
    path = "/api/v1/attendance/recalculate",
    request_body = RecalculateRequest,
    responses(
        (status = 200, description = "Batch finished; per-day failures are listed", body = crate::service::attendance::RecalculationSummary),
        (status = 400, description = "Invalid date range or range ends after today", body = Object, example = json!({
            "message": "`from` must not be after `to`"
        })),
        (status = 403, description = "HR/Admin/System only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn recalculate_range(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Json<RecalculateRequest>,
) -> AppResult<HttpResponse> {
    auth.require_evaluator()?;

    let reader = MySqlPunchReader::new(pool.get_ref().clone());
    let summary = recalculate(
        pool.get_ref(),
        &reader,
        body.from,
        body.to,
        body.employee_id,
        config.max_recalc_days,
        config.recalc_concurrency,
    )
    .await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// List attendance records
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(
        ("page", Query, description = "Page number"),
        ("per_page", Query, description = "Items per page"),
        ("employee_id", Query, description = "Filter by employee (ignored for employees)"),
        ("from", Query, description = "First date, inclusive"),
        ("to", Query, description = "Last date, inclusive"),
        ("code", Query, description = "Filter by attendance code, e.g. L")
    ),
    responses(
        (status = 200, description = "Paginated attendance list", body = AttendanceListResponse),
        (status = 400, description = "Unknown attendance code"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<AttendanceQuery>,
) -> AppResult<HttpResponse> {
    let employee_id = if auth.role.can_evaluate() {
        query.employee_id
    } else {
        let own = auth.own_employee_id()?;
        if query.employee_id.is_some_and(|id| id != own) {
            return Err(AppError::forbidden("You can only view your own attendance"));
        }
        Some(own)
    };

    if let Some(code) = query.code.as_deref() {
        AttendanceCode::from_str(code)
            .map_err(|_| AppError::bad_request(format!("Unknown attendance code: {code}")))?;
    }

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let filter = AttendanceFilter {
        employee_id,
        from: query.from,
        to: query.to,
        code: query.code.as_deref(),
    };

    let (rows, total) = repo::attendance::list(pool.get_ref(), &filter, per_page, offset).await?;
    let data = rows
        .iter()
        .map(AttendanceResponse::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Get one attendance record
#[utoipa::path(
    get,
    path = "/api/v1/attendance/{attendance_id}",
    params(
        ("attendance_id", Path, description = "Attendance ID")
    ),
    responses(
        (status = 200, description = "Attendance found", body = AttendanceResponse),
        (status = 403, description = "Not your record"),
        (status = 404, description = "Attendance not found", body = Object, example = json!({
            "message": "Attendance not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn get_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let attendance_id = path.into_inner();

    let row = repo::attendance::find(pool.get_ref(), attendance_id)
        .await?
        .ok_or_else(|| AppError::not_found("Attendance"))?;

    if !auth.can_view(row.employee_id) {
        return Err(AppError::forbidden("You can only view your own attendance"));
    }

    Ok(HttpResponse::Ok().json(AttendanceResponse::try_from(&row)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test as actix_test};
    use serde_json::Value;

    fn office_day(check_in: &str, check_out: &str) -> Value {
        json!({
            "work_date": "2025-01-06",
            "check_in": check_in,
            "check_out": check_out,
            "schedule": {
                "is_flexible": false,
                "start_time": "09:00:00",
                "end_time": "17:00:00",
                "flex_allowance_minutes": 15
            }
        })
    }

    #[actix_web::test]
    async fn classify_reports_late_arrival() {
        let app = actix_test::init_service(
            App::new().route("/attendance/classify", web::post().to(classify_preview)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/attendance/classify")
            .set_json(office_day("2025-01-06T09:20:00", "2025-01-06T17:00:00"))
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["attendance_code"], "L");
        assert_eq!(body["status"], "Late");
        assert_eq!(body["late_minutes"], 5);
        assert_eq!(body["work_duration"], "7h 40m");
        assert_eq!(body["attendance_expected"], true);
    }

    #[actix_web::test]
    async fn classify_rejects_reversed_punches() {
        let app = actix_test::init_service(
            App::new().route("/attendance/classify", web::post().to(classify_preview)),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/attendance/classify")
            .set_json(office_day("2025-01-06T17:00:00", "2025-01-06T09:00:00"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn classify_on_a_holiday_counts_overtime() {
        let app = actix_test::init_service(
            App::new().route("/attendance/classify", web::post().to(classify_preview)),
        )
        .await;

        let mut payload = office_day("2025-01-06T10:00:00", "2025-01-06T12:00:00");
        payload["day_kind"] = json!("holiday");

        let req = actix_test::TestRequest::post()
            .uri("/attendance/classify")
            .set_json(payload)
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["attendance_code"], "O");
        assert_eq!(body["overtime_minutes"], 120);
        assert_eq!(body["attendance_expected"], false);
        assert_eq!(body["notes"], "Holiday");
    }

    #[test]
    fn stored_rows_with_unknown_codes_are_corrupt() {
        let row = Attendance {
            id: 3,
            employee_id: 7,
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            check_in_time: None,
            check_out_time: None,
            work_duration_minutes: None,
            is_complete: false,
            is_late_arrival: false,
            is_early_departure: false,
            is_overtime: false,
            is_early_arrival: false,
            late_minutes: None,
            early_departure_minutes: None,
            overtime_minutes: None,
            early_arrival_minutes: None,
            is_flexible_schedule: false,
            expected_work_hours: 8.0,
            attendance_code: "ZZ".into(),
            notes: None,
        };

        assert!(matches!(
            AttendanceResponse::try_from(&row),
            Err(AppError::CorruptRecord(_))
        ));
    }
}
