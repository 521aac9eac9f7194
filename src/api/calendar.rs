use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::engine::CalendarEntryType;
use crate::error::{AppError, AppResult};
use crate::model::work_calendar::WorkCalendarEntry;
use crate::repo;
use crate::utils::calendar_cache;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCalendarEntry {
    #[schema(example = "2025-12-25", value_type = String, format = "date")]
    pub entry_date: NaiveDate,
    pub entry_type: CalendarEntryType,
    /// Repeat on the same month and day every year
    #[serde(default)]
    #[schema(example = true)]
    pub is_recurring_annually: bool,
    #[schema(example = "Christmas Day")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CalendarQuery {
    /// Entries dated in this year plus recurring ones
    pub year: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CalendarEntryResponse {
    #[schema(example = 4)]
    pub id: u64,
    #[schema(example = "2025-12-25", value_type = String, format = "date")]
    pub entry_date: NaiveDate,
    #[schema(example = "holiday")]
    pub entry_type: String,
    pub is_recurring_annually: bool,
    pub description: Option<String>,
}

impl From<WorkCalendarEntry> for CalendarEntryResponse {
    fn from(entry: WorkCalendarEntry) -> Self {
        Self {
            id: entry.id,
            entry_date: entry.entry_date,
            entry_type: entry.entry_type,
            is_recurring_annually: entry.is_recurring_annually,
            description: entry.description,
        }
    }
}

/// Create Calendar Entry
///
/// Days it affects keep their stored verdicts until recalculated.
#[utoipa::path(
    post,
    path = "/api/v1/calendar",
    request_body = CreateCalendarEntry,
    responses(
        (status = 201, description = "Calendar entry created", body = CalendarEntryResponse),
        (status = 403, description = "HR/Admin only"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Calendar",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCalendarEntry>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let entry_id = repo::calendar::insert(
        pool.get_ref(),
        payload.entry_date,
        payload.entry_type,
        payload.is_recurring_annually,
        payload.description.as_deref(),
    )
    .await?;

    calendar_cache::invalidate();
    info!(
        entry_id,
        date = %payload.entry_date,
        entry_type = payload.entry_type.as_ref(),
        "Calendar entry created"
    );

    let entry = repo::calendar::find(pool.get_ref(), entry_id)
        .await?
        .ok_or_else(|| AppError::not_found("Calendar entry"))?;

    Ok(HttpResponse::Created().json(CalendarEntryResponse::from(entry)))
}

/// List Calendar Entries
#[utoipa::path(
    get,
    path = "/api/v1/calendar",
    params(
        ("year", Query, description = "Entries dated in this year plus recurring ones")
    ),
    responses(
        (status = 200, description = "Calendar entries", body = [CalendarEntryResponse]),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Calendar",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_entries(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<CalendarQuery>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let entries = repo::calendar::list(pool.get_ref(), query.year).await?;
    let data: Vec<CalendarEntryResponse> =
        entries.into_iter().map(CalendarEntryResponse::from).collect();

    Ok(HttpResponse::Ok().json(data))
}

/// Delete Calendar Entry
#[utoipa::path(
    delete,
    path = "/api/v1/calendar/{entry_id}",
    params(
        ("entry_id", Path, description = "Calendar entry ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Calendar entry not found")
    ),
    tag = "Calendar",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_entry(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    let entry_id = path.into_inner();

    if !repo::calendar::delete(pool.get_ref(), entry_id).await? {
        warn!(entry_id, "Delete of unknown calendar entry");
        return Err(AppError::not_found("Calendar entry"));
    }

    calendar_cache::invalidate();
    info!(entry_id, "Calendar entry deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
