use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::work_schedule::{ScheduleRules, WorkSchedule};
use crate::repo::{self, schedule::ScheduleValues};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScheduleRequest {
    #[schema(example = "Office hours")]
    pub name: String,
    /// Makes this the department default when no older schedule exists
    #[schema(example = 1)]
    pub department_id: Option<u64>,
    #[serde(flatten)]
    pub rules: ScheduleRules,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleResponse {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = "Office hours")]
    pub name: String,
    pub department_id: Option<u64>,
    #[serde(flatten)]
    pub rules: ScheduleRules,
}

impl From<&WorkSchedule> for ScheduleResponse {
    fn from(row: &WorkSchedule) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            department_id: row.department_id,
            rules: ScheduleRules::from(row),
        }
    }
}

// Validates the rules before anything is written.
fn values(request: &ScheduleRequest) -> AppResult<ScheduleValues<'_>> {
    if request.name.trim().is_empty() {
        return Err(AppError::bad_request("Schedule name must not be empty"));
    }

    request.rules.policy()?;

    Ok(ScheduleValues {
        name: request.name.trim(),
        rules: &request.rules,
        working_days: request.rules.working_days_mask()?,
        department_id: request.department_id,
    })
}

/// Create Work Schedule
#[utoipa::path(
    post,
    path = "/api/v1/schedule",
    request_body = ScheduleRequest,
    responses(
        (status = 201, description = "Schedule created", body = ScheduleResponse),
        (status = 403, description = "HR/Admin only"),
        (status = 422, description = "Invalid schedule", body = Object, example = json!({
            "message": "invalid schedule: start and end time must differ"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Schedule",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ScheduleRequest>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let values = values(&payload)?;
    let schedule_id = repo::schedule::insert(pool.get_ref(), &values).await?;
    info!(schedule_id, user_id = auth.user_id, "Schedule created");

    let row = repo::schedule::find(pool.get_ref(), schedule_id)
        .await?
        .ok_or_else(|| AppError::not_found("Schedule"))?;

    Ok(HttpResponse::Created().json(ScheduleResponse::from(&row)))
}

/// List Work Schedules
#[utoipa::path(
    get,
    path = "/api/v1/schedule",
    responses(
        (status = 200, description = "All schedules", body = [ScheduleResponse]),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Schedule",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_schedules(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let rows = repo::schedule::list(pool.get_ref()).await?;
    let data: Vec<ScheduleResponse> = rows.iter().map(ScheduleResponse::from).collect();

    Ok(HttpResponse::Ok().json(data))
}

/// Get Work Schedule by ID
#[utoipa::path(
    get,
    path = "/api/v1/schedule/{schedule_id}",
    params(
        ("schedule_id", Path, description = "Schedule ID")
    ),
    responses(
        (status = 200, description = "Schedule found", body = ScheduleResponse),
        (status = 404, description = "Schedule not found", body = Object, example = json!({
            "message": "Schedule not found"
        }))
    ),
    tag = "Schedule",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let row = repo::schedule::find(pool.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Schedule"))?;

    Ok(HttpResponse::Ok().json(ScheduleResponse::from(&row)))
}

/// Replace Work Schedule
///
/// Stored attendance keeps its old verdicts until recalculated.
#[utoipa::path(
    put,
    path = "/api/v1/schedule/{schedule_id}",
    params(
        ("schedule_id", Path, description = "Schedule ID")
    ),
    request_body = ScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated", body = ScheduleResponse),
        (status = 404, description = "Schedule not found"),
        (status = 422, description = "Invalid schedule")
    ),
    tag = "Schedule",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ScheduleRequest>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    let schedule_id = path.into_inner();

    let values = values(&payload)?;
    if !repo::schedule::update(pool.get_ref(), schedule_id, &values).await? {
        return Err(AppError::not_found("Schedule"));
    }
    info!(schedule_id, user_id = auth.user_id, "Schedule updated");

    let row = repo::schedule::find(pool.get_ref(), schedule_id)
        .await?
        .ok_or_else(|| AppError::not_found("Schedule"))?;

    Ok(HttpResponse::Ok().json(ScheduleResponse::from(&row)))
}

/// Delete Work Schedule
#[utoipa::path(
    delete,
    path = "/api/v1/schedule/{schedule_id}",
    params(
        ("schedule_id", Path, description = "Schedule ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 400, description = "Schedule still assigned to employees"),
        (status = 404, description = "Schedule not found")
    ),
    tag = "Schedule",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    let schedule_id = path.into_inner();

    let assigned = repo::schedule::assigned_employees(pool.get_ref(), schedule_id).await?;
    if assigned > 0 {
        return Err(AppError::bad_request(format!(
            "Schedule is assigned to {assigned} employee(s)"
        )));
    }

    if !repo::schedule::delete(pool.get_ref(), schedule_id).await? {
        return Err(AppError::not_found("Schedule"));
    }
    info!(schedule_id, user_id = auth.user_id, "Schedule deleted");

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineError;

    fn request(body: serde_json::Value) -> ScheduleRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn request_rules_are_flattened() {
        let req = request(json!({
            "name": "Night",
            "is_flexible": false,
            "start_time": "22:00:00",
            "end_time": "06:00:00",
            "working_days": [true, true, true, true, false, false, true]
        }));

        let values = values(&req).unwrap();
        assert_eq!(values.working_days, "1111001");
        assert_eq!(values.department_id, None);
    }

    #[test]
    fn invalid_rules_never_reach_the_database() {
        let same_times = request(json!({
            "name": "Broken",
            "is_flexible": false,
            "start_time": "09:00:00",
            "end_time": "09:00:00"
        }));
        assert!(matches!(
            values(&same_times),
            Err(AppError::Engine(EngineError::InvalidSchedule { .. }))
        ));

        let blank = request(json!({
            "name": "  ",
            "is_flexible": true,
            "total_work_hours": 8.0
        }));
        assert!(matches!(values(&blank), Err(AppError::BadRequest(_))));
    }
}
