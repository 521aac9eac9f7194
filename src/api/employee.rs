use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::repo::{self, employee::NewEmployee};

fn default_required_hours() -> f64 {
    8.0
}

fn check_required_hours(hours: f64) -> AppResult<()> {
    if hours.is_finite() && hours > 0.0 && hours <= 24.0 {
        Ok(())
    } else {
        Err(AppError::bad_request(
            "required_work_hours_per_day must be within (0, 24]",
        ))
    }
}

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "3000", value_type = String)]
    pub employee_code: String,
    #[schema(example = "first name", value_type = String)]
    pub first_name: String,
    #[schema(example = "last name", value_type = String)]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "+8801712345678")]
    pub phone: Option<String>,
    #[schema(example = 1, value_type = u64 )]
    pub department_id: u64,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub hire_date: NaiveDate,
    #[serde(default)]
    #[schema(example = false)]
    pub is_flexible_hours: bool,
    #[serde(default = "default_required_hours")]
    #[schema(example = 8.0)]
    pub required_work_hours_per_day: f64,
    /// Department default schedule applies when absent
    #[schema(example = 2)]
    pub work_schedule_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateEmployeeSchedule {
    /// Clear to fall back to the department default
    #[schema(example = 2)]
    pub work_schedule_id: Option<u64>,
    #[schema(example = true)]
    pub is_flexible_hours: bool,
    #[serde(default = "default_required_hours")]
    #[schema(example = 6.0)]
    pub required_work_hours_per_day: f64,
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/v1/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully",
            "id": 12
        })),
        (status = 400, description = "Invalid work hours"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Schedule not found"),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "message": "Internal Server Error"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    check_required_hours(payload.required_work_hours_per_day)?;

    if let Some(schedule_id) = payload.work_schedule_id {
        repo::schedule::find(pool.get_ref(), schedule_id)
            .await?
            .ok_or_else(|| AppError::not_found("Schedule"))?;
    }

    let new_employee = NewEmployee {
        employee_code: &payload.employee_code,
        first_name: &payload.first_name,
        last_name: &payload.last_name,
        email: &payload.email,
        phone: payload.phone.as_deref(),
        department_id: payload.department_id,
        hire_date: payload.hire_date,
        is_flexible_hours: payload.is_flexible_hours,
        required_work_hours_per_day: payload.required_work_hours_per_day,
        work_schedule_id: payload.work_schedule_id,
    };

    let employee_id = repo::employee::insert(pool.get_ref(), &new_employee)
        .await
        .inspect_err(|e| error!(error = %e, "Failed to Create Employee"))?;

    info!(employee_id, user_id = auth.user_id, "Employee created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Employee created successfully",
        "id": employee_id
    })))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/v1/employee/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = crate::model::employee::Employee),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let employee_id: u64 = path.into_inner();
    if !auth.can_view(employee_id) {
        return Err(AppError::forbidden("You can only view your own profile"));
    }

    let employee = repo::employee::find(pool.get_ref(), employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee"))?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee Schedule Settings
///
/// Stored attendance keeps its old verdicts until recalculated.
#[utoipa::path(
    put,
    path = "/api/v1/employee/{employee_id}/schedule",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = UpdateEmployeeSchedule,
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "Invalid work hours"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Employee or schedule not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateEmployeeSchedule>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    check_required_hours(payload.required_work_hours_per_day)?;
    let employee_id = path.into_inner();

    if let Some(schedule_id) = payload.work_schedule_id {
        repo::schedule::find(pool.get_ref(), schedule_id)
            .await?
            .ok_or_else(|| AppError::not_found("Schedule"))?;
    }

    let found = repo::employee::update_schedule(
        pool.get_ref(),
        employee_id,
        payload.work_schedule_id,
        payload.is_flexible_hours,
        payload.required_work_hours_per_day,
    )
    .await?;

    if !found {
        return Err(AppError::not_found("Employee"));
    }

    info!(
        employee_id,
        schedule_id = ?payload.work_schedule_id,
        flexible = payload.is_flexible_hours,
        "Employee schedule updated"
    );

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}
