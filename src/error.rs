use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::engine::EngineError;

/// Errors surfaced by services and handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data the service cannot interpret, e.g. an unknown attendance code.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),
}

impl AppError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Engine(EngineError::MissingSchedule { .. }) => StatusCode::CONFLICT,
            AppError::Engine(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_) | AppError::CorruptRecord(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Database(e) => tracing::error!(error = %e, "Database error"),
            AppError::CorruptRecord(detail) => tracing::error!(%detail, "Corrupt record"),
            _ => {
                return HttpResponse::build(self.status_code()).json(json!({
                    "message": self.to_string()
                }));
            }
        }

        HttpResponse::InternalServerError().json(json!({
            "message": "Internal Server Error"
        }))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use chrono::NaiveDate;

    #[test]
    fn engine_errors_map_to_client_statuses() {
        let missing = AppError::from(EngineError::MissingSchedule {
            employee_id: 4,
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        });
        assert_eq!(missing.status_code(), StatusCode::CONFLICT);

        let unmapped = AppError::from(EngineError::UnmappedWeekday { mask: "11".into() });
        assert_eq!(unmapped.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(AppError::not_found("Employee").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::forbidden("nope").status_code(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn database_errors_hide_details() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Internal Server Error");
    }

    #[actix_web::test]
    async fn not_found_message_names_the_resource() {
        let resp = AppError::not_found("Attendance").error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["message"], "Attendance not found");
    }

    #[actix_web::test]
    async fn unauthorized_uses_the_shared_message_body() {
        let resp = AppError::unauthorized("Invalid role").error_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "message": "Invalid role" }));
    }
}
