use crate::auth::auth::AuthUser;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

/// Authenticate every request in the protected scope. Rejections are answered
/// here with a 401 and never reach the handler.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let user = match AuthUser::from_headers(req.headers(), &config.jwt_secret) {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!(path = req.path(), error = %e, "Request rejected");
            let resp = e.error_response();
            return Ok(req.into_response(resp));
        }
    };

    tracing::debug!(user_id = user.user_id, role = ?user.role, "Request authenticated");
    req.extensions_mut().insert(user);

    next.call(req).await
}
