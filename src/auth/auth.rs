use crate::auth::jwt::verify_access_token;
use crate::config::Config;
use crate::error::AppError;
use crate::model::role::Role;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, http::header, http::header::HeaderMap,
    web::Data,
};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected routes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let Some(config) = req.app_data::<Data<Config>>() else {
            return ready(Err(actix_web::error::ErrorInternalServerError(
                "Config missing",
            )));
        };

        ready(AuthUser::from_headers(req.headers(), &config.jwt_secret).map_err(Into::into))
    }
}

impl AuthUser {
    /// Resolve the caller from an `Authorization: Bearer <access token>` header.
    pub fn from_headers(headers: &HeaderMap, secret: &str) -> Result<Self, AppError> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?
            .to_str()
            .map_err(|_| AppError::unauthorized("Invalid Authorization header encoding"))?;

        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Authorization header must start with Bearer"))?;

        let claims = verify_access_token(token, secret)
            .map_err(|e| AppError::unauthorized(format!("Invalid or expired token: {e}")))?;

        let role = Role::from_id(claims.role)
            .ok_or_else(|| AppError::unauthorized("Invalid role"))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if matches!(self.role, Role::Admin | Role::Hr) {
            Ok(())
        } else {
            Err(AppError::forbidden("HR/Admin only"))
        }
    }

    /// HR, Admin or a system job.
    pub fn require_evaluator(&self) -> Result<(), AppError> {
        if self.role.can_evaluate() {
            Ok(())
        } else {
            Err(AppError::forbidden("HR/Admin/System only"))
        }
    }

    /// Employee record linked to this user.
    pub fn own_employee_id(&self) -> Result<u64, AppError> {
        self.employee_id
            .ok_or_else(|| AppError::forbidden("No employee profile"))
    }

    /// Evaluators see everyone, employees only themselves.
    pub fn can_view(&self, employee_id: u64) -> bool {
        self.role.can_evaluate() || self.employee_id == Some(employee_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Claims, TokenType};
    use actix_web::http::header::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "middleware-secret";

    fn bearer(role: u8, token_type: TokenType) -> HeaderMap {
        let claims = Claims {
            user_id: 3,
            sub: "night.guard".into(),
            role,
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
            jti: "jti-3".into(),
            token_type,
            employee_id: Some(11),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "someone".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn employees_only_see_themselves() {
        let me = user(Role::Employee, Some(7));
        assert!(me.can_view(7));
        assert!(!me.can_view(8));
        assert!(me.require_evaluator().is_err());

        let hr = user(Role::Hr, None);
        assert!(hr.can_view(8));
        assert!(hr.own_employee_id().is_err());
        assert!(hr.require_hr_or_admin().is_ok());

        let job = user(Role::System, None);
        assert!(job.require_evaluator().is_ok());
        assert!(job.require_hr_or_admin().is_err());
    }

    #[test]
    fn bearer_header_resolves_the_caller() {
        let user = AuthUser::from_headers(&bearer(3, TokenType::Access), SECRET).unwrap();
        assert_eq!(user.username, "night.guard");
        assert_eq!(user.role, Role::Employee);
        assert_eq!(user.employee_id, Some(11));
    }

    #[test]
    fn bad_credentials_are_unauthorized() {
        let missing = AuthUser::from_headers(&HeaderMap::new(), SECRET);
        assert!(matches!(missing, Err(AppError::Unauthorized(_))));

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            AuthUser::from_headers(&basic, SECRET),
            Err(AppError::Unauthorized(_))
        ));

        let refresh = AuthUser::from_headers(&bearer(3, TokenType::Refresh), SECRET);
        assert!(matches!(refresh, Err(AppError::Unauthorized(_))));

        let unknown_role = AuthUser::from_headers(&bearer(99, TokenType::Access), SECRET);
        assert!(matches!(unknown_role, Err(AppError::Unauthorized(_))));
    }
}
