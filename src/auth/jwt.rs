use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Decode and validate an access token. Refresh tokens are rejected.
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, String> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())?;

    if claims.token_type != TokenType::Access {
        return Err("access token required".to_string());
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret";

    fn token(token_type: TokenType, exp_offset: i64) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        let claims = Claims {
            user_id: 9,
            sub: "hr.lead".into(),
            role: 2,
            exp: (now + exp_offset) as usize,
            jti: "jti-1".into(),
            token_type,
            employee_id: Some(42),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn accepts_valid_access_token() {
        let claims = verify_access_token(&token(TokenType::Access, 600), SECRET).unwrap();
        assert_eq!(claims.employee_id, Some(42));
        assert_eq!(claims.role, 2);
    }

    #[test]
    fn rejects_refresh_expired_and_foreign_tokens() {
        assert!(verify_access_token(&token(TokenType::Refresh, 600), SECRET).is_err());
        assert!(verify_access_token(&token(TokenType::Access, -600), SECRET).is_err());
        assert!(verify_access_token(&token(TokenType::Access, 600), "other").is_err());
    }
}
