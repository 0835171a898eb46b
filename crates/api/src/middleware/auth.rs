//! JWT authentication middleware.
//!
//! Validates the Bearer token and stores the authenticated staff account
//! in request extensions for downstream handlers and extractors.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use domain::models::Role;
use shared::jwt::{self, JwtConfig};

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated staff account extracted from a JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
    pub jti: String,
}

impl AuthUser {
    /// Validates an access token and builds the auth context.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, ApiError> {
        let claims = jwt_config.validate_token(token)?;
        let user_id = jwt::extract_user_id(&claims)?;
        let role = claims
            .role
            .parse::<Role>()
            .map_err(|_| ApiError::Unauthorized("Invalid role in token".to_string()))?;

        Ok(AuthUser {
            user_id,
            role,
            jti: claims.jti,
        })
    }
}

/// Pulls the Bearer token out of the Authorization header.
pub fn bearer_token(req_headers: &axum::http::HeaderMap) -> Result<&str, ApiError> {
    let header = req_headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header format".to_string()))
}

/// Middleware that requires a valid JWT.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let auth = bearer_token(req.headers())
        .and_then(|token| AuthUser::validate(&state.jwt, token));

    match auth {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    fn jwt_config() -> JwtConfig {
        JwtConfig::new("test_secret_key_for_auth_middleware", 3600)
    }

    #[test]
    fn test_validate_good_token() {
        let config = jwt_config();
        let (token, jti) = config.issue_token(7, "manager").unwrap();

        let auth = AuthUser::validate(&config, &token).unwrap();
        assert_eq!(auth.user_id, 7);
        assert_eq!(auth.role, Role::Manager);
        assert_eq!(auth.jti, jti);
    }

    #[test]
    fn test_validate_rejects_garbage() {
        assert!(AuthUser::validate(&jwt_config(), "not_a_token").is_err());
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic abc123"));
        assert!(bearer_token(&headers).is_err());
    }
}
