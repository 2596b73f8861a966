use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::{AccessClaims, TokenError};
use crate::database::models::UserType;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context extracted from the access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub email: String,
    pub user_type: UserType,
    pub organization_id: i64,
    pub is_new: bool,
    /// Token id and expiry, kept so logout can revoke the presented token
    pub jti: String,
    pub exp: i64,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}

impl From<AccessClaims> for AuthUser {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.identity.user_id,
            email: claims.identity.email,
            user_type: claims.identity.user_type,
            organization_id: claims.identity.organization_id,
            is_new: claims.identity.is_new,
            jti: claims.jti,
            exp: claims.exp,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers)
        .ok_or_else(|| ApiError::unauthorized("Access denied. No token provided."))?;

    let claims = state.tokens.verify_access(token).await.map_err(|e| {
        if e != TokenError::Expired {
            tracing::debug!("Rejected access token: {}", e);
        }
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_tokens_only() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_jwt_from_headers(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers), Some("abc.def.ghi"));

        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_jwt_from_headers(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_jwt_from_headers(&headers), None);
    }
}
