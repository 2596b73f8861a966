// handlers/auth/session.rs - GET /api/auth/verify, POST /api/auth/logout

use axum::{extract::State, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::session_user;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

/// GET /api/auth/verify - the caller's current identity
pub async fn verify(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<Value> {
    let user = state
        .repo::<User>()
        .select_id(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let session = session_user(&state, &user).await?;

    Ok(ApiResponse::success(json!({
        "success": true,
        "user": session,
    })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

/// POST /api/auth/logout - revoke the presented access token and, when
/// given, the refresh token from the body
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    body: Option<JsonBody<LogoutRequest>>,
) -> ApiResult<Value> {
    state.tokens.revoke(&auth.jti, auth.exp).await;

    let refresh_revoked = match body.and_then(|JsonBody(input)| input.refresh_token) {
        Some(token) => state.tokens.revoke_refresh(&token).await,
        None => false,
    };
    info!(user_id = auth.user_id, refresh_revoked, "User logged out");

    Ok(ApiResponse::success(json!({
        "success": true,
        "message": "Logged out successfully",
    })))
}
