// handlers/auth/refresh.rs - POST /api/auth/refresh-token

use axum::extract::State;
use serde::Deserialize;

use super::{session_user, TokenResponse};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// POST /api/auth/refresh-token - new token pair for a valid refresh token
///
/// The identity is rebuilt from the stored user, so role or organization
/// changes since the last login show up in the new access token.
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RefreshRequest>,
) -> ApiResult<TokenResponse> {
    let token = input
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Refresh token is required"))?;

    let claims = state.tokens.verify_refresh(&token).await.map_err(|e| {
        tracing::debug!("Rejected refresh token: {}", e);
        ApiError::unauthorized("Invalid refresh token")
    })?;

    let user = state
        .repo::<User>()
        .select_id(claims.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let session = session_user(&state, &user).await?;
    let tokens = state.tokens.issue(session.identity())?;

    Ok(ApiResponse::success(TokenResponse {
        success: true,
        message: None,
        tokens,
        user: None,
    }))
}
