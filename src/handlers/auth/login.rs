// handlers/auth/login.rs - POST /api/auth/login

use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{session_user, TokenResponse};
use crate::auth::verify_password;
use crate::database::models::{AccountStatus, User};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/login - exchange credentials for an access/refresh pair
///
/// Unknown emails and wrong passwords get the same 401 so the response does
/// not reveal which accounts exist.
pub async fn login(State(state): State<AppState>, JsonBody(input): JsonBody<LoginRequest>) -> ApiResult<TokenResponse> {
    let (email, password) = match (input.email, input.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            (email.trim().to_lowercase(), password)
        }
        _ => return Err(ApiError::bad_request("Email and password are required")),
    };

    let users = state.repo::<User>();
    let user = users
        .select_one(FilterData::with_where(json!({ "email": email })))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&password, &user.password_hash).await? {
        warn!(user_id = user.user_id, "Login rejected: wrong password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }
    if user.account_status != AccountStatus::Active {
        warn!(user_id = user.user_id, status = %user.account_status, "Login rejected: account not active");
        return Err(ApiError::forbidden("Account is not active"));
    }

    let user = users.patch(user.user_id, &json!({ "lastLogin": Utc::now() })).await?;
    let session = session_user(&state, &user).await?;
    let tokens = state.tokens.issue(session.identity())?;
    info!(user_id = user.user_id, "User logged in");

    Ok(ApiResponse::success(TokenResponse {
        success: true,
        message: None,
        tokens,
        user: Some(session),
    }))
}
