// handlers/users.rs - /api/users
//
// Reads are public and always go through `UserResponse`, which has no
// password field.

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{error, info};

use super::query::{list_filter, ListParams};
use crate::auth::{hash_password, Policy};
use crate::database::models::{
    AccountStatus, CreateUser, UpdateUser, User, UserProfile, UserResponse, UserScenarios, UserType,
};
use crate::error::ApiError;
use crate::handlers::profile_of;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::schema::{is_valid_email, USERS};
use crate::state::AppState;

/// GET /api/users
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<Vec<UserResponse>> {
    let filter = list_filter(&USERS, &params, &state.config.api, None)?;
    let users = state.repo::<User>().select_any(filter).await?;
    Ok(ApiResponse::success(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /api/users/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<UserResponse> {
    let user = state.repo::<User>().select_404(id).await?;
    Ok(ApiResponse::success(user.into()))
}

/// POST /api/users - admin-side account creation
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CreateUser>,
) -> ApiResult<UserResponse> {
    Policy::RoleIn(&[UserType::Admin]).check(&auth, "Only administrators can create users")?;

    let (email, password, user_type) = match (input.email, input.password, input.user_type) {
        (Some(email), Some(password), Some(user_type)) if !email.trim().is_empty() && !password.is_empty() => {
            (email.trim().to_lowercase(), password, user_type)
        }
        _ => return Err(ApiError::bad_request("Missing required fields")),
    };
    if !is_valid_email(&email) {
        return Err(ApiError::field("email", "must be a valid email address"));
    }

    let password_hash = hash_password(&password, state.config.security.bcrypt_cost).await?;
    let user = state
        .repo::<User>()
        .create(User {
            user_id: 0,
            organization_id: input.organization_id,
            email,
            password_hash,
            user_type,
            created_at: Utc::now(),
            last_login: None,
            last_updated: None,
            account_status: input.account_status.unwrap_or(AccountStatus::Active),
            verification_status: input.verification_status,
        })
        .await?;
    info!(user_id = user.user_id, created_by = auth.user_id, "User created");

    Ok(ApiResponse::created(user.into()))
}

/// PUT /api/users/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    JsonBody(mut input): JsonBody<UpdateUser>,
) -> ApiResult<UserResponse> {
    Policy::SelfOrAdmin(id).check(&auth, "You can only update your own account")?;
    if input.touches_privileged_fields() && !auth.is_admin() {
        return Err(ApiError::forbidden(
            "Only administrators can change user type, organization or account status",
        ));
    }

    if let Some(email) = input.email.take() {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::field("email", "must be a valid email address"));
        }
        input.email = Some(email);
    }

    let user = state.repo::<User>().update(id, &input).await?;
    Ok(ApiResponse::success(user.into()))
}

/// DELETE /api/users/:id - also removes the user's profile and scenario list
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    Policy::SelfOrAdmin(id).check(&auth, "You can only delete your own account")?;
    state.repo::<User>().delete_404(id).await?;

    let profiles = state.repo::<UserProfile>();
    match profile_of(&profiles, id).await {
        Ok(Some(profile)) => {
            if let Err(e) = profiles.delete(profile.profile_id).await {
                error!(user_id = id, "Failed to delete profile of removed user: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => error!(user_id = id, "Failed to look up profile of removed user: {}", e),
    }
    if let Err(e) = state.repo::<UserScenarios>().delete(id).await {
        error!(user_id = id, "Failed to delete scenario list of removed user: {}", e);
    }
    info!(user_id = id, deleted_by = auth.user_id, "User deleted");

    Ok(ApiResponse::message("User deleted successfully"))
}
