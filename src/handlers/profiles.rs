// handlers/profiles.rs - /api/profiles

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::Value;

use super::query::{list_filter, ListParams};
use crate::auth::Policy;
use crate::database::models::{CreateProfile, UpdateProfile, User, UserProfile};
use crate::error::ApiError;
use crate::handlers::profile_of;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::schema::USER_PROFILES;
use crate::state::AppState;

/// GET /api/profiles
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<Vec<UserProfile>> {
    let filter = list_filter(&USER_PROFILES, &params, &state.config.api, None)?;
    Ok(ApiResponse::success(state.repo::<UserProfile>().select_any(filter).await?))
}

/// GET /api/profiles/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<UserProfile> {
    Ok(ApiResponse::success(state.repo::<UserProfile>().select_404(id).await?))
}

/// GET /api/profiles/user/:userId
pub async fn by_user(State(state): State<AppState>, Path(user_id): Path<i64>) -> ApiResult<UserProfile> {
    let profile = profile_of(&state.repo::<UserProfile>(), user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User profile not found"))?;
    Ok(ApiResponse::success(profile))
}

/// POST /api/profiles - one profile per user, enforced by a unique index
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CreateProfile>,
) -> ApiResult<UserProfile> {
    Policy::SelfOrAdmin(input.user_id).check(&auth, "You can only create your own profile")?;
    if state.repo::<User>().select_id(input.user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let profile = state.repo::<UserProfile>().create(input.into()).await?;
    Ok(ApiResponse::created(profile))
}

/// PUT /api/profiles/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<UpdateProfile>,
) -> ApiResult<UserProfile> {
    let profiles = state.repo::<UserProfile>();
    let existing = profiles.select_404(id).await?;
    Policy::SelfOrAdmin(existing.user_id).check(&auth, "You can only update your own profile")?;

    Ok(ApiResponse::success(profiles.update(id, &input).await?))
}

/// DELETE /api/profiles/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let profiles = state.repo::<UserProfile>();
    let existing = profiles.select_404(id).await?;
    Policy::SelfOrAdmin(existing.user_id).check(&auth, "You can only delete your own profile")?;

    profiles.delete_404(id).await?;
    Ok(ApiResponse::message("User profile deleted successfully"))
}
