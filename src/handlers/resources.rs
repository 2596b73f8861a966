// handlers/resources.rs - shared CRUD surface for the remaining collections
//
// /api/training-sessions, /api/assessment-results, /api/user-skills and
// /api/notifications belong to one user each: every route needs a token,
// records are visible to their owner and admins, and non-admin lists only
// ever show the caller's own records. /api/skills is a public catalog that
// only admins edit.

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::info;

use super::query::{list_filter, ListParams};
use crate::auth::Policy;
use crate::database::models::{
    AssessmentResult, CreateAssessmentResult, CreateNotification, CreateSkill, CreateTrainingSession,
    CreateUserSkill, Notification, Resource, Skill, TrainingSession, UpdateAssessmentResult,
    UpdateNotification, UpdateSkill, UpdateTrainingSession, UpdateUserSkill, UserSkill, UserType,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

/// A collection served by the generic handlers below.
pub trait RestResource: Resource {
    type Create: DeserializeOwned + Into<Self> + Send + 'static;
    type Update: Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Field naming the owning user, for per-user collections.
    const OWNER_FIELD: Option<&'static str>;

    fn owner_id(&self) -> Option<i64>;
}

macro_rules! owned_by_user {
    ($ty:ty, $create:ty, $update:ty) => {
        impl RestResource for $ty {
            type Create = $create;
            type Update = $update;
            const OWNER_FIELD: Option<&'static str> = Some("userId");

            fn owner_id(&self) -> Option<i64> {
                Some(self.user_id)
            }
        }
    };
}

owned_by_user!(TrainingSession, CreateTrainingSession, UpdateTrainingSession);
owned_by_user!(AssessmentResult, CreateAssessmentResult, UpdateAssessmentResult);
owned_by_user!(UserSkill, CreateUserSkill, UpdateUserSkill);
owned_by_user!(Notification, CreateNotification, UpdateNotification);

impl RestResource for Skill {
    type Create = CreateSkill;
    type Update = UpdateSkill;
    const OWNER_FIELD: Option<&'static str> = None;

    fn owner_id(&self) -> Option<i64> {
        None
    }
}

/// Owner or admin for per-user records; admin only for catalog writes.
fn authorize<T: RestResource>(auth: &AuthUser, record: &T) -> Result<(), ApiError> {
    match record.owner_id() {
        Some(owner) => Policy::SelfOrAdmin(owner).check(
            auth,
            &format!("You can only access your own {}", T::SCHEMA.collection),
        ),
        None => Policy::RoleIn(&[UserType::Admin])
            .check(auth, &format!("Only administrators can modify {}", T::SCHEMA.collection)),
    }
}

/// Per-user collections are never served without a token.
fn require_auth<T: RestResource>(auth: Option<AuthUser>) -> Result<Option<AuthUser>, ApiError> {
    match (T::OWNER_FIELD, auth) {
        (Some(_), None) => Err(ApiError::unauthorized("Access denied. No token provided.")),
        (_, auth) => Ok(auth),
    }
}

pub async fn list<T: RestResource>(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<T>> {
    let auth = require_auth::<T>(auth.map(|Extension(a)| a))?;
    let scope = match (T::OWNER_FIELD, &auth) {
        (Some(field), Some(user)) if !user.is_admin() => Some((field, user.user_id)),
        _ => None,
    };

    let filter = list_filter(T::SCHEMA, &params, &state.config.api, scope)?;
    Ok(ApiResponse::success(state.repo::<T>().select_any(filter).await?))
}

pub async fn get<T: RestResource>(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(id): Path<i64>,
) -> ApiResult<T> {
    let auth = require_auth::<T>(auth.map(|Extension(a)| a))?;
    let record = state.repo::<T>().select_404(id).await?;
    if let (Some(user), Some(_)) = (&auth, record.owner_id()) {
        authorize(user, &record)?;
    }
    Ok(ApiResponse::success(record))
}

pub async fn create<T: RestResource>(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<T::Create>,
) -> ApiResult<T> {
    let record: T = input.into();
    authorize(&auth, &record)?;

    let record = state.repo::<T>().create(record).await?;
    info!(collection = T::SCHEMA.collection, id = record.id(), by = auth.user_id, "Record created");
    Ok(ApiResponse::created(record))
}

pub async fn update<T: RestResource>(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<T::Update>,
) -> ApiResult<T> {
    let repo = state.repo::<T>();
    let existing = repo.select_404(id).await?;
    authorize(&auth, &existing)?;

    Ok(ApiResponse::success(repo.update(id, &input).await?))
}

pub async fn delete<T: RestResource>(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let repo = state.repo::<T>();
    let existing = repo.select_404(id).await?;
    authorize(&auth, &existing)?;

    repo.delete_404(id).await?;
    info!(collection = T::SCHEMA.collection, id, by = auth.user_id, "Record deleted");
    Ok(ApiResponse::message(format!("{} deleted successfully", T::SCHEMA.label)))
}
