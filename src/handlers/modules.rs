// handlers/modules.rs - /api/modules

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::query::{list_filter, ListParams};
use crate::auth::Policy;
use crate::database::models::{CreateModule, Module, ModuleView, Scenario, UpdateModule, UserType};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::schema::MODULES;
use crate::state::AppState;

const DEFAULT_RANDOM_COUNT: usize = 5;
const RELATED_MODULES: i64 = 4;

fn views(modules: Vec<Module>) -> Vec<ModuleView> {
    modules.into_iter().map(ModuleView::from).collect()
}

/// GET /api/modules
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<Vec<ModuleView>> {
    let filter = list_filter(&MODULES, &params, &state.config.api, None)?;
    Ok(ApiResponse::success(views(state.repo::<Module>().select_any(filter).await?)))
}

/// GET /api/modules/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<ModuleView> {
    Ok(ApiResponse::success(state.repo::<Module>().select_404(id).await?.into()))
}

#[derive(Debug, Deserialize)]
pub struct RandomQuery {
    pub count: Option<usize>,
}

/// GET /api/modules/random?count=N
pub async fn random(State(state): State<AppState>, Query(query): Query<RandomQuery>) -> ApiResult<Vec<ModuleView>> {
    let max = usize::try_from(state.config.api.max_page_size).unwrap_or(DEFAULT_RANDOM_COUNT);
    let count = query.count.unwrap_or(DEFAULT_RANDOM_COUNT).min(max);
    Ok(ApiResponse::success(views(state.repo::<Module>().sample(count).await?)))
}

/// GET /api/modules/by-scenario/:scenarioId - the scenario's module first,
/// then a few others from the same category
pub async fn by_scenario(State(state): State<AppState>, Path(scenario_id): Path<i64>) -> ApiResult<Vec<ModuleView>> {
    let scenario = state.repo::<Scenario>().select_404(scenario_id).await?;
    let modules = state.repo::<Module>();
    let primary = modules.select_404(scenario.module_id).await?;

    let related = modules
        .select_any(
            FilterData::with_where(json!({
                "category": primary.category,
                "moduleId": { "$ne": primary.module_id },
            }))
            .page(Some(RELATED_MODULES), None),
        )
        .await?;

    let mut result = vec![primary];
    result.extend(related);
    Ok(ApiResponse::success(views(result)))
}

async fn check_prerequisite(state: &AppState, prerequisite: Option<i64>) -> Result<(), ApiError> {
    match prerequisite {
        Some(id) if state.repo::<Module>().select_id(id).await?.is_none() => {
            Err(ApiError::field("prerequisites", "must reference an existing module"))
        }
        _ => Ok(()),
    }
}

/// POST /api/modules
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CreateModule>,
) -> ApiResult<ModuleView> {
    Policy::RoleIn(&[UserType::Admin]).check(&auth, "Only administrators can manage modules")?;
    check_prerequisite(&state, input.prerequisites).await?;

    let module = state.repo::<Module>().create(input.into()).await?;
    info!(module_id = module.module_id, "Module created");
    Ok(ApiResponse::created(module.into()))
}

/// PUT /api/modules/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<UpdateModule>,
) -> ApiResult<ModuleView> {
    Policy::RoleIn(&[UserType::Admin]).check(&auth, "Only administrators can manage modules")?;
    if input.prerequisites == Some(id) {
        return Err(ApiError::field("prerequisites", "a module cannot be its own prerequisite"));
    }
    check_prerequisite(&state, input.prerequisites).await?;

    Ok(ApiResponse::success(state.repo::<Module>().update(id, &input).await?.into()))
}

/// DELETE /api/modules/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    Policy::RoleIn(&[UserType::Admin]).check(&auth, "Only administrators can manage modules")?;
    state.repo::<Module>().delete_404(id).await?;
    info!(module_id = id, "Module deleted");

    Ok(ApiResponse::message("Module deleted successfully"))
}
