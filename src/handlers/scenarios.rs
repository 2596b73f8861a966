// handlers/scenarios.rs - /api/scenarios and per-user scenario lists
//
// Creating a scenario grants it to every member of its organization;
// deleting one retracts it from every list. Both follow-ups are separate
// writes after the scenario itself is stored, so their failures are logged
// and the request still succeeds.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::query::{list_filter, ListParams};
use crate::auth::Policy;
use crate::database::models::{AssignScenario, CreateScenario, Module, Organization, Scenario, UpdateScenario, User, UserScenarios};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::schema::SCENARIOS;
use crate::state::AppState;

const SCENARIO_LIST_FIELD: &str = "scenarios";

/// GET /api/scenarios
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<Vec<Scenario>> {
    let filter = list_filter(&SCENARIOS, &params, &state.config.api, None)?;
    Ok(ApiResponse::success(state.repo::<Scenario>().select_any(filter).await?))
}

/// GET /api/scenarios/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Scenario> {
    Ok(ApiResponse::success(state.repo::<Scenario>().select_404(id).await?))
}

/// POST /api/scenarios
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CreateScenario>,
) -> ApiResult<Scenario> {
    Policy::OrgMemberOrAdmin(input.organization_id)
        .check(&auth, "You can only create scenarios for your own organization")?;
    if state.repo::<Module>().select_id(input.module_id).await?.is_none() {
        return Err(ApiError::not_found("Module not found"));
    }

    let scenario = state.repo::<Scenario>().create(input.into_scenario(auth.user_id)).await?;
    info!(
        scenario_id = scenario.scenario_id,
        organization_id = scenario.organization_id,
        "Scenario created"
    );

    fan_out(&state, &scenario).await;
    Ok(ApiResponse::created(scenario))
}

/// Adds the scenario to the list of every user in its organization.
/// Idempotent per user, so a repeated run never duplicates an entry.
pub async fn fan_out(state: &AppState, scenario: &Scenario) -> usize {
    if scenario.organization_id == 0 {
        return 0;
    }

    let members = match state
        .repo::<User>()
        .select_any(FilterData::with_where(json!({ "organizationId": scenario.organization_id })))
        .await
    {
        Ok(members) => members,
        Err(e) => {
            error!(scenario_id = scenario.scenario_id, "Scenario fan-out could not list members: {}", e);
            return 0;
        }
    };

    let lists = state.repo::<UserScenarios>();
    let mut added = 0;
    for member in &members {
        match lists.add_to_set(member.user_id, SCENARIO_LIST_FIELD, scenario.scenario_id).await {
            Ok(true) => added += 1,
            Ok(false) => {}
            Err(e) => error!(
                scenario_id = scenario.scenario_id,
                user_id = member.user_id,
                "Scenario fan-out failed for user: {}",
                e
            ),
        }
    }
    info!(
        scenario_id = scenario.scenario_id,
        members = members.len(),
        added,
        "Scenario granted to organization members"
    );
    added
}

/// PUT /api/scenarios/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<UpdateScenario>,
) -> ApiResult<Scenario> {
    let scenarios = state.repo::<Scenario>();
    let existing = scenarios.select_404(id).await?;
    Policy::OrgMemberOrAdmin(existing.organization_id)
        .check(&auth, "You can only update scenarios of your own organization")?;

    if let Some(module_id) = input.module_id {
        if state.repo::<Module>().select_id(module_id).await?.is_none() {
            return Err(ApiError::not_found("Module not found"));
        }
    }

    Ok(ApiResponse::success(scenarios.update(id, &input).await?))
}

/// DELETE /api/scenarios/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let scenarios = state.repo::<Scenario>();
    let existing = scenarios.select_404(id).await?;
    Policy::OrgMemberOrAdmin(existing.organization_id)
        .check(&auth, "You can only delete scenarios of your own organization")?;

    scenarios.delete_404(id).await?;
    match state.repo::<UserScenarios>().pull_from_all(SCENARIO_LIST_FIELD, id).await {
        Ok(lists) => info!(scenario_id = id, lists, "Scenario deleted and retracted from user lists"),
        Err(e) => error!(scenario_id = id, "Failed to retract deleted scenario from user lists: {}", e),
    }

    Ok(ApiResponse::message("Scenario successfully deleted"))
}

/// GET /api/scenarios/user/:userId - assigned scenarios in list order
pub async fn for_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i64>,
) -> ApiResult<Vec<Scenario>> {
    Policy::SelfOrAdmin(user_id).check(&auth, "You can only view your own scenarios")?;
    if state.repo::<User>().select_id(user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let ids = state
        .repo::<UserScenarios>()
        .select_id(user_id)
        .await?
        .map(|list| list.scenarios)
        .unwrap_or_default();

    let mut by_id: HashMap<i64, Scenario> = state
        .repo::<Scenario>()
        .select_ids(&ids)
        .await?
        .into_iter()
        .map(|scenario| (scenario.scenario_id, scenario))
        .collect();

    // Entries whose scenario no longer exists are skipped
    let scenarios = ids.iter().filter_map(|id| by_id.remove(id)).collect();
    Ok(ApiResponse::success(scenarios))
}

/// POST /api/scenarios/user/:userId - grant one scenario to one user
pub async fn assign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i64>,
    JsonBody(input): JsonBody<AssignScenario>,
) -> ApiResult<Value> {
    Policy::SelfOrAdmin(user_id).check(&auth, "You can only change your own scenarios")?;
    let scenario_id = input
        .scenario_id
        .ok_or_else(|| ApiError::bad_request("ScenarioId is required"))?;

    if state.repo::<User>().select_id(user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if state.repo::<Scenario>().select_id(scenario_id).await?.is_none() {
        return Err(ApiError::not_found("Scenario not found"));
    }

    let added = state
        .repo::<UserScenarios>()
        .add_to_set(user_id, SCENARIO_LIST_FIELD, scenario_id)
        .await?;
    if !added {
        return Err(ApiError::bad_request("Scenario already added to user"));
    }

    Ok(ApiResponse::created(json!({ "message": "Scenario added to user" })))
}

/// DELETE /api/scenarios/user/:userId/:scenarioId
pub async fn unassign(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, scenario_id)): Path<(i64, i64)>,
) -> ApiResult<Value> {
    Policy::SelfOrAdmin(user_id).check(&auth, "You can only change your own scenarios")?;
    if state.repo::<User>().select_id(user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let removed = state
        .repo::<UserScenarios>()
        .pull(user_id, SCENARIO_LIST_FIELD, scenario_id)
        .await?;
    if !removed {
        warn!(user_id, scenario_id, "Scenario not in user list");
        return Err(ApiError::not_found("Scenario not found in user list or already removed"));
    }

    Ok(ApiResponse::message("Scenario removed from user"))
}

/// GET /api/scenarios/organization/:organizationId
pub async fn for_organization(
    State(state): State<AppState>,
    Path(organization_id): Path<i64>,
) -> ApiResult<Vec<Scenario>> {
    state.repo::<Organization>().select_404(organization_id).await?;
    let scenarios = state
        .repo::<Scenario>()
        .select_any(FilterData::with_where(json!({ "organizationId": organization_id })))
        .await?;
    Ok(ApiResponse::success(scenarios))
}
