// handlers/organizations.rs - /api/organizations

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::query::{list_filter, ListParams};
use crate::auth::Policy;
use crate::database::models::{
    Application, AvailableOrganization, CreateOrganization, Organization, OrganizationStats, OrganizationWithStats,
    Scenario, UpdateOrganization, UpdateUser, User, UserType,
};
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::schema::ORGANIZATIONS;
use crate::state::AppState;

/// GET /api/organizations
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult<Vec<Organization>> {
    let filter = list_filter(&ORGANIZATIONS, &params, &state.config.api, None)?;
    Ok(ApiResponse::success(state.repo::<Organization>().select_any(filter).await?))
}

/// GET /api/organizations/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Organization> {
    Ok(ApiResponse::success(state.repo::<Organization>().select_404(id).await?))
}

/// GET /api/organizations/auth/:id - the organization with its dashboard counters
pub async fn get_with_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<OrganizationWithStats> {
    Policy::OrgMemberOrAdmin(id).check(&auth, "You can only view your own organization")?;
    let organization = state.repo::<Organization>().select_404(id).await?;

    let applications = state.repo::<Application>();
    let stats = OrganizationStats {
        total_applications: applications
            .count(FilterData::with_where(json!({ "organizationId": id })))
            .await?,
        pending_applications: applications
            .count(FilterData::with_where(json!({ "organizationId": id, "status": "pending" })))
            .await?,
        scenarios: state
            .repo::<Scenario>()
            .count(FilterData::with_where(json!({ "organizationId": id })))
            .await?,
    };

    Ok(ApiResponse::success(OrganizationWithStats { organization, stats }))
}

/// GET /api/organizations/available/all - every organization with the
/// caller's latest application to it, if any
pub async fn available(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<AvailableOrganization>> {
    Policy::RoleIn(&[UserType::Graduate, UserType::Admin])
        .check(&auth, "Only graduates can browse organizations to apply to")?;

    let organizations = state.repo::<Organization>().select_any(FilterData::all()).await?;
    let applications = state
        .repo::<Application>()
        .select_any(FilterData::with_where(json!({ "userId": auth.user_id })))
        .await?;

    let mut latest: HashMap<i64, Application> = HashMap::new();
    for application in applications {
        let newer = latest
            .get(&application.organization_id)
            .map(|seen| {
                (application.application_date, application.application_id) > (seen.application_date, seen.application_id)
            })
            .unwrap_or(true);
        if newer {
            latest.insert(application.organization_id, application);
        }
    }

    let available = organizations
        .into_iter()
        .map(|organization| {
            let application = latest.get(&organization.organization_id);
            AvailableOrganization {
                application_status: application.map(|a| a.status),
                application_id: application.map(|a| a.application_id),
                organization,
            }
        })
        .collect();
    Ok(ApiResponse::success(available))
}

/// POST /api/organizations - an organization account without one becomes
/// its member; the link shows up in tokens issued from the next login
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CreateOrganization>,
) -> ApiResult<Organization> {
    Policy::RoleIn(&[UserType::Organization, UserType::Admin])
        .check(&auth, "Only organization accounts can create organizations")?;

    let organization = state.repo::<Organization>().create(input.into()).await?;
    info!(organization_id = organization.organization_id, created_by = auth.user_id, "Organization created");

    if auth.user_type == UserType::Organization && auth.organization_id == 0 {
        let membership = UpdateUser {
            organization_id: Some(organization.organization_id),
            ..Default::default()
        };
        state.repo::<User>().update(auth.user_id, &membership).await?;
        info!(
            organization_id = organization.organization_id,
            user_id = auth.user_id,
            "Organization account linked to its organization"
        );
    }
    Ok(ApiResponse::created(organization))
}

/// PUT /api/organizations/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    JsonBody(mut input): JsonBody<UpdateOrganization>,
) -> ApiResult<Organization> {
    Policy::OrgMemberOrAdmin(id).check(&auth, "You can only update your own organization")?;
    input.contact_email = input.contact_email.map(|email| email.trim().to_lowercase());

    Ok(ApiResponse::success(state.repo::<Organization>().update(id, &input).await?))
}

/// DELETE /api/organizations/:id - members are left without an organization
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    Policy::OrgMemberOrAdmin(id).check(&auth, "You can only delete your own organization")?;
    state.repo::<Organization>().delete_404(id).await?;
    info!(organization_id = id, deleted_by = auth.user_id, "Organization deleted");

    let users = state.repo::<User>();
    match users.select_any(FilterData::with_where(json!({ "organizationId": id }))).await {
        Ok(members) => {
            let detached = UpdateUser {
                organization_id: Some(0),
                ..Default::default()
            };
            for member in members {
                if let Err(e) = users.update(member.user_id, &detached).await {
                    warn!(
                        organization_id = id,
                        user_id = member.user_id,
                        "Failed to detach member of removed organization: {}",
                        e
                    );
                }
            }
        }
        Err(e) => warn!(organization_id = id, "Failed to list members of removed organization: {}", e),
    }

    Ok(ApiResponse::message("Organization deleted successfully"))
}
