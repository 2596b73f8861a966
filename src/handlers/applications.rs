// handlers/applications.rs - /api/applications
//
// Graduates apply to organizations; the organization (or an admin) then
// approves or rejects. Approval moves the applicant into the organization.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Extension,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::auth::Policy;
use crate::database::models::{
    Application, ApplicationDecision, ApplicationStatus, ApplicationWithApplicant, ApplicationWithOrganization,
    CreateApplication, Notification, Organization, Priority, RejectApplication, UpdateUser, User, UserProfile,
    UserType,
};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::state::AppState;

/// GET /api/applications/organization/:organizationId - with applicant name and email
pub async fn for_organization(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(organization_id): Path<i64>,
) -> ApiResult<Vec<ApplicationWithApplicant>> {
    Policy::OrgMemberOrAdmin(organization_id)
        .check(&auth, "Unauthorized: You can only view applications for your organization")?;

    let applications = state
        .repo::<Application>()
        .select_any(FilterData::with_where(json!({ "organizationId": organization_id })))
        .await?;

    let mut user_ids: Vec<i64> = applications.iter().map(|a| a.user_id).collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let emails: HashMap<i64, String> = state
        .repo::<User>()
        .select_ids(&user_ids)
        .await?
        .into_iter()
        .map(|user| (user.user_id, user.email))
        .collect();
    let names: HashMap<i64, String> = state
        .repo::<UserProfile>()
        .select_any(FilterData::with_where(json!({ "userId": { "$in": user_ids } })))
        .await?
        .into_iter()
        .map(|profile| (profile.user_id, profile.full_name()))
        .collect();

    let listed = applications
        .into_iter()
        .map(|application| ApplicationWithApplicant {
            applicant_name: names.get(&application.user_id).cloned(),
            applicant_email: emails.get(&application.user_id).cloned(),
            application,
        })
        .collect();
    Ok(ApiResponse::success(listed))
}

/// GET /api/applications/user/:userId - with the target organization's name
pub async fn for_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i64>,
) -> ApiResult<Vec<ApplicationWithOrganization>> {
    Policy::SelfOrAdmin(user_id).check(&auth, "Unauthorized: You can only view your own applications")?;

    let applications = state
        .repo::<Application>()
        .select_any(FilterData::with_where(json!({ "userId": user_id })))
        .await?;

    let mut organization_ids: Vec<i64> = applications.iter().map(|a| a.organization_id).collect();
    organization_ids.sort_unstable();
    organization_ids.dedup();
    let names: HashMap<i64, String> = state
        .repo::<Organization>()
        .select_ids(&organization_ids)
        .await?
        .into_iter()
        .map(|organization| (organization.organization_id, organization.name))
        .collect();

    let listed = applications
        .into_iter()
        .map(|application| ApplicationWithOrganization {
            organization_name: names.get(&application.organization_id).cloned(),
            application,
        })
        .collect();
    Ok(ApiResponse::success(listed))
}

/// GET /api/applications/:id - visible to the applicant and the target organization
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Application> {
    let application = state.repo::<Application>().select_404(id).await?;
    if !Policy::SelfOrAdmin(application.user_id).allows(&auth) {
        Policy::OrgMemberOrAdmin(application.organization_id)
            .check(&auth, "Unauthorized: You can only view your own applications")?;
    }
    Ok(ApiResponse::success(application))
}

/// POST /api/applications - a graduate applies to an organization
///
/// At most one pending application per user and organization; the store's
/// partial unique index turns a duplicate into 409.
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    JsonBody(input): JsonBody<CreateApplication>,
) -> ApiResult<Value> {
    Policy::RoleIn(&[UserType::Graduate]).check(&auth, "Unauthorized: Only graduates can create applications")?;
    let organization_id = input
        .organization_id
        .ok_or_else(|| ApiError::bad_request("Organization ID is required"))?;
    state.repo::<Organization>().select_404(organization_id).await?;

    let application = state
        .repo::<Application>()
        .create(Application {
            application_id: 0,
            user_id: auth.user_id,
            organization_id,
            status: ApplicationStatus::Pending,
            application_date: input.application_date.unwrap_or_else(Utc::now),
            response_date: None,
            notes: input.notes,
            position: input.position,
            skills: input.skills,
            contact_phone: input.contact_phone,
        })
        .await?;
    info!(
        application_id = application.application_id,
        user_id = auth.user_id,
        organization_id,
        "Application submitted"
    );

    Ok(ApiResponse::created(json!({
        "success": true,
        "message": "Application submitted successfully",
        "application": application,
    })))
}

/// Loads a still-pending application the caller may decide on.
async fn pending_for_decision(state: &AppState, auth: &AuthUser, id: i64, verb: &str) -> Result<Application, ApiError> {
    let application = state.repo::<Application>().select_404(id).await?;
    Policy::OrgMemberOrAdmin(application.organization_id).check(
        auth,
        &format!("Unauthorized: You can only {} applications for your organization", verb),
    )?;
    if application.status != ApplicationStatus::Pending {
        return Err(ApiError::conflict(format!(
            "Application has already been {}",
            application.status
        )));
    }
    Ok(application)
}

/// PUT /api/applications/:id/approve
pub async fn approve(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let application = pending_for_decision(&state, &auth, id, "approve").await?;

    let decision = ApplicationDecision {
        status: ApplicationStatus::Approved,
        response_date: Utc::now(),
        notes: None,
    };
    state.repo::<Application>().update(id, &decision).await?;

    let membership = UpdateUser {
        organization_id: Some(application.organization_id),
        ..Default::default()
    };
    match state.repo::<User>().update(application.user_id, &membership).await {
        Ok(_) => {}
        Err(DatabaseError::NotFound(_)) => {
            warn!(application_id = id, user_id = application.user_id, "Approved application of a missing user");
        }
        Err(e) => return Err(e.into()),
    }
    info!(
        application_id = id,
        user_id = application.user_id,
        organization_id = application.organization_id,
        "Application approved"
    );

    notify_applicant(&state, &application, ApplicationStatus::Approved).await;
    Ok(ApiResponse::success(json!({
        "success": true,
        "message": "Application approved successfully",
    })))
}

/// PUT /api/applications/:id/reject - optional `notes` replace the stored ones
pub async fn reject(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    body: Option<JsonBody<RejectApplication>>,
) -> ApiResult<Value> {
    let application = pending_for_decision(&state, &auth, id, "reject").await?;
    let notes = body
        .and_then(|JsonBody(input)| input.notes)
        .filter(|notes| !notes.trim().is_empty())
        .or_else(|| application.notes.clone());

    let decision = ApplicationDecision {
        status: ApplicationStatus::Rejected,
        response_date: Utc::now(),
        notes,
    };
    state.repo::<Application>().update(id, &decision).await?;
    info!(application_id = id, user_id = application.user_id, "Application rejected");

    notify_applicant(&state, &application, ApplicationStatus::Rejected).await;
    Ok(ApiResponse::success(json!({
        "success": true,
        "message": "Application rejected successfully",
    })))
}

/// Tells the applicant about the decision. A failure here never undoes it.
async fn notify_applicant(state: &AppState, application: &Application, outcome: ApplicationStatus) {
    let organization = match state.repo::<Organization>().select_id(application.organization_id).await {
        Ok(Some(organization)) => organization.name,
        _ => "the organization".to_string(),
    };
    let notification = match outcome {
        ApplicationStatus::Approved => Notification::new(
            application.user_id,
            "Application approved",
            format!("Your application to {} has been approved. Welcome aboard!", organization),
            Priority::High,
        )
        .with_action("/dashboard"),
        _ => Notification::new(
            application.user_id,
            "Application rejected",
            format!("Your application to {} was not accepted.", organization),
            Priority::Medium,
        )
        .with_action("/applications"),
    };

    if let Err(e) = state.repo::<Notification>().create(notification).await {
        error!(
            application_id = application.application_id,
            user_id = application.user_id,
            "Failed to notify applicant: {}",
            e
        );
    }
}
