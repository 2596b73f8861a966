use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::APPLICATIONS;

string_enum! {
    pub enum ApplicationStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

/// A graduate's request to join an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: i64,
    pub user_id: i64,
    pub organization_id: i64,
    pub status: ApplicationStatus,
    pub application_date: DateTime<Utc>,
    #[serde(default)]
    pub response_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub skills: Option<Value>,
    #[serde(default)]
    pub contact_phone: Option<String>,
}

resource!(Application, APPLICATIONS, application_id);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApplication {
    pub organization_id: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub skills: Option<Value>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub application_date: Option<DateTime<Utc>>,
}

/// Stored fields changed when an organization decides an application.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDecision {
    pub status: ApplicationStatus,
    pub response_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RejectApplication {
    #[serde(default)]
    pub notes: Option<String>,
}

/// Application listed for an organization, with the applicant's identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationWithApplicant {
    #[serde(flatten)]
    pub application: Application,
    pub applicant_name: Option<String>,
    pub applicant_email: Option<String>,
}

/// Application listed for its applicant, with the target organization's name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationWithOrganization {
    #[serde(flatten)]
    pub application: Application,
    pub organization_name: Option<String>,
}
