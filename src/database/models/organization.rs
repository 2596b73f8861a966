use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::ORGANIZATIONS;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub organization_id: i64,
    #[serde(alias = "organizationName")]
    pub name: String,
    pub industry: String,
    #[serde(default)]
    pub description: Option<String>,
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

resource!(Organization, ORGANIZATIONS, organization_id);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganization {
    #[serde(alias = "organizationName")]
    pub name: String,
    pub industry: String,
    #[serde(default)]
    pub description: Option<String>,
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl From<CreateOrganization> for Organization {
    fn from(input: CreateOrganization) -> Self {
        let now = Utc::now();
        Self {
            organization_id: 0,
            name: input.name,
            industry: input.industry,
            description: input.description,
            contact_email: input.contact_email.trim().to_lowercase(),
            contact_phone: input.contact_phone,
            address: input.address,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// `organizationId` is immutable and ignored on input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrganization {
    #[serde(alias = "organizationName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Dashboard counters returned with an organization to its own members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationStats {
    pub total_applications: i64,
    pub pending_applications: i64,
    pub scenarios: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizationWithStats {
    #[serde(flatten)]
    pub organization: Organization,
    pub stats: OrganizationStats,
}

/// An organization as seen by a graduate browsing where to apply.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableOrganization {
    #[serde(flatten)]
    pub organization: Organization,
    pub application_status: Option<super::ApplicationStatus>,
    pub application_id: Option<i64>,
}
