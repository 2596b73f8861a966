use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::USERS;

string_enum! {
    pub enum UserType {
        Student => "student",
        Instructor => "instructor",
        Manager => "manager",
        Admin => "admin",
        Graduate => "graduate",
        Organization => "organization",
    }
}

string_enum! {
    pub enum AccountStatus {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
        Pending => "pending",
    }
}

/// Stored user document. Never serialize this into a response; use [`UserResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: i64,
    /// 0 while the user belongs to no organization.
    #[serde(default)]
    pub organization_id: i64,
    pub email: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    pub account_status: AccountStatus,
    #[serde(default)]
    pub verification_status: bool,
}

resource!(User, USERS, user_id);

/// Public view of a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: i64,
    pub organization_id: i64,
    pub email: String,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub account_status: AccountStatus,
    pub verification_status: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            organization_id: user.organization_id,
            email: user.email,
            user_type: user.user_type,
            created_at: user.created_at,
            last_login: user.last_login,
            last_updated: user.last_updated,
            account_status: user.account_status,
            verification_status: user.verification_status,
        }
    }
}

/// Admin-side account creation. The password arrives in clear and is hashed
/// before storage; `passwordHash` is accepted as a legacy alias.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub email: Option<String>,
    #[serde(alias = "passwordHash")]
    pub password: Option<String>,
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub organization_id: i64,
    pub account_status: Option<AccountStatus>,
    #[serde(default)]
    pub verification_status: bool,
}

/// Mutable user fields. `userId`, `passwordHash` and `createdAt` are not
/// listed and therefore ignored on input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_status: Option<AccountStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<bool>,
}

impl UpdateUser {
    /// Fields only an administrator may change.
    pub fn touches_privileged_fields(&self) -> bool {
        self.user_type.is_some()
            || self.organization_id.is_some()
            || self.account_status.is_some()
            || self.verification_status.is_some()
    }
}
