// handlers/auth/mod.rs - /api/auth: token acquisition and session handling

pub mod login;
pub mod refresh;
pub mod register;
pub mod session;

pub use login::login;
pub use refresh::refresh_token;
pub use register::register;
pub use session::{logout, verify};

use serde::Serialize;

use crate::auth::{TokenIdentity, TokenPair};
use crate::database::models::{User, UserProfile, UserType};
use crate::database::DatabaseError;
use crate::handlers::profile_of;
use crate::state::AppState;

/// Identity summary returned next to freshly issued tokens.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub user_id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_new: bool,
    pub user_type: UserType,
    pub organization_id: i64,
}

impl SessionUser {
    pub fn new(user: &User, profile: Option<&UserProfile>) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email.clone(),
            first_name: profile.map(|p| p.first_name.clone()),
            last_name: profile.map(|p| p.last_name.clone()),
            is_new: !profile.map(UserProfile::is_complete).unwrap_or(false),
            user_type: user.user_type,
            organization_id: user.organization_id,
        }
    }

    pub fn identity(&self) -> TokenIdentity {
        TokenIdentity {
            user_id: self.user_id,
            email: self.email.clone(),
            user_type: self.user_type,
            organization_id: self.organization_id,
            is_new: self.is_new,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(flatten)]
    pub tokens: TokenPair,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SessionUser>,
}

/// Summary of a stored user, reading the profile to decide `isNew`.
pub(crate) async fn session_user(state: &AppState, user: &User) -> Result<SessionUser, DatabaseError> {
    let profile = profile_of(&state.repo::<UserProfile>(), user.user_id).await?;
    Ok(SessionUser::new(user, profile.as_ref()))
}
