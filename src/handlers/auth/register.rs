// handlers/auth/register.rs - POST /api/auth/register

use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::{SessionUser, TokenResponse};
use crate::auth::hash_password;
use crate::database::models::{AccountStatus, CreateProfile, User, UserProfile, UserType};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::schema::is_valid_email;
use crate::state::AppState;

const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_type: Option<String>,
}

/// Checked registration input.
#[derive(Debug)]
struct Registration {
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    user_type: UserType,
}

impl RegisterRequest {
    fn validate(self) -> Result<Registration, ApiError> {
        let email = present(self.email).ok_or_else(|| ApiError::bad_request("Email address is required"))?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::bad_request("Password is required"))?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::bad_request("Password must be at least 6 characters long"));
        }
        let first_name = present(self.first_name).ok_or_else(|| ApiError::bad_request("First name is required"))?;
        let last_name = present(self.last_name).ok_or_else(|| ApiError::bad_request("Last name is required"))?;

        let email = email.to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::bad_request(
                "Invalid email format. Please enter a valid email address.",
            ));
        }

        // Self-service accounts are graduates or organizations; other roles are assigned by an admin
        let user_type = match self.user_type.as_deref().map(str::parse::<UserType>) {
            None => UserType::Graduate,
            Some(Ok(t @ (UserType::Graduate | UserType::Organization))) => t,
            Some(_) => return Err(ApiError::bad_request("User type must be graduate or organization")),
        };

        Ok(Registration {
            email,
            password,
            first_name,
            last_name,
            user_type,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /api/auth/register - create an account and its profile, then sign in
pub async fn register(State(state): State<AppState>, JsonBody(input): JsonBody<RegisterRequest>) -> ApiResult<TokenResponse> {
    let input = input.validate()?;
    let users = state.repo::<User>();
    let profiles = state.repo::<UserProfile>();

    // The unique index still decides concurrent registrations
    let taken = users
        .count(FilterData::with_where(json!({ "email": input.email })))
        .await?;
    if taken > 0 {
        return Err(ApiError::conflict("Email already in use"));
    }

    let password_hash = hash_password(&input.password, state.config.security.bcrypt_cost).await?;
    let user = users
        .create(User {
            user_id: 0,
            organization_id: 0,
            email: input.email,
            password_hash,
            user_type: input.user_type,
            created_at: Utc::now(),
            last_login: None,
            last_updated: None,
            account_status: AccountStatus::Active,
            verification_status: false,
        })
        .await?;

    let profile = CreateProfile {
        user_id: user.user_id,
        first_name: input.first_name,
        last_name: input.last_name,
        phone: None,
        bio: None,
        profile_picture: None,
        dark_mode_pref: false,
        preferred_language: None,
    };
    let profile = match profiles.create(UserProfile::from(profile)).await {
        Ok(profile) => profile,
        Err(e) => {
            // Do not leave an account without a profile behind
            if let Err(cleanup) = users.delete(user.user_id).await {
                error!(user_id = user.user_id, "Failed to roll back user after profile error: {}", cleanup);
            }
            return Err(e.into());
        }
    };

    let session = SessionUser::new(&user, Some(&profile));
    let tokens = state.tokens.issue(session.identity())?;
    info!(user_id = user.user_id, user_type = %user.user_type, "User registered");

    Ok(ApiResponse::created(TokenResponse {
        success: true,
        message: Some("User registered successfully"),
        tokens,
        user: Some(session),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, password: &str, user_type: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            first_name: Some("Ichika".to_string()),
            last_name: Some("Hoshino".to_string()),
            user_type: user_type.map(String::from),
        }
    }

    #[test]
    fn normalizes_email_and_defaults_to_graduate() {
        let registration = request(" Ichika@Leo.co.jp ", "password123", None).validate().unwrap();
        assert_eq!(registration.email, "ichika@leo.co.jp");
        assert_eq!(registration.user_type, UserType::Graduate);
    }

    #[test]
    fn rejects_short_passwords_and_bad_emails() {
        let err = request("ichika@leo.co.jp", "12345", None).validate().unwrap_err();
        assert_eq!(err.message(), "Password must be at least 6 characters long");
        let err = request("ichika@leo", "password123", None).validate().unwrap_err();
        assert_eq!(err.message(), "Invalid email format. Please enter a valid email address.");
    }

    #[test]
    fn privileged_roles_cannot_self_register() {
        assert!(request("a@leo.co.jp", "password123", Some("admin")).validate().is_err());
        let org = request("a@leo.co.jp", "password123", Some("organization")).validate().unwrap();
        assert_eq!(org.user_type, UserType::Organization);
    }

    #[test]
    fn reports_the_first_missing_field() {
        let mut input = request("a@leo.co.jp", "password123", None);
        input.last_name = Some("  ".into());
        assert_eq!(input.validate().unwrap_err().message(), "Last name is required");
    }
}
