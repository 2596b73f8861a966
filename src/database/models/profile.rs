use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::USER_PROFILES;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub profile_id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub dark_mode_pref: bool,
    #[serde(default)]
    pub preferred_language: Option<String>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

resource!(UserProfile, USER_PROFILES, profile_id);

impl UserProfile {
    /// A profile counts as complete once the user has set bio and phone.
    pub fn is_complete(&self) -> bool {
        self.bio.is_some() && self.phone.is_some()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfile {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub dark_mode_pref: bool,
    #[serde(default)]
    pub preferred_language: Option<String>,
}

impl From<CreateProfile> for UserProfile {
    fn from(input: CreateProfile) -> Self {
        Self {
            profile_id: 0,
            user_id: input.user_id,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            bio: input.bio,
            profile_picture: input.profile_picture,
            dark_mode_pref: input.dark_mode_pref,
            preferred_language: input.preferred_language.or_else(|| Some("en".to_string())),
            last_updated: Some(Utc::now()),
        }
    }
}

/// `profileId` and `userId` are immutable and ignored on input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_mode_pref: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_language: Option<String>,
}
