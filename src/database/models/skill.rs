use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::{SKILLS, USER_SKILLS};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub skill_id: i64,
    pub skill_name: String,
    pub skill_category: String,
    pub skill_description: String,
    pub evaluation_criteria: String,
}

resource!(Skill, SKILLS, skill_id);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSkill {
    pub skill_name: String,
    pub skill_category: String,
    pub skill_description: String,
    pub evaluation_criteria: String,
}

impl From<CreateSkill> for Skill {
    fn from(input: CreateSkill) -> Self {
        Self {
            skill_id: 0,
            skill_name: input.skill_name,
            skill_category: input.skill_category,
            skill_description: input.skill_description,
            evaluation_criteria: input.evaluation_criteria,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSkill {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_criteria: Option<String>,
}

/// A user's assessed proficiency (1 to 5) in one skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSkill {
    pub user_skill_id: i64,
    pub user_id: i64,
    pub skill_id: i64,
    pub proficiency_level: i64,
    pub last_assessed: DateTime<Utc>,
    #[serde(default)]
    pub endorsed_by: Option<String>,
}

resource!(UserSkill, USER_SKILLS, user_skill_id);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserSkill {
    pub user_id: i64,
    pub skill_id: i64,
    pub proficiency_level: i64,
    #[serde(default)]
    pub last_assessed: Option<DateTime<Utc>>,
    #[serde(default)]
    pub endorsed_by: Option<String>,
}

impl From<CreateUserSkill> for UserSkill {
    fn from(input: CreateUserSkill) -> Self {
        Self {
            user_skill_id: 0,
            user_id: input.user_id,
            skill_id: input.skill_id,
            proficiency_level: input.proficiency_level,
            last_assessed: input.last_assessed.unwrap_or_else(Utc::now),
            endorsed_by: input.endorsed_by,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserSkill {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proficiency_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_assessed: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endorsed_by: Option<String>,
}
