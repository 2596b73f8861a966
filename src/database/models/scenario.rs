use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{empty_object, opaque_json, Difficulty};
use crate::schema::SCENARIOS;

string_enum! {
    pub enum FeedbackType {
        Immediate => "immediate",
        Delayed => "delayed",
        Comprehensive => "comprehensive",
        Minimal => "minimal",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub scenario_id: i64,
    pub module_id: i64,
    #[serde(alias = "scenarioTitle")]
    pub title: String,
    #[serde(alias = "scenarioDescription")]
    pub description: String,
    #[serde(alias = "difficultyLevel")]
    pub difficulty: Difficulty,
    /// Minutes.
    #[serde(alias = "durationMinutes")]
    pub duration: i64,
    pub requires_voice: bool,
    pub max_participants: i64,
    pub passing_score: f64,
    pub creator_id: i64,
    pub organization_id: i64,
    #[serde(deserialize_with = "opaque_json", default = "empty_object")]
    pub ai_model_config: Value,
    pub feedback_type: FeedbackType,
    pub version: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

resource!(Scenario, SCENARIOS, scenario_id);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScenario {
    pub module_id: i64,
    #[serde(alias = "scenarioTitle")]
    pub title: String,
    #[serde(alias = "scenarioDescription")]
    pub description: String,
    #[serde(alias = "difficultyLevel")]
    pub difficulty: Difficulty,
    #[serde(alias = "durationMinutes")]
    pub duration: i64,
    pub requires_voice: bool,
    pub max_participants: i64,
    pub passing_score: f64,
    /// Defaults to the authenticated caller.
    #[serde(default)]
    pub creator_id: Option<i64>,
    pub organization_id: i64,
    #[serde(deserialize_with = "opaque_json", default = "empty_object")]
    pub ai_model_config: Value,
    #[serde(default)]
    pub feedback_type: Option<FeedbackType>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CreateScenario {
    pub fn into_scenario(self, caller_id: i64) -> Scenario {
        let now = Utc::now();
        Scenario {
            scenario_id: 0,
            module_id: self.module_id,
            title: self.title,
            description: self.description,
            difficulty: self.difficulty,
            duration: self.duration,
            requires_voice: self.requires_voice,
            max_participants: self.max_participants,
            passing_score: self.passing_score,
            creator_id: self.creator_id.unwrap_or(caller_id),
            organization_id: self.organization_id,
            ai_model_config: self.ai_model_config,
            feedback_type: self.feedback_type.unwrap_or(FeedbackType::Comprehensive),
            version: self.version.unwrap_or_else(|| "1.0".to_string()),
            image_url: self.image_url,
            created_at: now,
            updated_at: now,
        }
    }
}

/// `scenarioId`, `createdAt`, `creatorId` and `organizationId` are immutable
/// and ignored on input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScenario {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_id: Option<i64>,
    #[serde(alias = "scenarioTitle", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(alias = "scenarioDescription", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "difficultyLevel", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(alias = "durationMinutes", skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_voice: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passing_score: Option<f64>,
    #[serde(default, deserialize_with = "optional_opaque_json", skip_serializing_if = "Option::is_none")]
    pub ai_model_config: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_type: Option<FeedbackType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

fn optional_opaque_json<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    opaque_json(deserializer).map(|value| Some(value).filter(|v| !v.is_null()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_applies_defaults_and_normalizes_difficulty() {
        let input: CreateScenario = serde_json::from_value(json!({
            "moduleId": 1,
            "title": "Client Meeting Simulation",
            "description": "Handle a challenging client meeting.",
            "difficulty": "Intermediate",
            "duration": 25,
            "requiresVoice": true,
            "maxParticipants": 3,
            "passingScore": 75,
            "organizationId": 2
        }))
        .unwrap();

        let scenario = input.into_scenario(9);
        assert_eq!(scenario.creator_id, 9);
        assert_eq!(scenario.feedback_type, FeedbackType::Comprehensive);
        assert_eq!(scenario.version, "1.0");
        assert_eq!(scenario.ai_model_config, json!({}));

        let stored = serde_json::to_value(&scenario).unwrap();
        assert_eq!(stored["difficulty"], "intermediate");
    }

    #[test]
    fn accepts_legacy_stored_shape() {
        let scenario: Scenario = serde_json::from_value(json!({
            "scenarioId": 3,
            "moduleId": 2,
            "scenarioTitle": "Team Leadership Challenge",
            "scenarioDescription": "Lead a team through a crisis.",
            "difficultyLevel": "advanced",
            "durationMinutes": 40,
            "requiresVoice": true,
            "maxParticipants": 5,
            "passingScore": 80.0,
            "creatorId": 1,
            "organizationId": 1,
            "aiModelConfig": "{\"responseStyle\":\"varied\"}",
            "feedbackType": "comprehensive",
            "version": "1.1.0",
            "createdAt": "2024-05-01T09:00:00Z",
            "updatedAt": "2024-05-01T09:00:00Z"
        }))
        .unwrap();
        assert_eq!(scenario.title, "Team Leadership Challenge");
        assert_eq!(scenario.ai_model_config["responseStyle"], "varied");
    }
}
