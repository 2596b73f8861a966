use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{empty_object, opaque_json};
use crate::schema::{ASSESSMENT_RESULTS, TRAINING_SESSIONS};

string_enum! {
    pub enum CompletionStatus {
        NotStarted => "not-started",
        InProgress => "in-progress",
        Completed => "completed",
        Abandoned => "abandoned",
        Failed => "failed",
    }
}

/// One attempt by a user at a scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSession {
    pub session_id: i64,
    pub user_id: i64,
    pub scenario_id: i64,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    pub completion_status: CompletionStatus,
    #[serde(deserialize_with = "opaque_json", default = "empty_object")]
    pub performance_metrics: Value,
    #[serde(default)]
    pub ai_feedback: Option<String>,
}

resource!(TrainingSession, TRAINING_SESSIONS, session_id);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrainingSession {
    pub user_id: i64,
    pub scenario_id: i64,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_status: Option<CompletionStatus>,
    #[serde(deserialize_with = "opaque_json", default = "empty_object")]
    pub performance_metrics: Value,
    #[serde(default)]
    pub ai_feedback: Option<String>,
}

impl From<CreateTrainingSession> for TrainingSession {
    fn from(input: CreateTrainingSession) -> Self {
        Self {
            session_id: 0,
            user_id: input.user_id,
            scenario_id: input.scenario_id,
            start_time: input.start_time.unwrap_or_else(Utc::now),
            end_time: input.end_time,
            completion_status: input.completion_status.unwrap_or(CompletionStatus::InProgress),
            performance_metrics: input.performance_metrics,
            ai_feedback: input.ai_feedback,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrainingSession {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_status: Option<CompletionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_metrics: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_feedback: Option<String>,
}

/// Scored outcome of a training session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub result_id: i64,
    pub user_id: i64,
    pub scenario_id: i64,
    pub session_id: i64,
    pub score: f64,
    pub detailed_feedback: String,
    pub completion_date: DateTime<Utc>,
    #[serde(default)]
    pub reviewer_notes: Option<String>,
    #[serde(deserialize_with = "opaque_json", default = "empty_object")]
    pub skills_ratings: Value,
    #[serde(default)]
    pub improvement_areas: Option<String>,
}

resource!(AssessmentResult, ASSESSMENT_RESULTS, result_id);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentResult {
    pub user_id: i64,
    pub scenario_id: i64,
    pub session_id: i64,
    pub score: f64,
    pub detailed_feedback: String,
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewer_notes: Option<String>,
    #[serde(deserialize_with = "opaque_json", default = "empty_object")]
    pub skills_ratings: Value,
    #[serde(default)]
    pub improvement_areas: Option<String>,
}

impl From<CreateAssessmentResult> for AssessmentResult {
    fn from(input: CreateAssessmentResult) -> Self {
        Self {
            result_id: 0,
            user_id: input.user_id,
            scenario_id: input.scenario_id,
            session_id: input.session_id,
            score: input.score,
            detailed_feedback: input.detailed_feedback,
            completion_date: input.completion_date.unwrap_or_else(Utc::now),
            reviewer_notes: input.reviewer_notes,
            skills_ratings: input.skills_ratings,
            improvement_areas: input.improvement_areas,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssessmentResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_ratings: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub improvement_areas: Option<String>,
}
