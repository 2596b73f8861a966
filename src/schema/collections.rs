use super::{FieldKind::*, FieldSpec as F, Schema, UniqueIndex};
use crate::database::models::{
    AccountStatus, ApplicationStatus, CompletionStatus, Difficulty, FeedbackType, ModuleStatus, Priority, UserType,
};

pub static USERS: Schema = Schema {
    collection: "users",
    table: "users",
    label: "User",
    key: "userId",
    sequenced: true,
    fields: &[
        F::required("organizationId", Int),
        F::required("email", Email),
        F::required("passwordHash", String),
        F::required("userType", String).one_of(UserType::VALUES),
        F::required("createdAt", Timestamp),
        F::optional("lastLogin", Timestamp),
        F::optional("lastUpdated", Timestamp),
        F::required("accountStatus", String).one_of(AccountStatus::VALUES),
        F::required("verificationStatus", Bool),
    ],
    unique: &[UniqueIndex {
        name: "users_email_key",
        fields: &["email"],
        partial: None,
        message: "Email already in use",
    }],
    filterable: &["organizationId", "userType", "accountStatus", "email"],
    updated_at: Some("lastUpdated"),
};

pub static USER_PROFILES: Schema = Schema {
    collection: "userProfiles",
    table: "user_profiles",
    label: "User profile",
    key: "profileId",
    sequenced: true,
    fields: &[
        F::required("userId", Int),
        F::required("firstName", String),
        F::required("lastName", String),
        F::optional("phone", String),
        F::optional("bio", String),
        F::optional("profilePicture", String),
        F::required("darkModePref", Bool),
        F::optional("preferredLanguage", String),
        F::optional("lastUpdated", Timestamp),
    ],
    unique: &[UniqueIndex {
        name: "user_profiles_user_id_key",
        fields: &["userId"],
        partial: None,
        message: "Profile already exists for this user",
    }],
    filterable: &["userId"],
    updated_at: Some("lastUpdated"),
};

pub static ORGANIZATIONS: Schema = Schema {
    collection: "organizations",
    table: "organizations",
    label: "Organization",
    key: "organizationId",
    sequenced: true,
    fields: &[
        F::required("name", String),
        F::required("industry", String),
        F::optional("description", String),
        F::required("contactEmail", Email),
        F::optional("contactPhone", String),
        F::optional("address", String),
        F::optional("createdAt", Timestamp),
        F::optional("updatedAt", Timestamp),
    ],
    unique: &[],
    filterable: &["industry"],
    updated_at: Some("updatedAt"),
};

pub static MODULES: Schema = Schema {
    collection: "modules",
    table: "modules",
    label: "Module",
    key: "moduleId",
    sequenced: true,
    fields: &[
        F::required("name", String),
        F::required("description", String),
        F::required("difficulty", String).one_of(Difficulty::VALUES),
        F::optional("prerequisites", Int),
        F::required("estimatedDuration", Int).at_least(1.0),
        F::required("learningObjectives", String),
        F::required("category", String),
        F::optional("tags", String),
        F::required("status", String).one_of(ModuleStatus::VALUES),
        F::optional("updatedAt", Timestamp),
    ],
    unique: &[],
    filterable: &["category", "difficulty", "status"],
    updated_at: Some("updatedAt"),
};

pub static SCENARIOS: Schema = Schema {
    collection: "scenarios",
    table: "scenarios",
    label: "Scenario",
    key: "scenarioId",
    sequenced: true,
    fields: &[
        F::required("moduleId", Int),
        F::required("title", String),
        F::required("description", String),
        F::required("difficulty", String).one_of(Difficulty::VALUES),
        F::required("duration", Int).at_least(1.0),
        F::required("requiresVoice", Bool),
        F::required("maxParticipants", Int).at_least(1.0),
        F::required("passingScore", Float).range(0.0, 100.0),
        F::required("creatorId", Int),
        F::required("organizationId", Int),
        F::required("aiModelConfig", Json),
        F::required("feedbackType", String).one_of(FeedbackType::VALUES),
        F::required("version", String),
        F::optional("imageUrl", String),
        F::required("createdAt", Timestamp),
        F::required("updatedAt", Timestamp),
    ],
    unique: &[],
    filterable: &["moduleId", "organizationId", "creatorId", "difficulty"],
    updated_at: Some("updatedAt"),
};

pub static APPLICATIONS: Schema = Schema {
    collection: "applications",
    table: "applications",
    label: "Application",
    key: "applicationId",
    sequenced: true,
    fields: &[
        F::required("userId", Int),
        F::required("organizationId", Int),
        F::required("status", String).one_of(ApplicationStatus::VALUES),
        F::required("applicationDate", Timestamp),
        F::optional("responseDate", Timestamp),
        F::optional("notes", String),
        F::optional("position", String),
        F::optional("skills", Json),
        F::optional("contactPhone", String),
    ],
    unique: &[UniqueIndex {
        name: "applications_pending_key",
        fields: &["userId", "organizationId"],
        partial: Some(("status", "pending")),
        message: "You already have a pending application for this organization",
    }],
    filterable: &["userId", "organizationId", "status"],
    updated_at: None,
};

pub static TRAINING_SESSIONS: Schema = Schema {
    collection: "trainingSessions",
    table: "training_sessions",
    label: "Training session",
    key: "sessionId",
    sequenced: true,
    fields: &[
        F::required("userId", Int),
        F::required("scenarioId", Int),
        F::required("startTime", Timestamp),
        F::optional("endTime", Timestamp),
        F::required("completionStatus", String).one_of(CompletionStatus::VALUES),
        F::required("performanceMetrics", Json),
        F::optional("aiFeedback", String),
    ],
    unique: &[],
    filterable: &["userId", "scenarioId", "completionStatus"],
    updated_at: None,
};

pub static ASSESSMENT_RESULTS: Schema = Schema {
    collection: "assessmentResults",
    table: "assessment_results",
    label: "Assessment result",
    key: "resultId",
    sequenced: true,
    fields: &[
        F::required("userId", Int),
        F::required("scenarioId", Int),
        F::required("sessionId", Int),
        F::required("score", Float).range(0.0, 100.0),
        F::required("detailedFeedback", String),
        F::required("completionDate", Timestamp),
        F::optional("reviewerNotes", String),
        F::required("skillsRatings", Json),
        F::optional("improvementAreas", String),
    ],
    unique: &[],
    filterable: &["userId", "scenarioId", "sessionId"],
    updated_at: None,
};

pub static SKILLS: Schema = Schema {
    collection: "skills",
    table: "skills",
    label: "Skill",
    key: "skillId",
    sequenced: true,
    fields: &[
        F::required("skillName", String),
        F::required("skillCategory", String),
        F::required("skillDescription", String),
        F::required("evaluationCriteria", String),
    ],
    unique: &[],
    filterable: &["skillCategory"],
    updated_at: None,
};

pub static USER_SKILLS: Schema = Schema {
    collection: "userSkills",
    table: "user_skills",
    label: "User skill",
    key: "userSkillId",
    sequenced: true,
    fields: &[
        F::required("userId", Int),
        F::required("skillId", Int),
        F::required("proficiencyLevel", Int).range(1.0, 5.0),
        F::required("lastAssessed", Timestamp),
        F::optional("endorsedBy", String),
    ],
    unique: &[UniqueIndex {
        name: "user_skills_user_skill_key",
        fields: &["userId", "skillId"],
        partial: None,
        message: "This skill is already recorded for the user",
    }],
    filterable: &["userId", "skillId"],
    updated_at: None,
};

pub static NOTIFICATIONS: Schema = Schema {
    collection: "notifications",
    table: "notifications",
    label: "Notification",
    key: "notificationId",
    sequenced: true,
    fields: &[
        F::required("userId", Int),
        F::required("notificationTitle", String),
        F::required("content", String),
        F::required("createdAt", Timestamp),
        F::required("readStatus", Bool),
        F::required("priority", String).one_of(Priority::VALUES),
        F::optional("actionUrl", String),
        F::optional("expiryDate", Timestamp),
    ],
    unique: &[],
    filterable: &["userId", "readStatus", "priority"],
    updated_at: None,
};

/// Per-user scenario assignment lists, keyed by the owning user's id.
pub static USER_SCENARIOS: Schema = Schema {
    collection: "userScenarios",
    table: "user_scenarios",
    label: "Scenario assignment",
    key: "userId",
    sequenced: false,
    fields: &[F::required("scenarios", IntArray)],
    unique: &[],
    filterable: &[],
    updated_at: None,
};

/// Every collection, in seeding order.
pub static ALL: &[&Schema] = &[
    &USERS,
    &USER_PROFILES,
    &ORGANIZATIONS,
    &MODULES,
    &SCENARIOS,
    &APPLICATIONS,
    &TRAINING_SESSIONS,
    &ASSESSMENT_RESULTS,
    &SKILLS,
    &USER_SKILLS,
    &NOTIFICATIONS,
    &USER_SCENARIOS,
];
