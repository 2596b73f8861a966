use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::MODULES;

string_enum! {
    pub enum Difficulty {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
        Expert => "expert",
        Mixed => "mixed",
    }
}

string_enum! {
    pub enum ModuleStatus {
        Draft => "draft",
        Published => "published",
        Active => "active",
        Archived => "archived",
        Deprecated => "deprecated",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    pub module_id: i64,
    #[serde(alias = "moduleName")]
    pub name: String,
    #[serde(alias = "moduleDescription")]
    pub description: String,
    #[serde(alias = "moduleDifficultyLevel")]
    pub difficulty: Difficulty,
    /// Module that should be completed first.
    #[serde(default)]
    pub prerequisites: Option<i64>,
    pub estimated_duration: i64,
    pub learning_objectives: String,
    pub category: String,
    /// Comma-separated.
    #[serde(default)]
    pub tags: Option<String>,
    pub status: ModuleStatus,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

resource!(Module, MODULES, module_id);

impl Module {
    pub fn skills(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Module as returned to clients, with tags expanded into a skills list.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleView {
    #[serde(flatten)]
    pub module: Module,
    pub skills: Vec<String>,
}

impl From<Module> for ModuleView {
    fn from(module: Module) -> Self {
        let skills = module.skills();
        Self { module, skills }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateModule {
    #[serde(alias = "moduleName")]
    pub name: String,
    #[serde(alias = "moduleDescription")]
    pub description: String,
    #[serde(alias = "moduleDifficultyLevel")]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub prerequisites: Option<i64>,
    pub estimated_duration: i64,
    pub learning_objectives: String,
    pub category: String,
    #[serde(default)]
    pub tags: Option<String>,
    pub status: Option<ModuleStatus>,
}

impl From<CreateModule> for Module {
    fn from(input: CreateModule) -> Self {
        Self {
            module_id: 0,
            name: input.name,
            description: input.description,
            difficulty: input.difficulty,
            prerequisites: input.prerequisites,
            estimated_duration: input.estimated_duration,
            learning_objectives: input.learning_objectives,
            category: input.category,
            tags: input.tags,
            status: input.status.unwrap_or(ModuleStatus::Draft),
            updated_at: Some(Utc::now()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateModule {
    #[serde(alias = "moduleName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "moduleDescription", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "moduleDifficultyLevel", skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisites: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_objectives: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ModuleStatus>,
}
