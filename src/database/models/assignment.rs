use serde::{Deserialize, Serialize};

use crate::schema::USER_SCENARIOS;

/// Ordered list of scenario ids granted to one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserScenarios {
    pub user_id: i64,
    #[serde(default)]
    pub scenarios: Vec<i64>,
}

resource!(UserScenarios, USER_SCENARIOS, user_id);

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignScenario {
    pub scenario_id: Option<i64>,
}
