mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestApp;
use officescapes_api::database::models::{Scenario, UserScenarios};
use officescapes_api::handlers::scenarios::fan_out;

fn new_scenario(organization_id: i64) -> Value {
    json!({
        "moduleId": 1,
        "title": "Band Practice Retrospective",
        "description": "Give constructive feedback to a bandmate after a rough rehearsal.",
        "difficulty": "Intermediate",
        "duration": 20,
        "requiresVoice": true,
        "maxParticipants": 2,
        "passingScore": 70,
        "organizationId": organization_id,
        "aiModelConfig": "{\"responseStyle\":\"supportive\"}"
    })
}

async fn scenario_list(app: &TestApp, user_id: i64) -> Result<Vec<i64>> {
    Ok(app
        .state
        .repo::<UserScenarios>()
        .select_id(user_id)
        .await?
        .map(|list| list.scenarios)
        .unwrap_or_default())
}

#[tokio::test]
async fn creating_a_scenario_grants_it_to_every_member_once() -> Result<()> {
    let app = TestApp::seeded().await?;
    let token = app.login_seeded(common::LEONEED).await?;

    let (status, body) = app.post("/api/scenarios", Some(&token), new_scenario(3)).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["scenarioId"], 5);
    assert_eq!(body["creatorId"], 8);
    assert_eq!(body["difficulty"], "intermediate");
    assert_eq!(body["aiModelConfig"]["responseStyle"], "supportive");

    for member in [3, 4, 8] {
        let list = scenario_list(&app, member).await?;
        assert_eq!(list.iter().filter(|id| **id == 5).count(), 1, "user {}: {:?}", member, list);
        assert_eq!(list.last(), Some(&5));
    }
    // Members of other organizations are untouched
    assert!(!scenario_list(&app, 5).await?.contains(&5));

    // Running the fan-out again adds nothing
    let scenario = app.state.repo::<Scenario>().select_404(5).await?;
    assert_eq!(fan_out(&app.state, &scenario).await, 0);
    assert_eq!(scenario_list(&app, 3).await?, vec![1, 2, 4, 5]);
    Ok(())
}

#[tokio::test]
async fn concurrent_fan_out_grants_once() -> Result<()> {
    let app = TestApp::seeded().await?;
    let token = app.login_seeded(common::LEONEED).await?;

    let (status, body) = app.post("/api/scenarios", Some(&token), new_scenario(3)).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    // Start over from lists without the new scenario, then race two grants
    let lists = app.state.repo::<UserScenarios>();
    assert_eq!(lists.pull_from_all("scenarios", 5).await?, 3);
    let scenario = app.state.repo::<Scenario>().select_404(5).await?;

    let (first, second) = tokio::join!(fan_out(&app.state, &scenario), fan_out(&app.state, &scenario));
    assert_eq!(first + second, 3);

    for member in [3, 4, 8] {
        assert_eq!(scenario_list(&app, member).await?, vec![1, 2, 4, 5], "user {}", member);
    }
    Ok(())
}

#[tokio::test]
async fn scenario_creation_is_limited_to_the_callers_organization() -> Result<()> {
    let app = TestApp::seeded().await?;
    let outsider = app.login_seeded(common::HONAMI).await?;

    let (status, _) = app.post("/api/scenarios", Some(&outsider), new_scenario(3)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post("/api/scenarios", None, new_scenario(3)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let member = app.login_seeded(common::LEONEED).await?;
    let mut body = new_scenario(3);
    body["moduleId"] = json!(42);
    let (status, body) = app.post("/api/scenarios", Some(&member), body).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Module not found");
    Ok(())
}

#[tokio::test]
async fn deleting_a_scenario_scrubs_every_list() -> Result<()> {
    let app = TestApp::seeded().await?;
    let member = app.login_seeded(common::LEONEED).await?;
    let student = app.login_seeded(common::ICHIKA).await?;

    // Students of the organization are not its account holders
    let (status, _) = app.delete("/api/scenarios/1", Some(&student)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.delete("/api/scenarios/1", Some(&member)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Scenario successfully deleted");

    for member in [3, 4, 8] {
        assert_eq!(scenario_list(&app, member).await?, vec![2, 4]);
    }
    let (status, _) = app.get("/api/scenarios/1", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn user_scenarios_keep_assignment_order() -> Result<()> {
    let app = TestApp::seeded().await?;
    let token = app.login_seeded(common::HONAMI).await?;

    let (status, body) = app.post("/api/scenarios/user/5", Some(&token), json!({"scenarioId": 1})).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Scenario added to user");

    let (status, body) = app.post("/api/scenarios/user/5", Some(&token), json!({"scenarioId": 1})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Scenario already added to user");

    let (status, body) = app.get("/api/scenarios/user/5", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(|s| s["scenarioId"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![3, 1]);

    let (status, body) = app.post("/api/scenarios/user/5", Some(&token), json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "ScenarioId is required");

    let (status, body) = app.post("/api/scenarios/user/5", Some(&token), json!({"scenarioId": 99})).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Scenario not found");

    let (status, _) = app.get("/api/scenarios/user/3", Some(&token)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn unassigning_twice_is_not_found() -> Result<()> {
    let app = TestApp::seeded().await?;
    let token = app.login_seeded(common::ICHIKA).await?;

    let (status, body) = app.delete("/api/scenarios/user/3/2", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Scenario removed from user");
    assert_eq!(scenario_list(&app, 3).await?, vec![1, 4]);

    let (status, body) = app.delete("/api/scenarios/user/3/2", Some(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Scenario not found in user list or already removed");

    let admin = app.login_seeded(common::ADMIN).await?;
    let (status, body) = app.delete("/api/scenarios/user/404/2", Some(&admin)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
    Ok(())
}

#[tokio::test]
async fn organization_scenarios_and_updates() -> Result<()> {
    let app = TestApp::seeded().await?;
    let token = app.login_seeded(common::LEONEED).await?;

    let (status, body) = app.get("/api/scenarios/organization/3", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(|s| s["scenarioId"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 4]);

    let (status, body) = app.get("/api/scenarios/organization/77", Some(&token)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Organization not found");

    let (status, body) = app
        .put("/api/scenarios/2", Some(&token), json!({"passingScore": 80, "scenarioId": 9}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["scenarioId"], 2);
    assert_eq!(body["passingScore"], 80.0);

    let (status, body) = app.put("/api/scenarios/2", Some(&token), json!({"passingScore": 120})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    Ok(())
}
