mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::TestApp;
use officescapes_api::database::models::UserScenarios;

#[tokio::test]
async fn user_listings_never_expose_password_hashes() -> Result<()> {
    let app = TestApp::seeded().await?;

    let (status, body) = app.get("/api/users", None).await?;
    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 9);
    assert!(users.iter().all(|u| u.get("passwordHash").is_none()));

    let (status, body) = app.get("/api/users/3", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], common::ICHIKA);
    assert!(body.get("passwordHash").is_none());

    let (status, body) = app.get("/api/users/404", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
    Ok(())
}

#[tokio::test]
async fn list_filters_and_pages() -> Result<()> {
    let app = TestApp::seeded().await?;

    let (status, body) = app.get("/api/users?organizationId=3", None).await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(|u| u["userId"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![3, 4, 8]);

    let (_, body) = app.get("/api/users?limit=2&offset=2", None).await?;
    let ids: Vec<i64> = body.as_array().unwrap().iter().map(|u| u["userId"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![3, 4]);

    let (status, body) = app.get("/api/users?passwordHash=x", None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot filter users by 'passwordHash'");
    Ok(())
}

#[tokio::test]
async fn users_edit_themselves_but_not_their_privileges() -> Result<()> {
    let app = TestApp::seeded().await?;
    let token = app.login_seeded(common::ICHIKA).await?;

    let (status, body) = app
        .put("/api/users/3", Some(&token), json!({"email": "Ichika@Leo.co.jp", "userId": 99}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["email"], "ichika@leo.co.jp");
    assert_eq!(body["userId"], 3);
    assert!(body["lastUpdated"].as_str().is_some());

    let (status, _) = app.put("/api/users/3", Some(&token), json!({"userType": "admin"})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.put("/api/users/4", Some(&token), json!({"email": "saki@leo.co.jp"})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.put("/api/users/3", None, json!({"email": "x@leo.co.jp"})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn only_admins_create_users() -> Result<()> {
    let app = TestApp::seeded().await?;
    let student = app.login_seeded(common::ICHIKA).await?;
    let admin = app.login_seeded(common::ADMIN).await?;
    let body = json!({"email": "rin@vsingers.com", "password": "kagamine", "userType": "instructor", "organizationId": 1});

    let (status, _) = app.post("/api/users", Some(&student), body.clone()).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.post("/api/users", Some(&admin), body).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["userId"], 10);
    assert!(created.get("passwordHash").is_none());

    app.login("rin@vsingers.com", "kagamine").await?;

    let (status, body) = app.post("/api/users", Some(&admin), json!({"email": "len@vsingers.com"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields");
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_removes_profile_and_scenario_list() -> Result<()> {
    let app = TestApp::seeded().await?;
    let admin = app.login_seeded(common::ADMIN).await?;
    let other = app.login_seeded(common::HONAMI).await?;

    let (status, _) = app.delete("/api/users/3", Some(&other)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.delete("/api/users/3", Some(&admin)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");

    let (status, _) = app.get("/api/users/3", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app.get("/api/profiles/user/3", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User profile not found");
    assert!(app.state.repo::<UserScenarios>().select_id(3).await?.is_none());

    let (status, _) = app.delete("/api/users/3", Some(&admin)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn profiles_belong_to_their_user() -> Result<()> {
    let app = TestApp::seeded().await?;
    let ichika = app.login_seeded(common::ICHIKA).await?;

    let (status, body) = app
        .put("/api/profiles/3", Some(&ichika), json!({"bio": "Practising every day.", "userId": 4}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["bio"], "Practising every day.");
    assert_eq!(body["userId"], 3);

    let (status, _) = app.put("/api/profiles/4", Some(&ichika), json!({"bio": "hijacked"})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A second profile for the same user breaks the unique index
    let (status, body) = app
        .post(
            "/api/profiles",
            Some(&ichika),
            json!({"userId": 3, "firstName": "Hoshino", "lastName": "Ichika"}),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
    Ok(())
}

#[tokio::test]
async fn completing_a_profile_clears_is_new() -> Result<()> {
    let app = TestApp::seeded().await?;
    let token = app.login_seeded(common::MIZUKI).await?;

    let (_, body) = app.get("/api/auth/verify", Some(&token)).await?;
    assert_eq!(body["user"]["isNew"], true);

    let (status, _) = app
        .put("/api/profiles/9", Some(&token), json!({"bio": "Editor at Nightcord.", "phone": "5566778800"}))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get("/api/auth/verify", Some(&token)).await?;
    assert_eq!(body["user"]["isNew"], false);
    Ok(())
}
