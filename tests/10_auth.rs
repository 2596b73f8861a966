mod common;

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn health_and_banner() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app.get("/health", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");

    let (status, body) = app.get("/", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to OfficeScapes API");
    Ok(())
}

#[tokio::test]
async fn register_issues_tokens_for_a_new_user() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app.register("Ena.Shinonome@Nightcord.jp", "graduate").await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User registered successfully");
    assert!(body["accessToken"].as_str().is_some());
    assert!(body["refreshToken"].as_str().is_some());
    assert_eq!(body["user"]["email"], "ena.shinonome@nightcord.jp");
    assert_eq!(body["user"]["userType"], "graduate");
    assert_eq!(body["user"]["isNew"], true);
    assert_eq!(body["user"]["organizationId"], 0);

    // The profile was created alongside the account
    let user_id = body["user"]["userId"].as_i64().unwrap();
    let (status, profile) = app.get(&format!("/api/profiles/user/{}", user_id), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["firstName"], "Shinonome");
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts_regardless_of_case() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, _) = app.register("kanade@nightcord.jp", "graduate").await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.register("Kanade@Nightcord.jp", "organization").await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Email already in use");
    Ok(())
}

#[tokio::test]
async fn register_rejects_bad_input() -> Result<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app
        .post(
            "/api/auth/register",
            None,
            json!({"email": "mafuyu@nightcord.jp", "password": "abc", "firstName": "Asahina", "lastName": "Mafuyu"}),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Password must be at least 6 characters long");

    let (status, body) = app.register("not-an-email", "graduate").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email format. Please enter a valid email address.");

    let (status, body) = app.register("admin@nightcord.jp", "admin").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User type must be graduate or organization");
    Ok(())
}

#[tokio::test]
async fn login_checks_credentials() -> Result<()> {
    let app = TestApp::seeded().await?;

    let (status, body) = app
        .post("/api/auth/login", None, json!({"email": common::ICHIKA, "password": "wrong-password"}))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = app
        .post("/api/auth/login", None, json!({"email": "nobody@leo.co.jp", "password": "password123"}))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");

    let (status, body) = app.post("/api/auth/login", None, json!({"email": common::ICHIKA})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email and password are required");

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({"email": "Hoshino.Ichika@LEO.co.jp", "password": common::SEED_PASSWORD}),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["user"]["userId"], 3);
    assert_eq!(body["user"]["organizationId"], 3);
    assert_eq!(body["user"]["isNew"], false);
    Ok(())
}

#[tokio::test]
async fn verify_distinguishes_missing_malformed_and_expired_tokens() -> Result<()> {
    let app = TestApp::seeded().await?;

    let (status, body) = app.get("/api/auth/verify", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Access denied. No token provided.");

    let (status, body) = app.get("/api/auth/verify", Some("not.a.jwt")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("expired").is_none());

    let now = Utc::now().timestamp();
    let claims = json!({
        "userId": 3,
        "email": common::ICHIKA,
        "userType": "student",
        "organizationId": 3,
        "isNew": false,
        "jti": "stale-session",
        "iat": now - 7200,
        "exp": now - 3600
    });
    let expired = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app.state.config.security.access_token_secret.as_bytes()),
    )?;
    let (status, body) = app.get("/api/auth/verify", Some(&expired)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["expired"], true);

    let token = app.login_seeded(common::ICHIKA).await?;
    let (status, body) = app.get("/api/auth/verify", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], common::ICHIKA);
    Ok(())
}

#[tokio::test]
async fn refresh_tokens_are_not_access_tokens() -> Result<()> {
    let app = TestApp::seeded().await?;

    let (_, login) = app
        .post("/api/auth/login", None, json!({"email": common::ICHIKA, "password": common::SEED_PASSWORD}))
        .await?;
    let access = login["accessToken"].as_str().unwrap().to_string();
    let refresh = login["refreshToken"].as_str().unwrap().to_string();

    // Each kind only verifies against its own secret
    let (status, _) = app.get("/api/auth/verify", Some(&refresh)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = app.post("/api/auth/refresh-token", None, json!({"refreshToken": access})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid refresh token");

    let (status, body) = app.post("/api/auth/refresh-token", None, json!({"refreshToken": refresh})).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let renewed = body["accessToken"].as_str().unwrap();
    let (status, _) = app.get("/api/auth/verify", Some(renewed)).await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.post("/api/auth/refresh-token", None, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Refresh token is required");
    Ok(())
}

#[tokio::test]
async fn logout_revokes_both_tokens() -> Result<()> {
    let app = TestApp::seeded().await?;

    let (_, login) = app
        .post("/api/auth/login", None, json!({"email": common::HONAMI, "password": common::SEED_PASSWORD}))
        .await?;
    let access = login["accessToken"].as_str().unwrap().to_string();
    let refresh = login["refreshToken"].as_str().unwrap().to_string();

    let (status, body) = app
        .post("/api/auth/logout", Some(&access), json!({"refreshToken": refresh}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");

    let (status, _) = app.get("/api/auth/verify", Some(&access)).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.post("/api/auth/refresh-token", None, json!({"refreshToken": refresh})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
