//! Integration tests for token issuance and request authentication

use axum::http::StatusCode;
use lunchvote::auth::TokenService;
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{TEST_PASSWORD, TestApp, day, spawn_app, test_config};

async fn app_with_employee() -> TestApp {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    app.create_employee("emp1", false).await;
    app
}

#[tokio::test]
async fn login_issues_a_usable_token_pair() {
    let app = app_with_employee().await;

    let (status, body) = app
        .post(
            "/api/token/",
            None,
            json!({"username": "emp1", "password": TEST_PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().unwrap().to_string();
    assert!(body["refresh"].is_string());

    let (status, _) = app.get("/api/restaurant/", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app_with_employee().await;

    let (status, body) = app
        .post(
            "/api/token/",
            None,
            json!({"username": "emp1", "password": "not-the-password"}),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["message"],
        "No active account found with the given credentials"
    );

    let (status, _) = app
        .post(
            "/api/token/",
            None,
            json!({"username": "ghost", "password": TEST_PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = app_with_employee().await;

    let (status, body) = app
        .post("/api/token/", None, json!({"username": "emp1"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["password"][0], "This field is required.");
}

#[tokio::test]
async fn refresh_token_yields_a_new_access_token() {
    let app = app_with_employee().await;
    let pair = app.state.tokens.issue_pair("emp1").unwrap();

    let (status, body) = app
        .post("/api/token/refresh/", None, json!({"refresh": pair.refresh}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let access = body["access"].as_str().unwrap().to_string();

    let (status, _) = app.get("/api/vote/", Some(&access)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn token_types_are_not_interchangeable() {
    let app = app_with_employee().await;
    let pair = app.state.tokens.issue_pair("emp1").unwrap();

    let (status, _) = app
        .post("/api/token/refresh/", None, json!({"refresh": pair.access}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/vote/", Some(&pair.refresh)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verify_accepts_only_valid_tokens() {
    let app = app_with_employee().await;
    let pair = app.state.tokens.issue_pair("emp1").unwrap();

    for token in [&pair.access, &pair.refresh] {
        let (status, body) = app
            .post("/api/token/verify/", None, json!({"token": token}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    let (status, _) = app
        .post("/api/token/verify/", None, json!({"token": "abc.def.ghi"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let app = app_with_employee().await;
    let mut other = test_config();
    other.jwt_secret = Some("some-other-secret-of-sufficient-length".to_string());
    let forged = TokenService::from_config(&other).issue_access("emp1").unwrap();

    let (status, body) = app.get("/api/vote/", Some(&forged)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn token_of_a_deleted_account_is_rejected() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let token = app.token_for("ghost");

    let (status, _) = app.get("/api/restaurant/", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let refresh = app.state.tokens.issue_pair("ghost").unwrap().refresh;
    let (status, body) = app
        .post("/api/token/refresh/", None, json!({"refresh": refresh}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found");
}
