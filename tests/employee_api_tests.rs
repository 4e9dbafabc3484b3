//! Integration tests for employee registration and profile management

use axum::http::StatusCode;
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{TEST_PASSWORD, day, spawn_app, test_config};

fn registration(username: &str) -> serde_json::Value {
    json!({
        "department": "Accounts",
        "user": {
            "username": username,
            "email": format!("{username}@corp.example"),
            "password": "s3cret-pass",
            "first_name": "Jane",
            "last_name": "Doe"
        }
    })
}

#[tokio::test]
async fn anonymous_user_registers_as_employee() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;

    let (status, body) = app.post("/api/employee/", None, registration("jdoe")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "jdoe");
    assert_eq!(body["email"], "jdoe@corp.example");
    assert_eq!(body["department"], "Accounts");
    assert_eq!(body["first_name"], "Jane");
    assert!(body["pk"].is_i64());
    assert!(body.get("password").is_none());

    let (status, tokens) = app
        .post(
            "/api/token/",
            None,
            json!({"username": "jdoe", "password": "s3cret-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(tokens["access"].is_string());
}

#[tokio::test]
async fn duplicate_username_and_email_are_rejected() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let (status, _) = app.post("/api/employee/", None, registration("jdoe")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post("/api/employee/", None, registration("jdoe")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "A user with that username already exists.");

    let mut same_email = registration("jdoe2");
    same_email["user"]["email"] = json!("jdoe@corp.example");
    let (status, body) = app.post("/api/employee/", None, same_email).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "This email is already used by another user.");
}

#[tokio::test]
async fn registration_fields_are_validated() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;

    let (status, body) = app
        .post(
            "/api/employee/",
            None,
            json!({"user": {"username": "bad name", "email": "nope"}}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert!(body["details"]["username"].is_array());
    assert_eq!(body["details"]["email"][0], "Enter a valid email address.");
    assert_eq!(body["details"]["password"][0], "This field is required.");
}

#[tokio::test]
async fn only_admins_list_employees() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    app.create_employee("emp1", false).await;
    app.create_employee("boss", true).await;

    let (status, _) = app.get("/api/employee/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/employee/", Some(&app.token_for("emp1"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get("/api/employee/", Some(&app.token_for("boss"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["username"], "boss");
    assert_eq!(body["results"][1]["username"], "emp1");
}

#[tokio::test]
async fn employee_list_is_paginated() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    app.create_employee("admin", true).await;
    for n in 0..11 {
        app.create_employee(&format!("emp{n:02}"), false).await;
    }
    let token = app.token_for("admin");

    let (status, body) = app.get("/api/employee/", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 12);
    assert_eq!(body["next"], 2);
    assert!(body["previous"].is_null());
    assert_eq!(body["results"].as_array().unwrap().len(), 10);

    let (status, body) = app.get("/api/employee/?page=2", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["next"].is_null());
    assert_eq!(body["previous"], 1);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    let (status, body) = app.get("/api/employee/?page=3", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Invalid page.");
}

#[tokio::test]
async fn employees_see_only_their_own_profile() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let me = app.create_employee("emp1", false).await;
    let other = app.create_employee("emp2", false).await;
    app.create_employee("boss", true).await;
    let token = app.token_for("emp1");

    let (status, body) = app
        .get(&format!("/api/employee/{}/", me.profile.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "emp1");

    let (status, _) = app
        .get(&format!("/api/employee/{}/", other.profile.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .get(
            &format!("/api/employee/{}/", other.profile.id),
            Some(&app.token_for("boss")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/employee/999/", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn restaurant_owner_cannot_read_employees() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let emp = app.create_employee("emp1", false).await;
    app.create_restaurant("green", "Green Bowl").await;

    let (status, _) = app
        .get(
            &format!("/api/employee/{}/", emp.profile.id),
            Some(&app.token_for("green")),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn partial_update_changes_profile_and_password_only() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let me = app.create_employee("emp1", false).await;
    let token = app.token_for("emp1");

    let (status, body) = app
        .patch(
            &format!("/api/employee/{}/", me.profile.id),
            Some(&token),
            json!({
                "department": "Finance",
                "user": {
                    "username": "renamed",
                    "email": "renamed@corp.example",
                    "first_name": "Janet",
                    "password": "brand-new-pass"
                }
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["department"], "Finance");
    assert_eq!(body["first_name"], "Janet");
    assert_eq!(body["username"], "emp1");
    assert_eq!(body["email"], "emp1@corp.example");

    let (status, _) = app
        .post(
            "/api/token/",
            None,
            json!({"username": "emp1", "password": TEST_PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post(
            "/api/token/",
            None,
            json!({"username": "emp1", "password": "brand-new-pass"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn only_admins_delete_employees() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let me = app.create_employee("emp1", false).await;
    app.create_employee("boss", true).await;
    let uri = format!("/api/employee/{}/", me.profile.id);

    let (status, _) = app.delete(&uri, Some(&app.token_for("emp1"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.token_for("boss");
    let (status, body) = app.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = app.get(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/token/",
            None,
            json!({"username": "emp1", "password": TEST_PASSWORD}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
