//! Integration tests for restaurant accounts and their daily menus

use axum::http::StatusCode;
use serde_json::json;

#[path = "test_utils/mod.rs"]
mod test_utils;

use test_utils::{day, spawn_app, test_config};

#[tokio::test]
async fn anonymous_user_registers_a_restaurant() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;

    let (status, body) = app
        .post(
            "/api/restaurant/",
            None,
            json!({
                "restaurant_name": "Green Bowl",
                "user": {"username": "green", "email": "green@food.example", "password": "s3cret-pass"}
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["restaurant_name"], "Green Bowl");
    assert_eq!(body["username"], "green");
    assert_eq!(body["email"], "green@food.example");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn restaurant_registration_requires_name_and_account() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;

    let (status, body) = app.post("/api/restaurant/", None, json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["restaurant_name"][0], "This field is required.");
    assert_eq!(body["details"]["user"][0], "This field is required.");
}

#[tokio::test]
async fn any_authenticated_actor_lists_restaurants_by_name() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    app.create_restaurant("pasta", "Pasta Place").await;
    app.create_restaurant("green", "Green Bowl").await;
    app.create_employee("emp1", false).await;

    let (status, _) = app.get("/api/restaurant/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for username in ["emp1", "pasta"] {
        let (status, body) = app
            .get("/api/restaurant/", Some(&app.token_for(username)))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["results"][0]["restaurant_name"], "Green Bowl");
        assert_eq!(body["results"][1]["restaurant_name"], "Pasta Place");
    }
}

#[tokio::test]
async fn employee_can_view_a_restaurant() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let green = app.create_restaurant("green", "Green Bowl").await;
    app.create_employee("emp1", false).await;

    let (status, body) = app
        .get(
            &format!("/api/restaurant/{}/", green.profile.id),
            Some(&app.token_for("emp1")),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pk"], green.profile.id);
}

#[tokio::test]
async fn only_the_owner_renames_a_restaurant() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let green = app.create_restaurant("green", "Green Bowl").await;
    app.create_restaurant("pasta", "Pasta Place").await;
    app.create_employee("emp1", false).await;
    let uri = format!("/api/restaurant/{}/", green.profile.id);
    let rename = json!({"restaurant_name": "Green Garden"});

    let (status, _) = app
        .patch(&uri, Some(&app.token_for("pasta")), rename.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .patch(&uri, Some(&app.token_for("emp1")), rename.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.patch(&uri, Some(&app.token_for("green")), rename).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["restaurant_name"], "Green Garden");
    assert_eq!(body["username"], "green");
}

#[tokio::test]
async fn deleting_a_restaurant_removes_its_menus() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let green = app.create_restaurant("green", "Green Bowl").await;
    let menu = app.create_menu(green.profile.id, "Salad", day(2024, 3, 10)).await;
    app.create_employee("boss", true).await;

    let (status, _) = app
        .delete(
            &format!("/api/restaurant/{}/", green.profile.id),
            Some(&app.token_for("green")),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .get(
            &format!("/api/menu/{}/", menu.id),
            Some(&app.token_for("boss")),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_posts_todays_menu() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let green = app.create_restaurant("green", "Green Bowl").await;

    let (status, body) = app
        .post(
            "/api/menu/",
            Some(&app.token_for("green")),
            json!({"restaurant": green.profile.id, "title": "Dish 1", "description": "Dish 1 ingredients."}),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["restaurant"], green.profile.id);
    assert_eq!(body["title"], "Dish 1");
    assert_eq!(body["date_posted"], "2024-03-10");
}

#[tokio::test]
async fn menu_posting_is_restricted_to_the_owning_restaurant() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let green = app.create_restaurant("green", "Green Bowl").await;
    app.create_restaurant("pasta", "Pasta Place").await;
    app.create_employee("emp1", false).await;
    app.create_employee("boss", true).await;
    let menu = json!({"restaurant": green.profile.id, "title": "Dish 1"});

    let (status, _) = app
        .post("/api/menu/", Some(&app.token_for("pasta")), menu.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .post("/api/menu/", Some(&app.token_for("emp1")), menu.clone())
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.post("/api/menu/", Some(&app.token_for("boss")), menu).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn menu_posting_validates_the_restaurant_reference() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    app.create_restaurant("green", "Green Bowl").await;
    let token = app.token_for("green");

    let (status, body) = app
        .post("/api/menu/", Some(&token), json!({"title": "Dish 1"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "restaurant: This field is required.");

    let (status, body) = app
        .post(
            "/api/menu/",
            Some(&token),
            json!({"restaurant": 999, "title": "Dish 1"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["details"]["restaurant"][0],
        "Invalid pk \"999\" - object does not exist."
    );
}

#[tokio::test]
async fn menu_list_defaults_to_todays_menus() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let green = app.create_restaurant("green", "Green Bowl").await;
    let pasta = app.create_restaurant("pasta", "Pasta Place").await;
    app.create_menu(green.profile.id, "Old Salad", day(2024, 3, 9)).await;
    app.create_menu(green.profile.id, "Salad", day(2024, 3, 10)).await;
    app.create_menu(pasta.profile.id, "Carbonara", day(2024, 3, 10)).await;
    app.create_employee("emp1", false).await;
    let token = app.token_for("emp1");

    let (status, body) = app.get("/api/menu/", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (_, body) = app
        .get("/api/menu/?include_previous=true", Some(&token))
        .await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["results"][0]["title"], "Old Salad");

    let (_, body) = app
        .get(
            &format!("/api/menu/?restaurant={}", pasta.profile.id),
            Some(&token),
        )
        .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["title"], "Carbonara");

    let (_, body) = app
        .get(
            "/api/menu/?include_previous=true&date_posted=2024-03-09",
            Some(&token),
        )
        .await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["title"], "Old Salad");
}

#[tokio::test]
async fn restaurant_owner_cannot_list_menus() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    app.create_restaurant("green", "Green Bowl").await;

    let (status, _) = app.get("/api/menu/", Some(&app.token_for("green"))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_admins_edit_or_delete_menus() {
    let app = spawn_app(test_config(), day(2024, 3, 10)).await;
    let green = app.create_restaurant("green", "Green Bowl").await;
    let menu = app.create_menu(green.profile.id, "Salad", day(2024, 3, 10)).await;
    app.create_employee("boss", true).await;
    let uri = format!("/api/menu/{}/", menu.id);

    let (status, body) = app.get(&uri, Some(&app.token_for("green"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Salad");

    let (status, _) = app
        .patch(&uri, Some(&app.token_for("green")), json!({"title": "Caesar"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.token_for("boss");
    let (status, body) = app.patch(&uri, Some(&admin), json!({"title": "Caesar"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Caesar");
    assert_eq!(body["description"], "Salad ingredients.");

    let (status, _) = app.delete(&uri, Some(&app.token_for("green"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
