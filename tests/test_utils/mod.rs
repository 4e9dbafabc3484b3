//! Test utilities for API testing.
//!
//! Sets up an in-memory SQLite database with migrations applied, a router
//! driven by a fixed clock, and fixtures for accounts, menus and votes.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::NaiveDate;
use lunchvote::{
    auth::hash_password,
    clock::FixedClock,
    config::AppConfig,
    models::{Role, menu::Model as MenuModel, vote::Model as VoteModel},
    repositories::{
        EmployeeRecord, EmployeeRepository, MenuRepository, NewAccount, NewEmployee, NewMenu,
        NewRestaurant, NewVote, RestaurantRecord, RestaurantRepository, VoteRepository,
    },
    server::{AppState, create_app},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "lunch-password-1";

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// A single pooled connection keeps every query on the same in-memory database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        jwt_secret: Some("integration-test-secret-0123456789abcdef".to_string()),
        max_consecutive_wins: 2,
        page_size: 10,
        ..Default::default()
    }
}

pub fn day(year: i32, month: u32, date: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, date).unwrap()
}

/// Argon2 is slow by design; fixtures share one hash of [`TEST_PASSWORD`].
fn test_password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).unwrap())
        .clone()
}

pub struct TestApp {
    pub app: Router,
    pub db: DatabaseConnection,
    pub clock: FixedClock,
    pub state: AppState,
}

/// Builds the full router over a fresh database, with "today" pinned to `today`.
pub async fn spawn_app(config: AppConfig, today: NaiveDate) -> TestApp {
    let db = setup_test_db().await.unwrap();
    let clock = FixedClock::new(today);
    let state = AppState::with_clock(config, db.clone(), Arc::new(clock.clone()));
    TestApp {
        app: create_app(state.clone()),
        db,
        clock,
        state,
    }
}

impl TestApp {
    pub fn token_for(&self, username: &str) -> String {
        self.state.tokens.issue_access(username).unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn create_employee(&self, username: &str, is_admin: bool) -> EmployeeRecord {
        EmployeeRepository::new(&self.db)
            .create(NewEmployee {
                account: NewAccount {
                    username: username.to_string(),
                    email: format!("{username}@corp.example"),
                    password_hash: test_password_hash(),
                    first_name: String::new(),
                    last_name: String::new(),
                    role: Role::Employee,
                    is_admin,
                },
                department: "Engineering".to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn create_restaurant(&self, username: &str, name: &str) -> RestaurantRecord {
        RestaurantRepository::new(&self.db)
            .create(NewRestaurant {
                account: NewAccount {
                    username: username.to_string(),
                    email: format!("{username}@food.example"),
                    password_hash: test_password_hash(),
                    first_name: String::new(),
                    last_name: String::new(),
                    role: Role::RestaurantOwner,
                    is_admin: false,
                },
                restaurant_name: name.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn create_menu(&self, restaurant_id: i32, title: &str, posted: NaiveDate) -> MenuModel {
        MenuRepository::new(&self.db)
            .create(NewMenu {
                restaurant_id,
                title: title.to_string(),
                description: format!("{title} ingredients."),
                date_posted: posted,
            })
            .await
            .unwrap()
    }

    /// Inserts a historical vote directly, bypassing the voting rules.
    pub async fn insert_vote(
        &self,
        employee_id: i32,
        restaurant_id: i32,
        menu_id: i32,
        date_voted: NaiveDate,
    ) -> VoteModel {
        VoteRepository::new(&self.db)
            .create(NewVote {
                restaurant_id,
                menu_id,
                employee_id,
                date_voted,
            })
            .await
            .unwrap()
    }
}
