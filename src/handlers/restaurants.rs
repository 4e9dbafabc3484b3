//! # Restaurant API Handlers

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::types::{FieldErrors, PageQuery, PaginatedResponse, redacted_payload};
use crate::auth::{Actor, hash_password};
use crate::error::ApiError;
use crate::models::Role;
use crate::policy::{Action, Resource, permit_collection_action, permit_instance_action};
use crate::repositories::{NewAccount, NewRestaurant, RestaurantRecord, RestaurantRepository};
use crate::server::AppState;

/// Account fields nested under `user` in restaurant payloads
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct RestaurantAccountInput {
    pub username: Option<String>,
    pub email: Option<String>,
    /// Write-only
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRestaurantRequest {
    #[schema(example = "Green Bowl")]
    pub restaurant_name: Option<String>,
    pub user: Option<RestaurantAccountInput>,
}

/// Only the restaurant name can be changed; account fields are ignored.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateRestaurantRequest {
    pub restaurant_name: Option<String>,
    pub user: Option<RestaurantAccountInput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RestaurantResponse {
    pub pk: i32,
    pub restaurant_name: String,
    pub username: String,
    pub email: String,
}

impl From<RestaurantRecord> for RestaurantResponse {
    fn from(record: RestaurantRecord) -> Self {
        let RestaurantRecord { profile, account } = record;
        Self {
            pk: profile.id,
            restaurant_name: profile.restaurant_name,
            username: account.username,
            email: account.email,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/restaurant/",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Restaurants ordered by name", body = PaginatedResponse<RestaurantResponse>),
        (status = 401, description = "Authentication required", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn list_restaurants(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<PageQuery>,
) -> Result<Json<PaginatedResponse<RestaurantResponse>>, ApiError> {
    tracing::info!(actor = actor.label(), query = ?params, "GET restaurant-list");
    permit_collection_action(&actor, Resource::Restaurant, Action::List)?;

    let page = RestaurantRepository::new(&state.db)
        .list(params.request(state.config.page_size))
        .await?;

    Ok(Json(page.map(RestaurantResponse::from).into()))
}

/// Register a restaurant together with its owner account
#[utoipa::path(
    post,
    path = "/api/restaurant/",
    request_body = CreateRestaurantRequest,
    responses(
        (status = 201, description = "Restaurant created", body = RestaurantResponse),
        (status = 400, description = "Validation failed", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn create_restaurant(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CreateRestaurantRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RestaurantResponse>), ApiError> {
    let Json(request) = payload?;
    tracing::info!(
        actor = actor.label(),
        payload = %redacted_payload(&request),
        "POST restaurant-list"
    );
    permit_collection_action(&actor, Resource::Restaurant, Action::Create)?;

    let mut errors = FieldErrors::new();
    errors.required("restaurant_name", request.restaurant_name.as_deref());
    errors.max_length("restaurant_name", request.restaurant_name.as_deref(), 150);
    match &request.user {
        Some(user) => {
            errors.username(user.username.as_deref());
            errors.email(user.email.as_deref());
            errors.required("password", user.password.as_deref());
        }
        None => errors.add("user", "This field is required."),
    }
    errors.into_result()?;

    let user = request.user.unwrap_or_default();
    let password_hash = hash_password(user.password.as_deref().unwrap_or_default())?;
    let new_restaurant = NewRestaurant {
        account: NewAccount {
            username: user.username.unwrap_or_default(),
            email: user.email.unwrap_or_default(),
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            role: Role::RestaurantOwner,
            is_admin: false,
        },
        restaurant_name: request.restaurant_name.unwrap_or_default(),
    };

    let txn = state.db.begin().await?;
    let record = RestaurantRepository::new(&txn).create(new_restaurant).await?;
    txn.commit().await?;

    tracing::info!(restaurant_id = record.profile.id, username = %record.account.username, "Restaurant registered");
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    get,
    path = "/api/restaurant/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Restaurant id")),
    responses(
        (status = 200, description = "Restaurant", body = RestaurantResponse),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn get_restaurant(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i32>,
) -> Result<Json<RestaurantResponse>, ApiError> {
    tracing::info!(actor = actor.label(), restaurant_id = id, "GET restaurant-detail");
    permit_collection_action(&actor, Resource::Restaurant, Action::Retrieve)?;

    let record = RestaurantRepository::new(&state.db).get(id).await?;
    permit_instance_action(
        &actor,
        Resource::Restaurant,
        Action::Retrieve,
        &record.account.username,
    )?;

    Ok(Json(record.into()))
}

#[utoipa::path(
    patch,
    path = "/api/restaurant/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Restaurant id")),
    request_body = UpdateRestaurantRequest,
    responses(
        (status = 200, description = "Updated restaurant", body = RestaurantResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Not the owner", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn update_restaurant(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateRestaurantRequest>, JsonRejection>,
) -> Result<Json<RestaurantResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::info!(
        actor = actor.label(),
        restaurant_id = id,
        payload = %redacted_payload(&request),
        "PATCH restaurant-detail"
    );
    permit_collection_action(&actor, Resource::Restaurant, Action::Update)?;

    let repo = RestaurantRepository::new(&state.db);
    let record = repo.get(id).await?;
    permit_instance_action(
        &actor,
        Resource::Restaurant,
        Action::Update,
        &record.account.username,
    )?;

    let Some(restaurant_name) = request.restaurant_name else {
        return Ok(Json(record.into()));
    };

    let mut errors = FieldErrors::new();
    errors.required("restaurant_name", Some(&restaurant_name));
    errors.max_length("restaurant_name", Some(&restaurant_name), 150);
    errors.into_result()?;

    let updated = repo.rename(record, restaurant_name).await?;
    Ok(Json(updated.into()))
}

/// Delete a restaurant, its owner account, menus and votes
#[utoipa::path(
    delete,
    path = "/api/restaurant/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Restaurant id")),
    responses(
        (status = 204, description = "Restaurant deleted"),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Not the owner", body = ApiError),
        (status = 404, description = "Restaurant not found", body = ApiError)
    ),
    tag = "restaurants"
)]
pub async fn delete_restaurant(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    tracing::info!(actor = actor.label(), restaurant_id = id, "DELETE restaurant-detail");
    permit_collection_action(&actor, Resource::Restaurant, Action::Delete)?;

    let repo = RestaurantRepository::new(&state.db);
    let record = repo.get(id).await?;
    permit_instance_action(
        &actor,
        Resource::Restaurant,
        Action::Delete,
        &record.account.username,
    )?;
    repo.delete(&record).await?;

    Ok(StatusCode::NO_CONTENT)
}
