//! # Menu API Handlers
//!
//! Restaurants post one or more menus per day; employees browse today's menus
//! before voting.

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::types::{FieldErrors, PaginatedResponse, redacted_payload};
use crate::auth::Actor;
use crate::error::{ApiError, RepositoryError, validation_error};
use crate::models::menu::Model as MenuModel;
use crate::policy::{Action, Resource, permit_collection_action, permit_instance_action};
use crate::repositories::{
    MenuChanges, MenuFilter, MenuRepository, NewMenu, PageRequest, RestaurantRepository,
};
use crate::server::AppState;

/// Query parameters for listing menus
#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MenuListQuery {
    /// 1-based page number
    pub page: Option<u64>,
    /// Only menus of this restaurant
    pub restaurant: Option<i32>,
    /// Only menus posted on this date (YYYY-MM-DD)
    pub date_posted: Option<NaiveDate>,
    /// Older menus are excluded by default, use "true" to include them.
    pub include_previous: Option<bool>,
}

impl MenuListQuery {
    fn filter(&self) -> MenuFilter {
        MenuFilter {
            restaurant: self.restaurant,
            date_posted: self.date_posted,
            include_previous: self.include_previous.unwrap_or(false),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMenuRequest {
    /// Restaurant id
    pub restaurant: Option<i32>,
    #[schema(example = "Dish 1")]
    pub title: Option<String>,
    #[schema(example = "Dish 1 ingredients.")]
    pub description: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMenuRequest {
    pub restaurant: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MenuResponse {
    pub id: i32,
    pub restaurant: i32,
    pub title: String,
    pub description: String,
    pub date_posted: NaiveDate,
}

impl From<MenuModel> for MenuResponse {
    fn from(menu: MenuModel) -> Self {
        Self {
            id: menu.id,
            restaurant: menu.restaurant_id,
            title: menu.title,
            description: menu.description,
            date_posted: menu.date_posted,
        }
    }
}

fn check_menu_fields(
    title: Option<&str>,
    description: Option<&str>,
    creating: bool,
) -> Result<(), ApiError> {
    let mut errors = FieldErrors::new();
    if creating || title.is_some() {
        errors.required("title", title);
    }
    errors.max_length("title", title, 250);
    errors.max_length("description", description, 500);
    errors.into_result()
}

/// Username of the account owning the restaurant; a missing restaurant is a client error.
async fn restaurant_owner<C: ConnectionTrait>(
    db: &C,
    restaurant_id: i32,
) -> Result<String, ApiError> {
    match RestaurantRepository::new(db).get(restaurant_id).await {
        Ok(record) => Ok(record.account.username),
        Err(RepositoryError::NotFound(_)) => Err(validation_error(
            &format!("Invalid pk \"{restaurant_id}\" - object does not exist."),
            serde_json::json!({
                "restaurant": [format!("Invalid pk \"{restaurant_id}\" - object does not exist.")]
            }),
        )),
        Err(other) => Err(other.into()),
    }
}

#[utoipa::path(
    get,
    path = "/api/menu/",
    security(("bearer_auth" = [])),
    params(MenuListQuery),
    responses(
        (status = 200, description = "Menus ordered by date then restaurant", body = PaginatedResponse<MenuResponse>),
        (status = 400, description = "Invalid filter", body = ApiError),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Employees and admins only", body = ApiError)
    ),
    tag = "menus"
)]
pub async fn list_menus(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<MenuListQuery>,
) -> Result<Json<PaginatedResponse<MenuResponse>>, ApiError> {
    tracing::info!(actor = actor.label(), query = ?params, "GET menu-list");
    permit_collection_action(&actor, Resource::Menu, Action::List)?;

    let page = MenuRepository::new(&state.db)
        .list(
            &params.filter(),
            state.today(),
            PageRequest::new(params.page.unwrap_or(1), state.config.page_size),
        )
        .await?;

    Ok(Json(page.map(MenuResponse::from).into()))
}

/// Post a menu for today
#[utoipa::path(
    post,
    path = "/api/menu/",
    security(("bearer_auth" = [])),
    request_body = CreateMenuRequest,
    responses(
        (status = 201, description = "Menu created", body = MenuResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Restaurant owners and admins only", body = ApiError)
    ),
    tag = "menus"
)]
pub async fn create_menu(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CreateMenuRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MenuResponse>), ApiError> {
    let Json(request) = payload?;
    tracing::info!(
        actor = actor.label(),
        payload = %redacted_payload(&request),
        "POST menu-list"
    );
    permit_collection_action(&actor, Resource::Menu, Action::Create)?;

    let Some(restaurant_id) = request.restaurant else {
        return Err(validation_error(
            "restaurant: This field is required.",
            serde_json::json!({ "restaurant": ["This field is required."] }),
        ));
    };
    check_menu_fields(request.title.as_deref(), request.description.as_deref(), true)?;

    let owner = restaurant_owner(&state.db, restaurant_id).await?;
    permit_instance_action(&actor, Resource::Menu, Action::Create, &owner)?;

    let menu = MenuRepository::new(&state.db)
        .create(NewMenu {
            restaurant_id,
            title: request.title.unwrap_or_default(),
            description: request.description.unwrap_or_default(),
            date_posted: state.today(),
        })
        .await?;

    tracing::info!(menu_id = menu.id, restaurant_id, "Menu posted");
    Ok((StatusCode::CREATED, Json(menu.into())))
}

#[utoipa::path(
    get,
    path = "/api/menu/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Menu id")),
    responses(
        (status = 200, description = "Menu", body = MenuResponse),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 404, description = "Menu not found", body = ApiError)
    ),
    tag = "menus"
)]
pub async fn get_menu(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i32>,
) -> Result<Json<MenuResponse>, ApiError> {
    tracing::info!(actor = actor.label(), menu_id = id, "GET menu-detail");
    permit_collection_action(&actor, Resource::Menu, Action::Retrieve)?;

    let menu = MenuRepository::new(&state.db).get(id).await?;
    let owner = restaurant_owner(&state.db, menu.restaurant_id).await?;
    permit_instance_action(&actor, Resource::Menu, Action::Retrieve, &owner)?;

    Ok(Json(menu.into()))
}

/// Edit a menu (admin only)
#[utoipa::path(
    patch,
    path = "/api/menu/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Menu id")),
    request_body = UpdateMenuRequest,
    responses(
        (status = 200, description = "Updated menu", body = MenuResponse),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Admin only", body = ApiError),
        (status = 404, description = "Menu not found", body = ApiError)
    ),
    tag = "menus"
)]
pub async fn update_menu(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i32>,
    payload: Result<Json<UpdateMenuRequest>, JsonRejection>,
) -> Result<Json<MenuResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::info!(
        actor = actor.label(),
        menu_id = id,
        payload = %redacted_payload(&request),
        "PATCH menu-detail"
    );
    permit_collection_action(&actor, Resource::Menu, Action::Update)?;

    let repo = MenuRepository::new(&state.db);
    let menu = repo.get(id).await?;
    let owner = restaurant_owner(&state.db, menu.restaurant_id).await?;
    permit_instance_action(&actor, Resource::Menu, Action::Update, &owner)?;

    check_menu_fields(request.title.as_deref(), request.description.as_deref(), false)?;
    if let Some(restaurant_id) = request.restaurant {
        restaurant_owner(&state.db, restaurant_id).await?;
    }

    let updated = repo
        .update(
            menu,
            MenuChanges {
                restaurant_id: request.restaurant,
                title: request.title,
                description: request.description,
            },
        )
        .await?;
    Ok(Json(updated.into()))
}

/// Delete a menu (admin only)
#[utoipa::path(
    delete,
    path = "/api/menu/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Menu id")),
    responses(
        (status = 204, description = "Menu deleted"),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Admin only", body = ApiError),
        (status = 404, description = "Menu not found", body = ApiError)
    ),
    tag = "menus"
)]
pub async fn delete_menu(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    tracing::info!(actor = actor.label(), menu_id = id, "DELETE menu-detail");
    permit_collection_action(&actor, Resource::Menu, Action::Delete)?;

    let repo = MenuRepository::new(&state.db);
    let menu = repo.get(id).await?;
    let owner = restaurant_owner(&state.db, menu.restaurant_id).await?;
    permit_instance_action(&actor, Resource::Menu, Action::Delete, &owner)?;
    repo.delete(menu.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
