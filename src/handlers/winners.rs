//! # Winning Restaurant Handler

use axum::{
    extract::{RawQuery, State},
    response::Json,
};

use super::types::ResultsResponse;
use crate::auth::Actor;
use crate::error::ApiError;
use crate::policy::{Action, Resource, permit_collection_action};
use crate::server::AppState;
use crate::voting::{self, Winner};

/// Today's leading restaurant(s)
#[utoipa::path(
    get,
    path = "/api/winning_restaurant/",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Restaurants tied for the most votes today; empty without votes", body = ResultsResponse<Winner>),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Employees and admins only", body = ApiError)
    ),
    tag = "votes"
)]
pub async fn winning_restaurant(
    State(state): State<AppState>,
    actor: Actor,
    RawQuery(query): RawQuery,
) -> Result<Json<ResultsResponse<Winner>>, ApiError> {
    tracing::info!(
        actor = actor.label(),
        query = query.as_deref().unwrap_or(""),
        "GET winning-restaurant-list"
    );
    permit_collection_action(&actor, Resource::Winner, Action::List)?;

    let results = voting::winners_on(&state.db, state.today()).await?;
    Ok(Json(ResultsResponse { results }))
}
