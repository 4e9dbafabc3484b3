//! # Vote API Handlers

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::types::PaginatedResponse;
use crate::auth::Actor;
use crate::error::{ApiError, validation_error};
use crate::models::vote::Model as VoteModel;
use crate::policy::{
    Action, Denial, Resource, permit_collection_action, permit_instance_action,
};
use crate::repositories::{EmployeeRepository, PageRequest, VoteFilter, VoteRepository};
use crate::server::AppState;
use crate::voting::{self, VoteRequest, VotingRules};

/// Query parameters for listing votes
#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VoteListQuery {
    /// 1-based page number
    pub page: Option<u64>,
    pub restaurant: Option<i32>,
    /// Only votes cast on this date (YYYY-MM-DD)
    pub date_voted: Option<NaiveDate>,
    pub employee: Option<i32>,
    pub menu: Option<i32>,
    /// Older votes are excluded by default, use "true" to include them.
    pub include_previous: Option<bool>,
}

impl VoteListQuery {
    fn filter(&self) -> VoteFilter {
        VoteFilter {
            restaurant: self.restaurant,
            date_voted: self.date_voted,
            employee: self.employee,
            menu: self.menu,
            include_previous: self.include_previous.unwrap_or(false),
        }
    }
}

/// Ballot body; every field is required
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateVoteRequest {
    /// Restaurant id
    pub restaurant: Option<i32>,
    /// Menu id, must belong to the restaurant and be posted today
    pub menu: Option<i32>,
    /// Employee id of the voter
    pub employee: Option<i32>,
}

impl CreateVoteRequest {
    fn into_ballot(self) -> Result<VoteRequest, ApiError> {
        let mut missing = serde_json::Map::new();
        for (field, value) in [
            ("restaurant", self.restaurant),
            ("menu", self.menu),
            ("employee", self.employee),
        ] {
            if value.is_none() {
                missing.insert(
                    field.to_string(),
                    serde_json::json!(["This field is required."]),
                );
            }
        }

        match (self.restaurant, self.menu, self.employee) {
            (Some(restaurant_id), Some(menu_id), Some(employee_id)) => Ok(VoteRequest {
                restaurant_id,
                menu_id,
                employee_id,
            }),
            _ => {
                let first = missing.keys().next().cloned().unwrap_or_default();
                Err(validation_error(
                    &format!("{first}: This field is required."),
                    serde_json::Value::Object(missing),
                ))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VoteResponse {
    pub pk: i32,
    pub restaurant: i32,
    pub employee: i32,
    pub date_voted: NaiveDate,
    pub menu: i32,
}

impl From<VoteModel> for VoteResponse {
    fn from(vote: VoteModel) -> Self {
        Self {
            pk: vote.id,
            restaurant: vote.restaurant_id,
            employee: vote.employee_id,
            date_voted: vote.date_voted,
            menu: vote.menu_id,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/vote/",
    security(("bearer_auth" = [])),
    params(VoteListQuery),
    responses(
        (status = 200, description = "Votes, newest day first", body = PaginatedResponse<VoteResponse>),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Employees and admins only", body = ApiError)
    ),
    tag = "votes"
)]
pub async fn list_votes(
    State(state): State<AppState>,
    actor: Actor,
    Query(params): Query<VoteListQuery>,
) -> Result<Json<PaginatedResponse<VoteResponse>>, ApiError> {
    tracing::info!(actor = actor.label(), query = ?params, "GET vote-list");
    permit_collection_action(&actor, Resource::Vote, Action::List)?;

    let page = VoteRepository::new(&state.db)
        .list(
            &params.filter(),
            state.today(),
            PageRequest::new(params.page.unwrap_or(1), state.config.page_size),
        )
        .await?;

    Ok(Json(page.map(VoteResponse::from).into()))
}

/// Cast today's vote
#[utoipa::path(
    post,
    path = "/api/vote/",
    security(("bearer_auth" = [])),
    request_body = CreateVoteRequest,
    responses(
        (status = 201, description = "Vote recorded", body = VoteResponse),
        (status = 400, description = "Vote rejected by the voting rules", body = ApiError),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Voting for another employee", body = ApiError),
        (status = 404, description = "Restaurant, menu or employee not found", body = ApiError),
        (status = 409, description = "Concurrent vote, retry", body = ApiError)
    ),
    tag = "votes"
)]
pub async fn create_vote(
    State(state): State<AppState>,
    actor: Actor,
    payload: Result<Json<CreateVoteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VoteResponse>), ApiError> {
    let Json(request) = payload?;
    tracing::info!(actor = actor.label(), payload = ?request, "POST vote-list");
    permit_collection_action(&actor, Resource::Vote, Action::Create)?;

    let Some(voter) = actor.principal() else {
        return Err(Denial::Unauthenticated.into());
    };
    let ballot = request.into_ballot()?;
    let rules = VotingRules {
        today: state.today(),
        max_consecutive_wins: state.config.max_consecutive_wins,
    };

    let vote = voting::cast_vote(&state.db, rules, ballot, voter).await?;
    Ok((StatusCode::CREATED, Json(vote.into())))
}

#[utoipa::path(
    get,
    path = "/api/vote/{id}/",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Vote id")),
    responses(
        (status = 200, description = "Vote", body = VoteResponse),
        (status = 401, description = "Authentication required", body = ApiError),
        (status = 403, description = "Not your vote", body = ApiError),
        (status = 404, description = "Vote not found", body = ApiError)
    ),
    tag = "votes"
)]
pub async fn get_vote(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<i32>,
) -> Result<Json<VoteResponse>, ApiError> {
    tracing::info!(actor = actor.label(), vote_id = id, "GET vote-detail");
    permit_collection_action(&actor, Resource::Vote, Action::Retrieve)?;

    let vote = VoteRepository::new(&state.db).get(id).await?;
    let voter = EmployeeRepository::new(&state.db).get(vote.employee_id).await?;
    permit_instance_action(
        &actor,
        Resource::Vote,
        Action::Retrieve,
        &voter.account.username,
    )?;

    Ok(Json(vote.into()))
}
