//! # Voting Rules
//!
//! Validation and persistence of daily lunch votes, and the winner view built
//! from the same tallies.
//!
//! A vote is checked and inserted inside one transaction. The checks run in a
//! fixed order and the first failure is reported:
//!
//! 1. restaurant, menu and employee exist
//! 2. the employee belongs to the acting account
//! 3. the restaurant is not the sole winner of every recent voting day, looking
//!    back up to `max_consecutive_wins + 1` days
//! 4. the menu belongs to the restaurant
//! 5. the menu was posted today
//! 6. the employee has not voted today

use std::collections::BTreeSet;

use axum::http::StatusCode;
use chrono::NaiveDate;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, DbErr, IsolationLevel,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::Principal;
use crate::error::{
    ApiError, RepositoryError, forbidden, is_serialization_failure, is_unique_violation,
    not_found, validation_failed,
};
use crate::models::vote::Model as VoteModel;
use crate::repositories::{
    EmployeeRepository, MenuRepository, NewVote, RestaurantRepository, RestaurantTally,
    VoteRepository,
};

/// Ballot submitted by an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
pub struct VoteRequest {
    #[serde(rename = "restaurant")]
    pub restaurant_id: i32,
    #[serde(rename = "menu")]
    pub menu_id: i32,
    #[serde(rename = "employee")]
    pub employee_id: i32,
}

/// Inputs that do not come from the ballot itself.
#[derive(Debug, Clone, Copy)]
pub struct VotingRules {
    pub today: NaiveDate,
    pub max_consecutive_wins: u32,
}

#[derive(Debug, Error)]
pub enum VoteRejection {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    #[error("You do not have permission to perform this action.")]
    NotOwner,
    #[error("Restaurant {name} is consecutive winner for {times} times and can not be voted.")]
    ConsecutiveWinner { name: String, times: u32 },
    #[error("Restaurant {name} is not having menu voted")]
    MenuMismatch { name: String },
    #[error("Only todays menu can be voted. Menu {title} was posted on {date_posted}")]
    StaleMenu {
        title: String,
        date_posted: NaiveDate,
    },
    #[error("You have already voted for today.")]
    AlreadyVoted,
    #[error("Another vote was being recorded at the same time, please retry.")]
    Contended,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<DbErr> for VoteRejection {
    fn from(error: DbErr) -> Self {
        if is_serialization_failure(&error) {
            return VoteRejection::Contended;
        }
        VoteRejection::Repository(RepositoryError::database_error(error))
    }
}

impl From<VoteRejection> for ApiError {
    fn from(rejection: VoteRejection) -> Self {
        match rejection {
            VoteRejection::NotFound { .. } => not_found(&rejection.to_string()),
            VoteRejection::NotOwner => forbidden(Some(&rejection.to_string())),
            VoteRejection::ConsecutiveWinner { .. }
            | VoteRejection::MenuMismatch { .. }
            | VoteRejection::StaleMenu { .. }
            | VoteRejection::AlreadyVoted => validation_failed(&rejection.to_string()),
            VoteRejection::Contended => {
                ApiError::new(StatusCode::CONFLICT, "CONFLICT", &rejection.to_string())
                    .with_retry_after(1)
            }
            VoteRejection::Repository(error) => error.into(),
        }
    }
}

/// Restaurants holding the highest count in `tally`. Several on a tie, none when empty.
pub fn winners_of(tally: &[RestaurantTally]) -> Vec<&RestaurantTally> {
    let Some(top) = tally.iter().map(|entry| entry.total_votes).max() else {
        return Vec::new();
    };
    tally
        .iter()
        .filter(|entry| entry.total_votes == top)
        .collect()
}

/// Returns the restaurant that alone won every inspected day.
///
/// `daily_winners` holds the winners of the most recent past voting days, up
/// to one more day than the allowed winning streak. A restriction applies when
/// more than one day was inspected and all of them were won by the same single
/// restaurant. A tie on any day lifts it.
pub fn consecutive_winner(daily_winners: &[Vec<i32>]) -> Option<i32> {
    if daily_winners.len() < 2 {
        return None;
    }

    let union: BTreeSet<i32> = daily_winners.iter().flatten().copied().collect();
    let mut winners = union.into_iter();
    match (winners.next(), winners.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

async fn begin_vote_transaction(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    match db.get_database_backend() {
        DbBackend::Postgres => {
            db.begin_with_config(Some(IsolationLevel::Serializable), None)
                .await
        }
        _ => db.begin().await,
    }
}

/// Validates and records a vote for `voter`.
pub async fn cast_vote(
    db: &DatabaseConnection,
    rules: VotingRules,
    request: VoteRequest,
    voter: &Principal,
) -> Result<VoteModel, VoteRejection> {
    let txn = begin_vote_transaction(db).await?;
    let vote = validate_and_record(&txn, rules, request, voter).await?;
    txn.commit().await?;

    tracing::info!(
        vote_id = vote.id,
        employee_id = vote.employee_id,
        restaurant_id = vote.restaurant_id,
        date_voted = %vote.date_voted,
        "Vote recorded"
    );
    Ok(vote)
}

async fn validate_and_record<C: ConnectionTrait>(
    db: &C,
    rules: VotingRules,
    request: VoteRequest,
    voter: &Principal,
) -> Result<VoteModel, VoteRejection> {
    let restaurant = RestaurantRepository::new(db)
        .find_profile(request.restaurant_id)
        .await?
        .ok_or(VoteRejection::NotFound {
            entity: "Restaurant",
            id: request.restaurant_id,
        })?;
    let menu = MenuRepository::new(db)
        .find(request.menu_id)
        .await?
        .ok_or(VoteRejection::NotFound {
            entity: "Menu",
            id: request.menu_id,
        })?;
    let employee = EmployeeRepository::new(db)
        .find(request.employee_id)
        .await?
        .ok_or(VoteRejection::NotFound {
            entity: "Employee",
            id: request.employee_id,
        })?;

    if employee.account.username != voter.username {
        return Err(VoteRejection::NotOwner);
    }

    let votes = VoteRepository::new(db);

    let past_days = votes
        .distinct_vote_dates_before(rules.today, u64::from(rules.max_consecutive_wins) + 1)
        .await?;
    let mut daily_winners = Vec::with_capacity(past_days.len());
    for day in past_days {
        let tally = votes.tally_for_date(day, None).await?;
        daily_winners.push(
            winners_of(&tally)
                .into_iter()
                .map(|entry| entry.restaurant_id)
                .collect::<Vec<_>>(),
        );
    }
    if consecutive_winner(&daily_winners) == Some(restaurant.id) {
        return Err(VoteRejection::ConsecutiveWinner {
            name: restaurant.restaurant_name,
            times: rules.max_consecutive_wins,
        });
    }

    if menu.restaurant_id != restaurant.id {
        return Err(VoteRejection::MenuMismatch {
            name: restaurant.restaurant_name,
        });
    }

    if menu.date_posted != rules.today {
        return Err(VoteRejection::StaleMenu {
            title: menu.title,
            date_posted: menu.date_posted,
        });
    }

    if votes.has_voted_on(employee.profile.id, rules.today).await? {
        return Err(VoteRejection::AlreadyVoted);
    }

    let inserted = votes
        .create(NewVote {
            restaurant_id: restaurant.id,
            menu_id: menu.id,
            employee_id: employee.profile.id,
            date_voted: rules.today,
        })
        .await;

    duplicate_as_already_voted(inserted)
}

/// A vote that slipped past the `has_voted_on` check still hits the unique
/// `(employee_id, date_voted)` index.
fn duplicate_as_already_voted(
    inserted: Result<VoteModel, RepositoryError>,
) -> Result<VoteModel, VoteRejection> {
    match inserted {
        Ok(vote) => Ok(vote),
        Err(RepositoryError::Database(error)) if is_unique_violation(&error) => {
            Err(VoteRejection::AlreadyVoted)
        }
        Err(RepositoryError::Database(error)) => Err(error.into()),
        Err(other) => Err(other.into()),
    }
}

/// One of the day's leading restaurants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Winner {
    pub restaurant_id: i32,
    pub restaurant_name: String,
    /// Always null. Kept so winner entries have the same shape as votes.
    pub employee_id: Option<i32>,
    pub total_votes: i64,
}

impl From<&RestaurantTally> for Winner {
    fn from(entry: &RestaurantTally) -> Self {
        Self {
            restaurant_id: entry.restaurant_id,
            restaurant_name: entry.restaurant_name.clone(),
            employee_id: None,
            total_votes: entry.total_votes,
        }
    }
}

/// Restaurants tied for the most votes on `date`.
pub async fn winners_on<C: ConnectionTrait>(
    db: &C,
    date: NaiveDate,
) -> Result<Vec<Winner>, RepositoryError> {
    let tally = VoteRepository::new(db).tally_for_date(date, None).await?;
    Ok(winners_of(&tally).into_iter().map(Winner::from).collect())
}
