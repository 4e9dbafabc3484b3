//! # Vote Repository
//!
//! Vote storage plus the aggregate queries used by the voting rules and the
//! winner view.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::{PageRequest, PageSlice};
use crate::error::RepositoryError;
use crate::models::restaurant::Column as RestaurantColumn;
use crate::models::vote::{
    ActiveModel as VoteActiveModel, Column as VoteColumn, Entity as Vote, Model as VoteModel,
    Relation as VoteRelation,
};

/// List filters for votes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoteFilter {
    pub restaurant: Option<i32>,
    pub date_voted: Option<NaiveDate>,
    pub employee: Option<i32>,
    pub menu: Option<i32>,
    pub include_previous: bool,
}

impl VoteFilter {
    fn apply(&self, mut select: Select<Vote>, today: NaiveDate) -> Select<Vote> {
        if let Some(restaurant) = self.restaurant {
            select = select.filter(VoteColumn::RestaurantId.eq(restaurant));
        }
        if let Some(date_voted) = self.date_voted {
            select = select.filter(VoteColumn::DateVoted.eq(date_voted));
        }
        if let Some(employee) = self.employee {
            select = select.filter(VoteColumn::EmployeeId.eq(employee));
        }
        if let Some(menu) = self.menu {
            select = select.filter(VoteColumn::MenuId.eq(menu));
        }
        if !self.include_previous {
            select = select.filter(VoteColumn::DateVoted.eq(today));
        }
        select
    }
}

#[derive(Debug, Clone)]
pub struct NewVote {
    pub restaurant_id: i32,
    pub menu_id: i32,
    pub employee_id: i32,
    pub date_voted: NaiveDate,
}

/// Number of votes one restaurant received on one day.
#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult, Serialize, ToSchema)]
pub struct RestaurantTally {
    pub restaurant_id: i32,
    pub restaurant_name: String,
    pub total_votes: i64,
}

fn tally_select(date: NaiveDate) -> Select<Vote> {
    Vote::find()
        .select_only()
        .column(VoteColumn::RestaurantId)
        .column(RestaurantColumn::RestaurantName)
        .column_as(VoteColumn::Id.count(), "total_votes")
        .join(JoinType::InnerJoin, VoteRelation::Restaurant.def())
        .filter(VoteColumn::DateVoted.eq(date))
        .group_by(VoteColumn::RestaurantId)
        .group_by(RestaurantColumn::RestaurantName)
        .order_by_desc(VoteColumn::Id.count())
        .order_by_asc(VoteColumn::RestaurantId)
}

/// Repository for Vote database operations
pub struct VoteRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> VoteRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Inserts the vote. A second vote for the same employee and day is
    /// rejected by the unique index and surfaces as a database error.
    pub async fn create(&self, request: NewVote) -> Result<VoteModel, RepositoryError> {
        VoteActiveModel {
            restaurant_id: Set(request.restaurant_id),
            menu_id: Set(request.menu_id),
            employee_id: Set(request.employee_id),
            date_voted: Set(request.date_voted),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<VoteModel, RepositoryError> {
        Vote::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found(format!("Vote {id} not found")))
    }

    /// Votes ordered newest day first.
    pub async fn list(
        &self,
        filter: &VoteFilter,
        today: NaiveDate,
        page: PageRequest,
    ) -> Result<PageSlice<VoteModel>, RepositoryError> {
        let query = filter.apply(Vote::find(), today);

        let count = query
            .clone()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        page.ensure_in_range(count)?;

        let items = query
            .order_by_desc(VoteColumn::DateVoted)
            .order_by_asc(VoteColumn::Id)
            .offset(page.offset())
            .limit(page.page_size)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(PageSlice::new(items, count, page))
    }

    pub async fn has_voted_on(
        &self,
        employee_id: i32,
        date: NaiveDate,
    ) -> Result<bool, RepositoryError> {
        let count = Vote::find()
            .filter(VoteColumn::EmployeeId.eq(employee_id))
            .filter(VoteColumn::DateVoted.eq(date))
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(count > 0)
    }

    /// Distinct days with at least one vote strictly before `today`, most recent first.
    pub async fn distinct_vote_dates_before(
        &self,
        today: NaiveDate,
        limit: u64,
    ) -> Result<Vec<NaiveDate>, RepositoryError> {
        Vote::find()
            .select_only()
            .column(VoteColumn::DateVoted)
            .distinct()
            .filter(VoteColumn::DateVoted.lt(today))
            .order_by_desc(VoteColumn::DateVoted)
            .limit(limit)
            .into_tuple::<NaiveDate>()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Per-restaurant vote counts for `date` with the restaurant's name, highest
    /// first, ties by restaurant id.
    pub async fn tally_for_date(
        &self,
        date: NaiveDate,
        limit: Option<u64>,
    ) -> Result<Vec<RestaurantTally>, RepositoryError> {
        tally_select(date)
            .limit(limit)
            .into_model::<RestaurantTally>()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
