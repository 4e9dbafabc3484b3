//! # Restaurant Repository

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::account::{AccountRepository, NewAccount};
use super::{PageRequest, PageSlice};
use crate::error::RepositoryError;
use crate::models::Role;
use crate::models::account::{Entity as Account, Model as AccountModel};
use crate::models::restaurant::{
    ActiveModel as RestaurantActiveModel, Column as RestaurantColumn, Entity as Restaurant,
    Model as RestaurantModel,
};

/// A restaurant profile paired with its owner account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantRecord {
    pub profile: RestaurantModel,
    pub account: AccountModel,
}

#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub account: NewAccount,
    pub restaurant_name: String,
}

/// Repository for Restaurant database operations
pub struct RestaurantRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> RestaurantRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: NewRestaurant) -> Result<RestaurantRecord, RepositoryError> {
        let mut new_account = request.account;
        new_account.role = Role::RestaurantOwner;
        let account = AccountRepository::new(self.db).create(new_account).await?;

        let profile = RestaurantActiveModel {
            username: Set(account.username.clone()),
            restaurant_name: Set(request.restaurant_name),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)?;

        Ok(RestaurantRecord { profile, account })
    }

    /// Profile row only, for lookups that do not render the account.
    pub async fn find_profile(&self, id: i32) -> Result<Option<RestaurantModel>, RepositoryError> {
        Restaurant::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<RestaurantModel>, RepositoryError> {
        Restaurant::find()
            .filter(RestaurantColumn::Username.eq(username))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<RestaurantRecord, RepositoryError> {
        let row = Restaurant::find_by_id(id)
            .find_also_related(Account)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        row.and_then(into_record)
            .ok_or_else(|| RepositoryError::not_found(format!("Restaurant {id} not found")))
    }

    /// Restaurants ordered by name.
    pub async fn list(
        &self,
        page: PageRequest,
    ) -> Result<PageSlice<RestaurantRecord>, RepositoryError> {
        let count = Restaurant::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        page.ensure_in_range(count)?;

        let rows = Restaurant::find()
            .find_also_related(Account)
            .order_by_asc(RestaurantColumn::RestaurantName)
            .order_by_asc(RestaurantColumn::Id)
            .offset(page.offset())
            .limit(page.page_size)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let items = rows.into_iter().filter_map(into_record).collect();
        Ok(PageSlice::new(items, count, page))
    }

    pub async fn rename(
        &self,
        record: RestaurantRecord,
        restaurant_name: String,
    ) -> Result<RestaurantRecord, RepositoryError> {
        let mut active = record.profile.into_active_model();
        active.restaurant_name = Set(restaurant_name);
        let profile = active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(RestaurantRecord {
            profile,
            account: record.account,
        })
    }

    /// Removes the restaurant together with its owner account.
    pub async fn delete(&self, record: &RestaurantRecord) -> Result<(), RepositoryError> {
        AccountRepository::new(self.db)
            .delete(&record.account.username)
            .await
    }
}

fn into_record(
    (profile, account): (RestaurantModel, Option<AccountModel>),
) -> Option<RestaurantRecord> {
    account.map(|account| RestaurantRecord { profile, account })
}
