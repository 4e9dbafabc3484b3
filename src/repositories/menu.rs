//! # Menu Repository
//!
//! Menus are listed for the current day unless the caller asks for older
//! entries with `include_previous`.

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use super::{PageRequest, PageSlice};
use crate::error::RepositoryError;
use crate::models::menu::{
    ActiveModel as MenuActiveModel, Column as MenuColumn, Entity as Menu, Model as MenuModel,
};

/// List filters for menus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuFilter {
    pub restaurant: Option<i32>,
    pub date_posted: Option<NaiveDate>,
    pub include_previous: bool,
}

impl MenuFilter {
    /// Applies the filters. Without `include_previous` only menus posted on
    /// `today` match; an explicit `date_posted` narrows further.
    fn apply(&self, mut select: Select<Menu>, today: NaiveDate) -> Select<Menu> {
        if let Some(restaurant) = self.restaurant {
            select = select.filter(MenuColumn::RestaurantId.eq(restaurant));
        }
        if let Some(date_posted) = self.date_posted {
            select = select.filter(MenuColumn::DatePosted.eq(date_posted));
        }
        if !self.include_previous {
            select = select.filter(MenuColumn::DatePosted.eq(today));
        }
        select
    }
}

#[derive(Debug, Clone)]
pub struct NewMenu {
    pub restaurant_id: i32,
    pub title: String,
    pub description: String,
    pub date_posted: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct MenuChanges {
    pub restaurant_id: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Repository for Menu database operations
pub struct MenuRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> MenuRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn create(&self, request: NewMenu) -> Result<MenuModel, RepositoryError> {
        MenuActiveModel {
            restaurant_id: Set(request.restaurant_id),
            title: Set(request.title),
            description: Set(request.description),
            date_posted: Set(request.date_posted),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn find(&self, id: i32) -> Result<Option<MenuModel>, RepositoryError> {
        Menu::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: i32) -> Result<MenuModel, RepositoryError> {
        self.find(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(format!("Menu {id} not found")))
    }

    /// Menus ordered by posting date, then restaurant.
    pub async fn list(
        &self,
        filter: &MenuFilter,
        today: NaiveDate,
        page: PageRequest,
    ) -> Result<PageSlice<MenuModel>, RepositoryError> {
        let query = filter.apply(Menu::find(), today);

        let count = query
            .clone()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        page.ensure_in_range(count)?;

        let items = query
            .order_by_asc(MenuColumn::DatePosted)
            .order_by_asc(MenuColumn::RestaurantId)
            .order_by_asc(MenuColumn::Id)
            .offset(page.offset())
            .limit(page.page_size)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(PageSlice::new(items, count, page))
    }

    pub async fn update(
        &self,
        menu: MenuModel,
        changes: MenuChanges,
    ) -> Result<MenuModel, RepositoryError> {
        if changes.restaurant_id.is_none()
            && changes.title.is_none()
            && changes.description.is_none()
        {
            return Ok(menu);
        }

        let mut active = menu.into_active_model();
        if let Some(restaurant_id) = changes.restaurant_id {
            active.restaurant_id = Set(restaurant_id);
        }
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: i32) -> Result<(), RepositoryError> {
        let result = Menu::delete_by_id(id)
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(format!("Menu {id} not found")));
        }
        Ok(())
    }
}
