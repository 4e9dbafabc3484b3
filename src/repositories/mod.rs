//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for the
//! lunch-vote entities. Every repository borrows any [`ConnectionTrait`]
//! implementor so the same code runs on the pool or inside a transaction.
//!
//! [`ConnectionTrait`]: sea_orm::ConnectionTrait

pub mod account;
pub mod employee;
pub mod menu;
pub mod restaurant;
pub mod vote;

pub use account::{AccountChanges, AccountRepository, NewAccount};
pub use employee::{EmployeeChanges, EmployeeRecord, EmployeeRepository, NewEmployee};
pub use menu::{MenuChanges, MenuFilter, MenuRepository, NewMenu};
pub use restaurant::{NewRestaurant, RestaurantRecord, RestaurantRepository};
pub use vote::{NewVote, RestaurantTally, VoteFilter, VoteRepository};

use crate::error::RepositoryError;

/// A 1-based page of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    /// Number of pages needed for `count` items. An empty collection still has one page.
    pub fn num_pages(&self, count: u64) -> u64 {
        count.div_ceil(self.page_size).max(1)
    }

    /// Rejects pages past the end of a collection of `count` items.
    pub fn ensure_in_range(&self, count: u64) -> Result<(), RepositoryError> {
        if self.page > self.num_pages(count) {
            return Err(RepositoryError::not_found("Invalid page."));
        }
        Ok(())
    }
}

/// One page of rows plus the total row count.
#[derive(Debug, Clone)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub page: u64,
    pub num_pages: u64,
}

impl<T> PageSlice<T> {
    pub fn new(items: Vec<T>, count: u64, request: PageRequest) -> Self {
        Self {
            items,
            count,
            page: request.page,
            num_pages: request.num_pages(count),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageSlice<U> {
        PageSlice {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
            num_pages: self.num_pages,
        }
    }

    pub fn has_next(&self) -> bool {
        self.page < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}
