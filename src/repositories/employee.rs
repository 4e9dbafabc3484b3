//! # Employee Repository
//!
//! Employee profiles are always read together with their account so the
//! endpoint layer can flatten the two records into one representation.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryOrder,
    QuerySelect, Set,
};

use super::account::{AccountChanges, AccountRepository, NewAccount};
use super::{PageRequest, PageSlice};
use crate::error::RepositoryError;
use crate::models::Role;
use crate::models::account::{Entity as Account, Model as AccountModel};
use crate::models::employee::{
    ActiveModel as EmployeeActiveModel, Column as EmployeeColumn, Entity as Employee,
    Model as EmployeeModel,
};

/// An employee profile paired with its account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRecord {
    pub profile: EmployeeModel,
    pub account: AccountModel,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub account: NewAccount,
    pub department: String,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeChanges {
    pub account: AccountChanges,
    pub department: Option<String>,
}

/// Repository for Employee database operations
pub struct EmployeeRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> EmployeeRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Creates the account and its employee profile. Run inside a transaction so
    /// a failed profile insert does not leave an orphan account.
    pub async fn create(&self, request: NewEmployee) -> Result<EmployeeRecord, RepositoryError> {
        let mut new_account = request.account;
        new_account.role = Role::Employee;
        let account = AccountRepository::new(self.db).create(new_account).await?;

        let profile = EmployeeActiveModel {
            username: Set(account.username.clone()),
            department: Set(request.department),
            date_joined: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)?;

        Ok(EmployeeRecord { profile, account })
    }

    pub async fn find(&self, id: i32) -> Result<Option<EmployeeRecord>, RepositoryError> {
        let row = Employee::find_by_id(id)
            .find_also_related(Account)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(row.and_then(into_record))
    }

    pub async fn get(&self, id: i32) -> Result<EmployeeRecord, RepositoryError> {
        self.find(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found(format!("Employee {id} not found")))
    }

    /// Employees ordered by username.
    pub async fn list(&self, page: PageRequest) -> Result<PageSlice<EmployeeRecord>, RepositoryError> {
        let count = Employee::find()
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        page.ensure_in_range(count)?;

        let rows = Employee::find()
            .find_also_related(Account)
            .order_by_asc(EmployeeColumn::Username)
            .offset(page.offset())
            .limit(page.page_size)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        let items = rows.into_iter().filter_map(into_record).collect();
        Ok(PageSlice::new(items, count, page))
    }

    pub async fn update(
        &self,
        record: EmployeeRecord,
        changes: EmployeeChanges,
    ) -> Result<EmployeeRecord, RepositoryError> {
        let account = AccountRepository::new(self.db)
            .update(record.account, changes.account)
            .await?;

        let profile = match changes.department {
            Some(department) => {
                let mut active = record.profile.into_active_model();
                active.department = Set(department);
                active
                    .update(self.db)
                    .await
                    .map_err(RepositoryError::database_error)?
            }
            None => record.profile,
        };

        Ok(EmployeeRecord { profile, account })
    }

    /// Removes the employee together with its account.
    pub async fn delete(&self, record: &EmployeeRecord) -> Result<(), RepositoryError> {
        AccountRepository::new(self.db)
            .delete(&record.account.username)
            .await
    }
}

fn into_record((profile, account): (EmployeeModel, Option<AccountModel>)) -> Option<EmployeeRecord> {
    account.map(|account| EmployeeRecord { profile, account })
}
