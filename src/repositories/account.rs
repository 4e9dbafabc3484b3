//! # Account Repository
//!
//! Login identities shared by employee and restaurant profiles.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};

use crate::error::RepositoryError;
use crate::models::Role;
use crate::models::account::{
    ActiveModel as AccountActiveModel, Column as AccountColumn, Entity as Account,
    Model as AccountModel,
};

pub const DUPLICATE_USERNAME_MESSAGE: &str = "A user with that username already exists.";
pub const DUPLICATE_EMAIL_MESSAGE: &str = "This email is already used by another user.";

/// Data for a new account; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_admin: bool,
}

/// Optional edits to an existing account. `None` leaves the column untouched.
/// Username and email are fixed once the account exists.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl AccountChanges {
    pub fn is_empty(&self) -> bool {
        self.password_hash.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
    }
}

/// Repository for Account database operations
pub struct AccountRepository<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> AccountRepository<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    pub async fn find(&self, username: &str) -> Result<Option<AccountModel>, RepositoryError> {
        Account::find_by_id(username.to_string())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<AccountModel>, RepositoryError> {
        Account::find()
            .filter(AccountColumn::Email.eq(email))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Fails with a readable validation error when the username or email is taken.
    pub async fn ensure_available(&self, username: &str, email: &str) -> Result<(), RepositoryError> {
        if self.find(username).await?.is_some() {
            return Err(RepositoryError::validation_error(DUPLICATE_USERNAME_MESSAGE));
        }
        if self.find_by_email(email).await?.is_some() {
            return Err(RepositoryError::validation_error(DUPLICATE_EMAIL_MESSAGE));
        }
        Ok(())
    }

    pub async fn create(&self, account: NewAccount) -> Result<AccountModel, RepositoryError> {
        self.ensure_available(&account.username, &account.email)
            .await?;

        let model = AccountActiveModel {
            username: Set(account.username),
            email: Set(account.email),
            password_hash: Set(account.password_hash),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            role: Set(account.role.as_str().to_string()),
            is_admin: Set(account.is_admin),
            date_joined: Set(Utc::now().into()),
        };

        model
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn update(
        &self,
        account: AccountModel,
        changes: AccountChanges,
    ) -> Result<AccountModel, RepositoryError> {
        if changes.is_empty() {
            return Ok(account);
        }

        let mut active = account.into_active_model();
        if let Some(password_hash) = changes.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(first_name) = changes.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = changes.last_name {
            active.last_name = Set(last_name);
        }

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Deletes the account; the schema cascades to its profile, menus and votes.
    pub async fn delete(&self, username: &str) -> Result<(), RepositoryError> {
        let result = Account::delete_by_id(username.to_string())
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(format!(
                "Account {username} not found"
            )));
        }
        Ok(())
    }
}
