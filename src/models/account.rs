//! Account entity model
//!
//! Login identity shared by employees and restaurant owners. The role column
//! decides which profile table the account is paired with.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

use super::Role;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Login name (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,

    /// Contact email, unique across accounts
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id PHC string
    pub password_hash: String,

    pub first_name: String,

    pub last_name: String,

    /// Storage form of [`Role`]
    pub role: String,

    /// Administrators bypass ownership checks
    pub is_admin: bool,

    pub date_joined: DateTimeWithTimeZone,
}

impl Model {
    /// Parsed role; unknown values are treated as employees.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Employee)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::employee::Entity")]
    Employee,
    #[sea_orm(has_one = "super::restaurant::Entity")]
    Restaurant,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl Related<super::restaurant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
