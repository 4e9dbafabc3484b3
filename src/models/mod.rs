//! # Data Models
//!
//! This module contains all the data models used throughout the Lunch Vote API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod account;
pub mod employee;
pub mod menu;
pub mod restaurant;
pub mod vote;

pub use account::Entity as Account;
pub use employee::Entity as Employee;
pub use menu::Entity as Menu;
pub use restaurant::Entity as Restaurant;
pub use vote::Entity as Vote;

/// Role tag stored on every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Employee,
    RestaurantOwner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "EMPLOYEE",
            Role::RestaurantOwner => "RESTAURANT_OWNER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "EMPLOYEE" => Ok(Role::Employee),
            "RESTAURANT_OWNER" => Ok(Role::RestaurantOwner),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "lunchvote".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
