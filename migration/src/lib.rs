//! Database migrations for the Lunch Vote API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_05_000001_create_accounts;
mod m2026_01_05_000002_create_employees;
mod m2026_01_05_000003_create_restaurants;
mod m2026_01_05_000004_create_menus;
mod m2026_01_05_000005_create_votes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_05_000001_create_accounts::Migration),
            Box::new(m2026_01_05_000002_create_employees::Migration),
            Box::new(m2026_01_05_000003_create_restaurants::Migration),
            Box::new(m2026_01_05_000004_create_menus::Migration),
            Box::new(m2026_01_05_000005_create_votes::Migration),
        ]
    }
}
