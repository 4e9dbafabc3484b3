//! Migration to create the votes table.
//!
//! The unique index on (employee_id, date_voted) backs the one-vote-per-day
//! rule at the storage layer, so concurrent submissions cannot both land.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Votes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Votes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Votes::RestaurantId).integer().not_null())
                    .col(ColumnDef::new(Votes::MenuId).integer().not_null())
                    .col(ColumnDef::new(Votes::EmployeeId).integer().not_null())
                    .col(ColumnDef::new(Votes::DateVoted).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_restaurant_id")
                            .from(Votes::Table, Votes::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_menu_id")
                            .from(Votes::Table, Votes::MenuId)
                            .to(Menus::Table, Menus::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_votes_employee_id")
                            .from(Votes::Table, Votes::EmployeeId)
                            .to(Employees::Table, Employees::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_votes_employee_date_unique")
                    .table(Votes::Table)
                    .col(Votes::EmployeeId)
                    .col(Votes::DateVoted)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Tally queries group a single day's votes by restaurant
        manager
            .create_index(
                Index::create()
                    .name("idx_votes_date_restaurant")
                    .table(Votes::Table)
                    .col(Votes::DateVoted)
                    .col(Votes::RestaurantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_votes_employee_date_unique")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(Index::drop().name("idx_votes_date_restaurant").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Votes::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Votes {
    Table,
    Id,
    RestaurantId,
    MenuId,
    EmployeeId,
    DateVoted,
}

#[derive(DeriveIden)]
enum Restaurants {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Menus {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
}
