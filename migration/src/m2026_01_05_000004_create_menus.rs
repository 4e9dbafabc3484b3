//! Migration to create the menus table.
//!
//! Menus are looked up by posting date on every list request, so the date
//! column is indexed.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Menus::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Menus::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Menus::RestaurantId).integer().not_null())
                    .col(ColumnDef::new(Menus::Title).string_len(250).not_null())
                    .col(
                        ColumnDef::new(Menus::Description)
                            .string_len(500)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Menus::DatePosted).date().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_menus_restaurant_id")
                            .from(Menus::Table, Menus::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_menus_date_posted")
                    .table(Menus::Table)
                    .col(Menus::DatePosted)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_menus_date_posted").to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Menus::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Menus {
    Table,
    Id,
    RestaurantId,
    Title,
    Description,
    DatePosted,
}

#[derive(DeriveIden)]
enum Restaurants {
    Table,
    Id,
}
