use sea_orm_migration::{prelude::*, schema::*};

use super::m20261017_000001_create_users_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Item::Table)
                    .col(pk_uuid(Item::Id))
                    .col(string_len(Item::Title, 100))
                    .col(double(Item::Price))
                    .col(text(Item::Description))
                    .col(string_len(Item::ImageFile, 60).default("default.jpg"))
                    .col(integer(Item::Stock).default(1))
                    .col(integer(Item::Views).default(0))
                    .col(integer(Item::SalesCount).default(0))
                    .col(string(Item::DatePosted))
                    .col(uuid(Item::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-item-user_id")
                            .from(Item::Table, Item::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_items_title", Item::Title),
            ("idx_items_date_posted", Item::DatePosted),
            ("idx_items_user_id", Item::UserId),
            ("idx_items_views", Item::Views),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Item::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Item::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Item {
    Table,
    Id,
    Title,
    Price,
    Description,
    ImageFile,
    Stock,
    Views,
    SalesCount,
    DatePosted,
    UserId,
}
