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
                    .table(Stock::Table)
                    .col(pk_uuid(Stock::Id))
                    .col(string_len(Stock::Name, 100))
                    .col(integer(Stock::Quantity).default(1))
                    .col(text_null(Stock::Description))
                    .col(string_len(Stock::ImageFile, 60).default("default.jpg"))
                    .col(string(Stock::DateAdded))
                    .col(uuid(Stock::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-stock-user_id")
                            .from(Stock::Table, Stock::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stocks_user_name")
                    .table(Stock::Table)
                    .col(Stock::UserId)
                    .col(Stock::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stock::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Stock {
    Table,
    Id,
    Name,
    Quantity,
    Description,
    ImageFile,
    DateAdded,
    UserId,
}
