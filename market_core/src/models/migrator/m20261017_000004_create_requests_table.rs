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
                    .table(Request::Table)
                    .col(pk_uuid(Request::Id))
                    .col(string_len(Request::Title, 100))
                    .col(text(Request::Description))
                    .col(double(Request::Price))
                    .col(string_len(Request::ImageFile, 60).default("default.jpg"))
                    .col(string(Request::DatePosted))
                    .col(uuid(Request::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-request-user_id")
                            .from(Request::Table, Request::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_requests_date_posted")
                    .table(Request::Table)
                    .col(Request::DatePosted)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Request::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Request {
    Table,
    Id,
    Title,
    Description,
    Price,
    ImageFile,
    DatePosted,
    UserId,
}
