use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .col(pk_uuid(User::Id))
                    .col(string_len_uniq(User::Username, 20))
                    .col(string_len_uniq(User::Email, 120))
                    .col(string(User::Password))
                    .col(string_len(User::Contact, 60))
                    .col(string_len(User::Avatar, 60).default("default_avatar.png"))
                    .col(boolean(User::IsAdmin).default(false))
                    .col(integer(User::SalesCount).default(0))
                    .col(string(User::DateJoined))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum User {
    Table,
    Id,
    Username,
    Email,
    Password,
    Contact,
    Avatar,
    IsAdmin,
    SalesCount,
    DateJoined,
}
