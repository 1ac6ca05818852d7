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
                    .table(UserFollow::Table)
                    .col(pk_uuid(UserFollow::Id))
                    .col(uuid(UserFollow::FollowerId))
                    .col(uuid(UserFollow::FollowedId))
                    .col(string(UserFollow::DateFollowed))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_follow-follower_id")
                            .from(UserFollow::Table, UserFollow::FollowerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-user_follow-followed_id")
                            .from(UserFollow::Table, UserFollow::FollowedId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_follows_pair_unique")
                    .table(UserFollow::Table)
                    .col(UserFollow::FollowerId)
                    .col(UserFollow::FollowedId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserFollow::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum UserFollow {
    Table,
    Id,
    FollowerId,
    FollowedId,
    DateFollowed,
}
