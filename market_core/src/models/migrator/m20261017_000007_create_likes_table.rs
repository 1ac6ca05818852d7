use sea_orm_migration::{prelude::*, schema::*};

use super::m20261017_000001_create_users_table::User;
use super::m20261017_000005_create_posts_table::Post;
use super::m20261017_000006_create_replies_table::Reply;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Like::Table)
                    .col(pk_uuid(Like::Id))
                    .col(string(Like::DateLiked))
                    .col(uuid(Like::UserId))
                    .col(uuid(Like::PostId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-like-user_id")
                            .from(Like::Table, Like::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-like-post_id")
                            .from(Like::Table, Like::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_likes_user_post_unique")
                    .table(Like::Table)
                    .col(Like::UserId)
                    .col(Like::PostId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ReplyLike::Table)
                    .col(pk_uuid(ReplyLike::Id))
                    .col(string(ReplyLike::DateLiked))
                    .col(uuid(ReplyLike::UserId))
                    .col(uuid(ReplyLike::ReplyId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reply_like-user_id")
                            .from(ReplyLike::Table, ReplyLike::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reply_like-reply_id")
                            .from(ReplyLike::Table, ReplyLike::ReplyId)
                            .to(Reply::Table, Reply::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reply_likes_user_reply_unique")
                    .table(ReplyLike::Table)
                    .col(ReplyLike::UserId)
                    .col(ReplyLike::ReplyId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReplyLike::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Like::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Like {
    Table,
    Id,
    DateLiked,
    UserId,
    PostId,
}

#[derive(DeriveIden)]
pub enum ReplyLike {
    Table,
    Id,
    DateLiked,
    UserId,
    ReplyId,
}
