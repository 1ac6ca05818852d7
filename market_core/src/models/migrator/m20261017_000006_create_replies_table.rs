use sea_orm_migration::{prelude::*, schema::*};

use super::m20261017_000001_create_users_table::User;
use super::m20261017_000005_create_posts_table::Post;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reply::Table)
                    .col(pk_uuid(Reply::Id))
                    .col(text(Reply::Content))
                    .col(string(Reply::DatePosted))
                    .col(uuid(Reply::UserId))
                    .col(uuid(Reply::PostId))
                    .col(uuid_null(Reply::QuotedPostId))
                    .col(uuid_null(Reply::QuotedReplyId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reply-user_id")
                            .from(Reply::Table, Reply::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reply-post_id")
                            .from(Reply::Table, Reply::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reply-quoted_post_id")
                            .from(Reply::Table, Reply::QuotedPostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reply-quoted_reply_id")
                            .from(Reply::Table, Reply::QuotedReplyId)
                            .to(Reply::Table, Reply::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_replies_post_id")
                    .table(Reply::Table)
                    .col(Reply::PostId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reply::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Reply {
    Table,
    Id,
    Content,
    DatePosted,
    UserId,
    PostId,
    QuotedPostId,
    QuotedReplyId,
}
