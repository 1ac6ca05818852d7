use sea_orm_migration::prelude::*;

mod m20261017_000001_create_users_table;
mod m20261017_000002_create_items_table;
mod m20261017_000003_create_follows_table;
mod m20261017_000004_create_requests_table;
mod m20261017_000005_create_posts_table;
mod m20261017_000006_create_replies_table;
mod m20261017_000007_create_likes_table;
mod m20261017_000008_create_user_follows_table;
mod m20261017_000009_create_messages_table;
mod m20261017_000010_create_notifications_table;
mod m20261017_000011_create_stocks_table;
mod m20261017_000012_create_comments_table;
mod m20261017_000013_create_sessions_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261017_000001_create_users_table::Migration),
            Box::new(m20261017_000002_create_items_table::Migration),
            Box::new(m20261017_000003_create_follows_table::Migration),
            Box::new(m20261017_000004_create_requests_table::Migration),
            Box::new(m20261017_000005_create_posts_table::Migration),
            Box::new(m20261017_000006_create_replies_table::Migration),
            Box::new(m20261017_000007_create_likes_table::Migration),
            Box::new(m20261017_000008_create_user_follows_table::Migration),
            Box::new(m20261017_000009_create_messages_table::Migration),
            Box::new(m20261017_000010_create_notifications_table::Migration),
            Box::new(m20261017_000011_create_stocks_table::Migration),
            Box::new(m20261017_000012_create_comments_table::Migration),
            Box::new(m20261017_000013_create_sessions_table::Migration),
        ]
    }
}

#[cfg(test)]
use sea_orm::{Database, DbErr};

#[tokio::test]
async fn test_migrations_okay() -> Result<(), DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let schema_manager = SchemaManager::new(&db);

    Migrator::refresh(&db).await?;

    for table in [
        "user",
        "item",
        "follow",
        "request",
        "post",
        "reply",
        "like",
        "reply_like",
        "user_follow",
        "message",
        "notification",
        "stock",
        "comment",
        "session",
    ] {
        assert!(schema_manager.has_table(table).await?, "missing table {table}");
    }

    Ok(())
}
