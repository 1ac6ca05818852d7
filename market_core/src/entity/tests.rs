#[cfg(test)]
mod entity_tests {
    use crate::entity::item::DEFAULT_IMAGE;
    use crate::entity::prelude::*;
    use crate::entity::user::DEFAULT_AVATAR;
    use crate::ids::*;
    use crate::models::migrator::Migrator;
    use crate::time;
    use sea_orm_migration::MigratorTrait;

    /// Test helper to create and migrate an in-memory database
    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");

        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    fn user(username: &str, email: &str) -> UserActiveModel {
        UserActiveModel {
            id: Set(UserId::new()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password: Set("x".to_string()),
            contact: Set("contact".to_string()),
            avatar: Set(DEFAULT_AVATAR.to_string()),
            is_admin: Set(false),
            sales_count: Set(0),
            date_joined: Set(time::now()),
        }
    }

    fn item(seller: UserId, title: &str) -> ItemActiveModel {
        ItemActiveModel {
            id: Set(ItemId::new()),
            title: Set(title.to_string()),
            price: Set(9.99),
            description: Set("desc".to_string()),
            image_file: Set(DEFAULT_IMAGE.to_string()),
            stock: Set(1),
            views: Set(0),
            sales_count: Set(0),
            date_posted: Set(time::now()),
            user_id: Set(seller),
        }
    }

    fn follow(user_id: UserId, item_id: ItemId) -> FollowActiveModel {
        FollowActiveModel {
            id: Set(FollowId::new()),
            user_id: Set(user_id),
            item_id: Set(item_id),
            date_followed: Set(time::now()),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let db = setup_test_db().await;

        let created = User::insert(user("alice", "alice@campus.edu"))
            .exec_with_returning(&db)
            .await
            .expect("Failed to insert user");

        let found = User::find_by_id(created.id)
            .one(&db)
            .await
            .expect("Failed to query user")
            .unwrap();

        assert_eq!(found.username, "alice");
        assert_eq!(found.avatar, DEFAULT_AVATAR);
        assert!(!found.is_admin);
    }

    #[tokio::test]
    async fn test_user_email_and_username_are_unique() {
        let db = setup_test_db().await;

        User::insert(user("alice", "alice@campus.edu"))
            .exec(&db)
            .await
            .unwrap();

        let same_email = User::insert(user("alice2", "alice@campus.edu")).exec(&db).await;
        assert!(same_email.is_err(), "Should fail due to unique email");

        let same_name = User::insert(user("alice", "other@campus.edu")).exec(&db).await;
        assert!(same_name.is_err(), "Should fail due to unique username");
    }

    #[tokio::test]
    async fn test_follow_unique_constraint() {
        let db = setup_test_db().await;
        let seller = User::insert(user("seller", "s@campus.edu"))
            .exec_with_returning(&db)
            .await
            .unwrap();
        let buyer = User::insert(user("buyer", "b@campus.edu"))
            .exec_with_returning(&db)
            .await
            .unwrap();
        let lamp = Item::insert(item(seller.id, "lamp"))
            .exec_with_returning(&db)
            .await
            .unwrap();

        Follow::insert(follow(buyer.id, lamp.id)).exec(&db).await.unwrap();

        // This should fail due to unique constraint on (user_id, item_id)
        let result = Follow::insert(follow(buyer.id, lamp.id)).exec(&db).await;
        assert!(result.is_err(), "Should fail due to unique constraint");
    }

    #[tokio::test]
    async fn test_find_seller_with_related_items() {
        let db = setup_test_db().await;
        let seller = User::insert(user("seller", "s@campus.edu"))
            .exec_with_returning(&db)
            .await
            .unwrap();
        Item::insert(item(seller.id, "lamp")).exec(&db).await.unwrap();
        Item::insert(item(seller.id, "desk")).exec(&db).await.unwrap();

        let items = seller.find_related(Item).all(&db).await.unwrap();
        assert_eq!(items.len(), 2);

        let lamp = items.iter().find(|i| i.title == "lamp").unwrap();
        let back = lamp.find_related(User).one(&db).await.unwrap().unwrap();
        assert_eq!(back.id, seller.id);
    }

    #[tokio::test]
    async fn test_cascade_delete_item_removes_follows() {
        let db = setup_test_db().await;
        let seller = User::insert(user("seller", "s@campus.edu"))
            .exec_with_returning(&db)
            .await
            .unwrap();
        let buyer = User::insert(user("buyer", "b@campus.edu"))
            .exec_with_returning(&db)
            .await
            .unwrap();
        let lamp = Item::insert(item(seller.id, "lamp"))
            .exec_with_returning(&db)
            .await
            .unwrap();
        Follow::insert(follow(buyer.id, lamp.id)).exec(&db).await.unwrap();

        Item::delete_by_id(lamp.id).exec(&db).await.unwrap();

        let follows = Follow::find().all(&db).await.unwrap();
        assert!(follows.is_empty(), "Follows should cascade with their item");
    }

    #[tokio::test]
    async fn test_deleting_quoted_reply_clears_quote() {
        let db = setup_test_db().await;
        let author = User::insert(user("author", "a@campus.edu"))
            .exec_with_returning(&db)
            .await
            .unwrap();
        let post = Post::insert(PostActiveModel {
            id: Set(PostId::new()),
            content: Set("hello".to_string()),
            image_file: Set(None),
            date_posted: Set(time::now()),
            user_id: Set(author.id),
        })
        .exec_with_returning(&db)
        .await
        .unwrap();

        let reply = |quoted: Option<ReplyId>| ReplyActiveModel {
            id: Set(ReplyId::new()),
            content: Set("reply".to_string()),
            date_posted: Set(time::now()),
            user_id: Set(author.id),
            post_id: Set(post.id),
            quoted_post_id: Set(None),
            quoted_reply_id: Set(quoted),
        };

        let first = Reply::insert(reply(None)).exec_with_returning(&db).await.unwrap();
        let second = Reply::insert(reply(Some(first.id)))
            .exec_with_returning(&db)
            .await
            .unwrap();

        Reply::delete_by_id(first.id).exec(&db).await.unwrap();

        let second = Reply::find_by_id(second.id).one(&db).await.unwrap().unwrap();
        assert_eq!(second.quoted_reply_id, None);
    }

    #[tokio::test]
    async fn test_notification_kind_stored_as_snake_case() {
        let db = setup_test_db().await;
        let alice = User::insert(user("alice", "a@campus.edu"))
            .exec_with_returning(&db)
            .await
            .unwrap();

        Notification::insert(NotificationActiveModel {
            id: Set(NotificationId::new()),
            user_id: Set(alice.id),
            sender_id: Set(alice.id),
            notification_type: Set(NotificationKind::ReplyReply),
            content: Set(String::new()),
            is_read: Set(false),
            date_created: Set(time::now()),
            related_id: Set(None),
        })
        .exec(&db)
        .await
        .unwrap();

        let found = Notification::find()
            .filter(NotificationColumn::NotificationType.eq("reply_reply"))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.notification_type, NotificationKind::ReplyReply);

        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["notification_type"], "reply_reply");
    }

    #[tokio::test]
    async fn test_relationship_empty_related_collection() {
        let db = setup_test_db().await;
        let alice = User::insert(user("alice", "a@campus.edu"))
            .exec_with_returning(&db)
            .await
            .unwrap();

        let sessions = alice.find_related(Session).all(&db).await.unwrap();
        assert!(sessions.is_empty());
    }
}
