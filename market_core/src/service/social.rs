use sea_orm::sea_query::OnConflict;
use serde::Serialize;
use thiserror::Error;

use crate::{
    entity::prelude::*,
    ids::{UserFollowId, UserId},
    service::{board, items, notifications::notify, requests, stocks},
    time,
};

#[derive(Debug, Error)]
pub enum SocialServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("user not found")]
    UserNotFound,

    #[error("you cannot follow yourself")]
    SelfFollow,
}

/// Everything shown on a user's profile page.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user: UserModel,
    pub is_self: bool,
    pub following: bool,
    pub follower_count: u64,
    pub following_count: u64,
    pub items: Vec<ItemModel>,
    pub followed_items: Vec<ItemModel>,
    pub requests: Vec<RequestModel>,
    pub posts: Vec<PostModel>,
    pub replies: Vec<ReplyModel>,
    /// Only filled in when the viewer owns the profile.
    pub stocks: Vec<StockModel>,
}

#[derive(Clone)]
pub struct SocialService {
    db: DatabaseConnection,
}

impl SocialService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn get_user(&self, user_id: UserId) -> Result<UserModel, SocialServiceError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(SocialServiceError::UserNotFound)
    }

    /// Returns `true` when a new follow was recorded.
    pub async fn follow_user(
        &self,
        follower_id: UserId,
        followed_id: UserId,
    ) -> Result<bool, SocialServiceError> {
        if follower_id == followed_id {
            return Err(SocialServiceError::SelfFollow);
        }
        let follower = self.get_user(follower_id).await?;
        self.get_user(followed_id).await?;

        let txn = self.db.begin().await?;
        let follow = UserFollowActiveModel {
            id: Set(UserFollowId::new()),
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            date_followed: Set(time::now()),
        };
        let inserted = UserFollow::insert(follow)
            .on_conflict(
                OnConflict::columns([UserFollowColumn::FollowerId, UserFollowColumn::FollowedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        if inserted == 0 {
            return Ok(false);
        }

        notify(
            &txn,
            followed_id,
            follower_id,
            NotificationKind::FollowUser,
            format!("{} followed you", follower.username),
            Some(follower_id.into_uuid()),
        )
        .await?;

        txn.commit().await?;
        Ok(true)
    }

    /// Returns `true` when a follow was removed.
    pub async fn unfollow_user(
        &self,
        follower_id: UserId,
        followed_id: UserId,
    ) -> Result<bool, SocialServiceError> {
        self.get_user(followed_id).await?;
        let result = UserFollow::delete_many()
            .filter(UserFollowColumn::FollowerId.eq(follower_id))
            .filter(UserFollowColumn::FollowedId.eq(followed_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn is_following(
        &self,
        follower_id: UserId,
        followed_id: UserId,
    ) -> Result<bool, SocialServiceError> {
        Ok(UserFollow::find()
            .filter(UserFollowColumn::FollowerId.eq(follower_id))
            .filter(UserFollowColumn::FollowedId.eq(followed_id))
            .one(&self.db)
            .await?
            .is_some())
    }

    pub async fn profile(
        &self,
        user_id: UserId,
        viewer_id: UserId,
    ) -> Result<Profile, SocialServiceError> {
        let user = self.get_user(user_id).await?;
        let is_self = user_id == viewer_id;

        let following = !is_self && self.is_following(viewer_id, user_id).await?;
        let follower_count = UserFollow::find()
            .filter(UserFollowColumn::FollowedId.eq(user_id))
            .count(&self.db)
            .await?;
        let following_count = UserFollow::find()
            .filter(UserFollowColumn::FollowerId.eq(user_id))
            .count(&self.db)
            .await?;

        let items = items::items_by_user(&self.db, user_id).await?;
        let followed_items = items::followed_items(&self.db, user_id).await?;
        let requests = requests::requests_by_user(&self.db, user_id).await?;
        let posts = board::posts_by_user(&self.db, user_id).await?;
        let replies = board::replies_by_user(&self.db, user_id).await?;
        let stocks = if is_self {
            stocks::stocks_by_user(&self.db, user_id).await?
        } else {
            Vec::new()
        };

        Ok(Profile {
            user,
            is_self,
            following,
            follower_count,
            following_count,
            items,
            followed_items,
            requests,
            posts,
            replies,
            stocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::memory_db,
        service::tests_support::{seed_item, seed_post, seed_stock, seed_user},
    };
    use sea_orm::sea_query::Expr;

    async fn setup() -> (DatabaseConnection, SocialService) {
        let db = memory_db().await;
        let service = SocialService::new(db.clone());
        (db, service)
    }

    #[tokio::test]
    async fn test_follow_user_once_and_notify() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        assert!(matches!(
            service.follow_user(alice.id, alice.id).await,
            Err(SocialServiceError::SelfFollow)
        ));

        assert!(service.follow_user(bob.id, alice.id).await.unwrap());
        assert!(!service.follow_user(bob.id, alice.id).await.unwrap());

        let notes = Notification::find().all(&db).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].user_id, alice.id);
        assert_eq!(notes[0].notification_type, NotificationKind::FollowUser);
        assert_eq!(notes[0].related_id, Some(bob.id.into_uuid()));

        assert!(service.unfollow_user(bob.id, alice.id).await.unwrap());
        assert!(!service.is_following(bob.id, alice.id).await.unwrap());
        assert_eq!(UserFollow::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_profile_hides_stock_from_others() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        seed_item(&db, alice.id, "kettle", 12.0, 1).await;
        seed_stock(&db, alice.id, "mugs", 4).await;
        service.follow_user(bob.id, alice.id).await.unwrap();

        let own = service.profile(alice.id, alice.id).await.unwrap();
        assert!(own.is_self);
        assert_eq!(own.items.len(), 1);
        assert_eq!(own.stocks.len(), 1);
        assert_eq!(own.follower_count, 1);

        let visited = service.profile(alice.id, bob.id).await.unwrap();
        assert!(!visited.is_self);
        assert!(visited.following);
        assert!(visited.stocks.is_empty());

        let json = serde_json::to_value(&visited).unwrap();
        assert!(json["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn test_profile_breaks_timestamp_ties_by_id() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let first = seed_item(&db, alice.id, "lamp", 5.0, 1).await;
        let second = seed_item(&db, alice.id, "desk", 9.0, 1).await;
        let first_post = seed_post(&db, alice.id, "hello").await;
        let second_post = seed_post(&db, alice.id, "again").await;

        let stamp = "2026-01-01T00:00:00.000000Z";
        Item::update_many()
            .col_expr(ItemColumn::DatePosted, Expr::value(stamp))
            .exec(&db)
            .await
            .unwrap();
        Post::update_many()
            .col_expr(PostColumn::DatePosted, Expr::value(stamp))
            .exec(&db)
            .await
            .unwrap();

        let profile = service.profile(alice.id, alice.id).await.unwrap();
        let item_ids: Vec<_> = profile.items.iter().map(|i| i.id).collect();
        assert_eq!(item_ids, vec![second.id, first.id]);
        let post_ids: Vec<_> = profile.posts.iter().map(|p| p.id).collect();
        assert_eq!(post_ids, vec![second_post.id, first_post.id]);
    }
}
