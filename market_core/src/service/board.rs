//! The square: a public message board with threaded replies and likes.

use std::collections::{HashMap, HashSet};

use sea_orm::sea_query::{Expr, OnConflict};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::{
    entity::prelude::*,
    error::{required, ValidationError},
    ids::{LikeId, PostId, ReplyId, ReplyLikeId, UserId},
    service::{card_for, load_cards, notifications::notify, page_index, Page, UserCard},
    time,
};

pub const PER_PAGE: u64 = 20;

#[derive(Debug, Error)]
pub enum BoardServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("post not found")]
    PostNotFound,

    #[error("reply not found")]
    ReplyNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("forbidden: not the author")]
    Forbidden,
}

/// Which field a square search matches against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    User,
    #[default]
    Content,
}

impl From<&str> for SearchType {
    fn from(value: &str) -> Self {
        match value {
            "user" => SearchType::User,
            _ => SearchType::Content,
        }
    }
}

/// What a reply quotes, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Post(PostId),
    Reply(ReplyId),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyForm {
    pub content: String,
    #[serde(default)]
    pub quoted_id: Option<Uuid>,
    #[serde(default)]
    pub quoted_type: Option<String>,
}

impl ReplyForm {
    pub fn quote(&self) -> Option<Quote> {
        match (self.quoted_id, self.quoted_type.as_deref()) {
            (Some(id), Some("post")) => Some(Quote::Post(id.into())),
            (Some(id), Some("reply")) => Some(Quote::Reply(id.into())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyView {
    #[serde(flatten)]
    pub reply: ReplyModel,
    pub author: UserCard,
    pub like_count: u64,
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: PostModel,
    pub author: UserCard,
    pub like_count: u64,
    pub liked: bool,
    pub replies: Vec<ReplyView>,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeState {
    pub liked: bool,
    pub count: u64,
}

/// Newest first.
pub(crate) async fn posts_by_user<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
) -> Result<Vec<PostModel>, DbErr> {
    Post::find()
        .filter(PostColumn::UserId.eq(user_id))
        .order_by_desc(PostColumn::DatePosted)
        .order_by_desc(PostColumn::Id)
        .all(conn)
        .await
}

pub(crate) async fn replies_by_user<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
) -> Result<Vec<ReplyModel>, DbErr> {
    Reply::find()
        .filter(ReplyColumn::UserId.eq(user_id))
        .order_by_desc(ReplyColumn::DatePosted)
        .order_by_desc(ReplyColumn::Id)
        .all(conn)
        .await
}

/// Delete replies together with their likes, clearing quotes that point at them.
pub(crate) async fn remove_replies<C: ConnectionTrait>(
    conn: &C,
    reply_ids: Vec<ReplyId>,
) -> Result<(), DbErr> {
    if reply_ids.is_empty() {
        return Ok(());
    }

    Reply::update_many()
        .col_expr(ReplyColumn::QuotedReplyId, Expr::value(Option::<Uuid>::None))
        .filter(ReplyColumn::QuotedReplyId.is_in(reply_ids.clone()))
        .exec(conn)
        .await?;
    ReplyLike::delete_many()
        .filter(ReplyLikeColumn::ReplyId.is_in(reply_ids.clone()))
        .exec(conn)
        .await?;
    Reply::delete_many()
        .filter(ReplyColumn::Id.is_in(reply_ids))
        .exec(conn)
        .await?;
    Ok(())
}

/// Delete posts with their replies and likes.
pub(crate) async fn remove_posts<C: ConnectionTrait>(
    conn: &C,
    post_ids: Vec<PostId>,
) -> Result<(), DbErr> {
    if post_ids.is_empty() {
        return Ok(());
    }

    let reply_ids = Reply::find()
        .select_only()
        .column(ReplyColumn::Id)
        .filter(ReplyColumn::PostId.is_in(post_ids.clone()))
        .into_tuple::<ReplyId>()
        .all(conn)
        .await?;
    remove_replies(conn, reply_ids).await?;

    Reply::update_many()
        .col_expr(ReplyColumn::QuotedPostId, Expr::value(Option::<Uuid>::None))
        .filter(ReplyColumn::QuotedPostId.is_in(post_ids.clone()))
        .exec(conn)
        .await?;
    Like::delete_many()
        .filter(LikeColumn::PostId.is_in(post_ids.clone()))
        .exec(conn)
        .await?;
    Post::delete_many()
        .filter(PostColumn::Id.is_in(post_ids))
        .exec(conn)
        .await?;
    Ok(())
}

#[derive(Clone)]
pub struct BoardService {
    db: DatabaseConnection,
}

impl BoardService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn get_user(&self, user_id: UserId) -> Result<UserModel, BoardServiceError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(BoardServiceError::UserNotFound)
    }

    pub async fn get_post(&self, post_id: PostId) -> Result<PostModel, BoardServiceError> {
        Post::find_by_id(post_id)
            .one(&self.db)
            .await?
            .ok_or(BoardServiceError::PostNotFound)
    }

    pub async fn get_reply(&self, reply_id: ReplyId) -> Result<ReplyModel, BoardServiceError> {
        Reply::find_by_id(reply_id)
            .one(&self.db)
            .await?
            .ok_or(BoardServiceError::ReplyNotFound)
    }

    /// Oldest first, 20 per page.
    pub async fn list_square(
        &self,
        search: &str,
        search_type: SearchType,
        page: u64,
        viewer: Option<UserId>,
    ) -> Result<Page<PostView>, BoardServiceError> {
        let (page, index) = page_index(page);

        let mut query = Post::find();
        let search = search.trim();
        if !search.is_empty() {
            query = match search_type {
                SearchType::User => query
                    .inner_join(User)
                    .filter(UserColumn::Username.contains(search)),
                SearchType::Content => query.filter(PostColumn::Content.contains(search)),
            };
        }

        let paginator = query
            .order_by_asc(PostColumn::DatePosted)
            .order_by_asc(PostColumn::Id)
            .paginate(&self.db, PER_PAGE);
        let totals = paginator.num_items_and_pages().await?;
        let posts = paginator.fetch_page(index).await?;

        let views = self.assemble(posts, viewer).await?;
        Ok(Page::new(views, page, PER_PAGE, totals))
    }

    /// Attach authors, like counts and replies to a batch of posts.
    async fn assemble(
        &self,
        posts: Vec<PostModel>,
        viewer: Option<UserId>,
    ) -> Result<Vec<PostView>, BoardServiceError> {
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let post_ids: Vec<PostId> = posts.iter().map(|p| p.id).collect();

        let replies = Reply::find()
            .filter(ReplyColumn::PostId.is_in(post_ids.clone()))
            .order_by_asc(ReplyColumn::DatePosted)
            .order_by_asc(ReplyColumn::Id)
            .all(&self.db)
            .await?;
        let reply_ids: Vec<ReplyId> = replies.iter().map(|r| r.id).collect();

        let cards = load_cards(
            &self.db,
            posts
                .iter()
                .map(|p| p.user_id)
                .chain(replies.iter().map(|r| r.user_id)),
        )
        .await?;

        let post_likes: HashMap<PostId, i64> = Like::find()
            .select_only()
            .column(LikeColumn::PostId)
            .column_as(Expr::col(LikeColumn::Id).count(), "count")
            .filter(LikeColumn::PostId.is_in(post_ids.clone()))
            .group_by(LikeColumn::PostId)
            .into_tuple::<(PostId, i64)>()
            .all(&self.db)
            .await?
            .into_iter()
            .collect();

        let reply_likes: HashMap<ReplyId, i64> = if reply_ids.is_empty() {
            HashMap::new()
        } else {
            ReplyLike::find()
                .select_only()
                .column(ReplyLikeColumn::ReplyId)
                .column_as(Expr::col(ReplyLikeColumn::Id).count(), "count")
                .filter(ReplyLikeColumn::ReplyId.is_in(reply_ids.clone()))
                .group_by(ReplyLikeColumn::ReplyId)
                .into_tuple::<(ReplyId, i64)>()
                .all(&self.db)
                .await?
                .into_iter()
                .collect()
        };

        let (liked_posts, liked_replies): (HashSet<PostId>, HashSet<ReplyId>) = match viewer {
            Some(viewer) => {
                let posts = Like::find()
                    .select_only()
                    .column(LikeColumn::PostId)
                    .filter(LikeColumn::UserId.eq(viewer))
                    .filter(LikeColumn::PostId.is_in(post_ids))
                    .into_tuple::<PostId>()
                    .all(&self.db)
                    .await?;
                let replies = if reply_ids.is_empty() {
                    Vec::new()
                } else {
                    ReplyLike::find()
                        .select_only()
                        .column(ReplyLikeColumn::ReplyId)
                        .filter(ReplyLikeColumn::UserId.eq(viewer))
                        .filter(ReplyLikeColumn::ReplyId.is_in(reply_ids))
                        .into_tuple::<ReplyId>()
                        .all(&self.db)
                        .await?
                };
                (posts.into_iter().collect(), replies.into_iter().collect())
            }
            None => Default::default(),
        };

        let mut threads: HashMap<PostId, Vec<ReplyView>> = HashMap::new();
        for reply in replies {
            threads.entry(reply.post_id).or_default().push(ReplyView {
                author: card_for(&cards, reply.user_id),
                like_count: reply_likes.get(&reply.id).copied().unwrap_or(0) as u64,
                liked: liked_replies.contains(&reply.id),
                reply,
            });
        }

        Ok(posts
            .into_iter()
            .map(|post| PostView {
                author: card_for(&cards, post.user_id),
                like_count: post_likes.get(&post.id).copied().unwrap_or(0) as u64,
                liked: liked_posts.contains(&post.id),
                replies: threads.remove(&post.id).unwrap_or_default(),
                post,
            })
            .collect())
    }

    pub async fn create_post(
        &self,
        user_id: UserId,
        content: &str,
        image_file: Option<String>,
    ) -> Result<PostModel, BoardServiceError> {
        let content = required("content", content)?;
        self.get_user(user_id).await?;

        let post = PostActiveModel {
            id: Set(PostId::new()),
            content: Set(content),
            image_file: Set(image_file.filter(|f| !f.trim().is_empty())),
            date_posted: Set(time::now()),
            user_id: Set(user_id),
        };

        Ok(Post::insert(post).exec_with_returning(&self.db).await?)
    }

    pub async fn toggle_post_like(
        &self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<LikeState, BoardServiceError> {
        let user = self.get_user(user_id).await?;
        let post = self.get_post(post_id).await?;

        let txn = self.db.begin().await?;
        let existing = Like::find()
            .filter(LikeColumn::UserId.eq(user_id))
            .filter(LikeColumn::PostId.eq(post_id))
            .one(&txn)
            .await?;

        let liked = match existing {
            Some(like) => {
                like.delete(&txn).await?;
                false
            }
            None => {
                let like = LikeActiveModel {
                    id: Set(LikeId::new()),
                    user_id: Set(user_id),
                    post_id: Set(post_id),
                    date_liked: Set(time::now()),
                };
                let inserted = Like::insert(like)
                    .on_conflict(
                        OnConflict::columns([LikeColumn::UserId, LikeColumn::PostId])
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(&txn)
                    .await?;

                if inserted > 0 && post.user_id != user_id {
                    notify(
                        &txn,
                        post.user_id,
                        user_id,
                        NotificationKind::LikePost,
                        format!("{} liked your post", user.username),
                        Some(post_id.into_uuid()),
                    )
                    .await?;
                }
                true
            }
        };

        let count = Like::find()
            .filter(LikeColumn::PostId.eq(post_id))
            .count(&txn)
            .await?;
        txn.commit().await?;

        Ok(LikeState { liked, count })
    }

    pub async fn toggle_reply_like(
        &self,
        user_id: UserId,
        reply_id: ReplyId,
    ) -> Result<LikeState, BoardServiceError> {
        let user = self.get_user(user_id).await?;
        let reply = self.get_reply(reply_id).await?;

        let txn = self.db.begin().await?;
        let existing = ReplyLike::find()
            .filter(ReplyLikeColumn::UserId.eq(user_id))
            .filter(ReplyLikeColumn::ReplyId.eq(reply_id))
            .one(&txn)
            .await?;

        let liked = match existing {
            Some(like) => {
                like.delete(&txn).await?;
                false
            }
            None => {
                let like = ReplyLikeActiveModel {
                    id: Set(ReplyLikeId::new()),
                    user_id: Set(user_id),
                    reply_id: Set(reply_id),
                    date_liked: Set(time::now()),
                };
                let inserted = ReplyLike::insert(like)
                    .on_conflict(
                        OnConflict::columns([ReplyLikeColumn::UserId, ReplyLikeColumn::ReplyId])
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec_without_returning(&txn)
                    .await?;

                if inserted > 0 && reply.user_id != user_id {
                    notify(
                        &txn,
                        reply.user_id,
                        user_id,
                        NotificationKind::LikeReply,
                        format!("{} liked your reply", user.username),
                        Some(reply_id.into_uuid()),
                    )
                    .await?;
                }
                true
            }
        };

        let count = ReplyLike::find()
            .filter(ReplyLikeColumn::ReplyId.eq(reply_id))
            .count(&txn)
            .await?;
        txn.commit().await?;

        Ok(LikeState { liked, count })
    }

    pub async fn reply_to_post(
        &self,
        user_id: UserId,
        post_id: PostId,
        content: &str,
        quote: Option<Quote>,
    ) -> Result<ReplyModel, BoardServiceError> {
        let content = required("content", content)?;
        let user = self.get_user(user_id).await?;
        let post = self.get_post(post_id).await?;

        let (quoted_post_id, quoted_reply) = match quote {
            Some(Quote::Post(id)) => (Some(self.get_post(id).await?.id), None),
            Some(Quote::Reply(id)) => (None, Some(self.get_reply(id).await?)),
            None => (None, None),
        };

        let txn = self.db.begin().await?;

        let reply = ReplyActiveModel {
            id: Set(ReplyId::new()),
            content: Set(content),
            date_posted: Set(time::now()),
            user_id: Set(user_id),
            post_id: Set(post_id),
            quoted_post_id: Set(quoted_post_id),
            quoted_reply_id: Set(quoted_reply.as_ref().map(|r| r.id)),
        };
        let reply = Reply::insert(reply).exec_with_returning(&txn).await?;

        if post.user_id != user_id {
            notify(
                &txn,
                post.user_id,
                user_id,
                NotificationKind::ReplyPost,
                format!("{} replied to your post", user.username),
                Some(post_id.into_uuid()),
            )
            .await?;
        }

        if let Some(quoted) = quoted_reply {
            if quoted.user_id != user_id && quoted.user_id != post.user_id {
                notify(
                    &txn,
                    quoted.user_id,
                    user_id,
                    NotificationKind::ReplyReply,
                    format!("{} replied to your comment", user.username),
                    Some(quoted.id.into_uuid()),
                )
                .await?;
            }
        }

        txn.commit().await?;
        Ok(reply)
    }

    pub async fn delete_post(
        &self,
        actor: &UserModel,
        post_id: PostId,
    ) -> Result<(), BoardServiceError> {
        let post = self.get_post(post_id).await?;
        if post.user_id != actor.id && !actor.is_admin {
            return Err(BoardServiceError::Forbidden);
        }

        let txn = self.db.begin().await?;
        remove_posts(&txn, vec![post_id]).await?;
        txn.commit().await?;

        info!(post = %post_id, actor = %actor.id, "deleted post");
        Ok(())
    }

    pub async fn delete_reply(
        &self,
        actor: &UserModel,
        reply_id: ReplyId,
    ) -> Result<(), BoardServiceError> {
        let reply = self.get_reply(reply_id).await?;
        if reply.user_id != actor.id && !actor.is_admin {
            return Err(BoardServiceError::Forbidden);
        }

        let txn = self.db.begin().await?;
        remove_replies(&txn, vec![reply_id]).await?;
        txn.commit().await?;

        info!(reply = %reply_id, actor = %actor.id, "deleted reply");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::memory_db,
        service::tests_support::{seed_admin, seed_post, seed_reply, seed_user},
    };

    async fn setup() -> (DatabaseConnection, BoardService) {
        let db = memory_db().await;
        let service = BoardService::new(db.clone());
        (db, service)
    }

    async fn kinds_for(db: &DatabaseConnection, user: UserId) -> Vec<NotificationKind> {
        Notification::find()
            .filter(NotificationColumn::UserId.eq(user))
            .order_by_asc(NotificationColumn::DateCreated)
            .order_by_asc(NotificationColumn::Id)
            .all(db)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.notification_type)
            .collect()
    }

    #[tokio::test]
    async fn test_create_post_requires_content() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;

        let post = service
            .create_post(alice.id, "  textbooks for sale ", Some(String::new()))
            .await
            .unwrap();
        assert_eq!(post.content, "textbooks for sale");
        assert_eq!(post.image_file, None);

        assert!(matches!(
            service.create_post(alice.id, "   ", None).await,
            Err(BoardServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_like_toggle_notifies_once() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let post = seed_post(&db, alice.id, "hello").await;

        let state = service.toggle_post_like(bob.id, post.id).await.unwrap();
        assert_eq!(state, LikeState { liked: true, count: 1 });

        let state = service.toggle_post_like(bob.id, post.id).await.unwrap();
        assert_eq!(state, LikeState { liked: false, count: 0 });
        assert_eq!(Like::find().count(&db).await.unwrap(), 0);

        assert_eq!(kinds_for(&db, alice.id).await, vec![NotificationKind::LikePost]);

        // liking your own post stays quiet
        service.toggle_post_like(alice.id, post.id).await.unwrap();
        assert_eq!(kinds_for(&db, alice.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_reply_like_toggle() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let post = seed_post(&db, alice.id, "hello").await;
        let reply = seed_reply(&db, bob.id, post.id, "hi").await;

        let state = service.toggle_reply_like(alice.id, reply.id).await.unwrap();
        assert!(state.liked);
        assert_eq!(kinds_for(&db, bob.id).await, vec![NotificationKind::LikeReply]);

        let state = service.toggle_reply_like(alice.id, reply.id).await.unwrap();
        assert!(!state.liked);
        assert_eq!(state.count, 0);
    }

    #[tokio::test]
    async fn test_reply_notification_rules() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let carol = seed_user(&db, "carol").await;
        let post = seed_post(&db, alice.id, "lost keys").await;

        let bobs = service
            .reply_to_post(bob.id, post.id, "which building?", None)
            .await
            .unwrap();
        assert_eq!(kinds_for(&db, alice.id).await, vec![NotificationKind::ReplyPost]);

        // carol quotes bob: alice gets reply_post, bob gets reply_reply
        let carols = service
            .reply_to_post(carol.id, post.id, "library", Some(Quote::Reply(bobs.id)))
            .await
            .unwrap();
        assert_eq!(carols.quoted_reply_id, Some(bobs.id));
        assert_eq!(kinds_for(&db, alice.id).await.len(), 2);
        assert_eq!(kinds_for(&db, bob.id).await, vec![NotificationKind::ReplyReply]);

        // alice quoting bob on her own post: only bob hears about it
        service
            .reply_to_post(alice.id, post.id, "thanks", Some(Quote::Reply(bobs.id)))
            .await
            .unwrap();
        assert_eq!(kinds_for(&db, alice.id).await.len(), 2);
        assert_eq!(kinds_for(&db, bob.id).await.len(), 2);

        assert!(matches!(
            service
                .reply_to_post(bob.id, post.id, "x", Some(Quote::Reply(ReplyId::new())))
                .await,
            Err(BoardServiceError::ReplyNotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_post_cascades() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let post = seed_post(&db, alice.id, "first").await;
        let other = seed_post(&db, bob.id, "second").await;
        let reply = seed_reply(&db, bob.id, post.id, "reply").await;
        service.toggle_post_like(bob.id, post.id).await.unwrap();
        service.toggle_reply_like(alice.id, reply.id).await.unwrap();

        // a reply elsewhere quoting the doomed post survives with the quote cleared
        let quoting = service
            .reply_to_post(alice.id, other.id, "see above", Some(Quote::Post(post.id)))
            .await
            .unwrap();

        assert!(matches!(
            service.delete_post(&bob, post.id).await,
            Err(BoardServiceError::Forbidden)
        ));
        service.delete_post(&alice, post.id).await.unwrap();

        assert!(Post::find_by_id(post.id).one(&db).await.unwrap().is_none());
        assert!(Reply::find_by_id(reply.id).one(&db).await.unwrap().is_none());
        assert_eq!(Like::find().count(&db).await.unwrap(), 0);
        assert_eq!(ReplyLike::find().count(&db).await.unwrap(), 0);

        let quoting = Reply::find_by_id(quoting.id).one(&db).await.unwrap().unwrap();
        assert_eq!(quoting.quoted_post_id, None);
    }

    #[tokio::test]
    async fn test_admin_can_delete_any_reply() {
        let (db, service) = setup().await;
        let admin = seed_admin(&db, "root").await;
        let alice = seed_user(&db, "alice").await;
        let post = seed_post(&db, alice.id, "first").await;
        let reply = seed_reply(&db, alice.id, post.id, "bump").await;
        service.toggle_reply_like(admin.id, reply.id).await.unwrap();

        service.delete_reply(&admin, reply.id).await.unwrap();
        assert_eq!(Reply::find().count(&db).await.unwrap(), 0);
        assert_eq!(ReplyLike::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_square_search_and_views() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let first = seed_post(&db, alice.id, "Selling a bike").await;
        seed_post(&db, bob.id, "Need a desk").await;
        seed_reply(&db, bob.id, first.id, "price?").await;
        service.toggle_post_like(bob.id, first.id).await.unwrap();

        let page = service
            .list_square("", SearchType::Content, 1, Some(bob.id))
            .await
            .unwrap();
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].post.id, first.id);
        assert_eq!(page.items[0].author.username, "alice");
        assert_eq!(page.items[0].like_count, 1);
        assert!(page.items[0].liked);
        assert_eq!(page.items[0].replies.len(), 1);
        assert_eq!(page.items[0].replies[0].author.username, "bob");
        assert!(page.items[1].replies.is_empty());

        let by_content = service
            .list_square("bike", SearchType::Content, 1, None)
            .await
            .unwrap();
        assert_eq!(by_content.total_items, 1);
        assert!(!by_content.items[0].liked);

        let by_user = service
            .list_square("BO", SearchType::User, 1, None)
            .await
            .unwrap();
        assert_eq!(by_user.total_items, 1);
        assert_eq!(by_user.items[0].author.username, "bob");
    }

    #[tokio::test]
    async fn test_square_pages_hold_twenty_posts() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        for i in 0..25 {
            seed_post(&db, alice.id, &format!("post {i}")).await;
        }

        let first = service.list_square("", SearchType::Content, 1, None).await.unwrap();
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.total_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let second = service.list_square("", SearchType::Content, 2, None).await.unwrap();
        assert_eq!(second.items.len(), 5);
        assert!(!second.has_next);
        assert!(second.has_prev);
    }

    #[test]
    fn reply_form_quote_parsing() {
        let id = Uuid::now_v7();
        let form = ReplyForm {
            content: "x".into(),
            quoted_id: Some(id),
            quoted_type: Some("reply".into()),
        };
        assert_eq!(form.quote(), Some(Quote::Reply(id.into())));

        let form = ReplyForm {
            quoted_type: Some("banana".into()),
            ..form
        };
        assert_eq!(form.quote(), None);
        assert_eq!(SearchType::from("user"), SearchType::User);
        assert_eq!(SearchType::from("anything"), SearchType::Content);
    }
}
