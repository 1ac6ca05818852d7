use sea_orm::sea_query::Expr;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    entity::prelude::*,
    ids::{NotificationId, ReplyId, UserId},
    service::{card_for, load_cards, page_index, Page, UserCard},
    time,
};

pub const PER_PAGE: u64 = 20;

#[derive(Debug, Error)]
pub enum NotificationsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("notification not found")]
    NotificationNotFound,

    #[error("the reply this notification points at no longer exists")]
    ReplyNotFound,

    #[error("forbidden: not the recipient")]
    Forbidden,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: NotificationModel,
    pub sender: UserCard,
}

/// Record an event for `recipient`. Takes any connection so callers can
/// emit inside their own transaction.
pub async fn notify<C: ConnectionTrait>(
    conn: &C,
    recipient: UserId,
    sender: UserId,
    kind: NotificationKind,
    content: String,
    related_id: Option<Uuid>,
) -> Result<NotificationModel, DbErr> {
    debug!(%recipient, %sender, ?kind, "notify");

    let notification = NotificationActiveModel {
        id: Set(NotificationId::new()),
        user_id: Set(recipient),
        sender_id: Set(sender),
        notification_type: Set(kind),
        content: Set(content),
        is_read: Set(false),
        date_created: Set(time::now()),
        related_id: Set(related_id),
    };

    Notification::insert(notification)
        .exec_with_returning(conn)
        .await
}

#[derive(Clone)]
pub struct NotificationsService {
    db: DatabaseConnection,
}

impl NotificationsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Newest first.
    pub async fn list(
        &self,
        user_id: UserId,
        page: u64,
    ) -> Result<Page<NotificationView>, NotificationsServiceError> {
        let (page, index) = page_index(page);
        let paginator = Notification::find()
            .filter(NotificationColumn::UserId.eq(user_id))
            .order_by_desc(NotificationColumn::DateCreated)
            .order_by_desc(NotificationColumn::Id)
            .paginate(&self.db, PER_PAGE);

        let totals = paginator.num_items_and_pages().await?;
        let notifications = paginator.fetch_page(index).await?;

        let cards = load_cards(&self.db, notifications.iter().map(|n| n.sender_id)).await?;
        let views = notifications
            .into_iter()
            .map(|notification| NotificationView {
                sender: card_for(&cards, notification.sender_id),
                notification,
            })
            .collect();

        Ok(Page::new(views, page, PER_PAGE, totals))
    }

    /// Mark the notification read and resolve the path it points at.
    pub async fn open(
        &self,
        user_id: UserId,
        notification_id: NotificationId,
    ) -> Result<String, NotificationsServiceError> {
        let notification = Notification::find_by_id(notification_id)
            .one(&self.db)
            .await?
            .ok_or(NotificationsServiceError::NotificationNotFound)?;

        if notification.user_id != user_id {
            return Err(NotificationsServiceError::Forbidden);
        }

        let kind = notification.notification_type;
        let related = notification.related_id;

        if !notification.is_read {
            let mut active: NotificationActiveModel = notification.into();
            active.is_read = Set(true);
            active.update(&self.db).await?;
        }

        let Some(related) = related else {
            return Ok("/notifications".to_string());
        };

        let target = match kind {
            NotificationKind::FollowUser => format!("/user/{related}/profile"),
            NotificationKind::FollowItem | NotificationKind::Purchase => {
                format!("/item/{related}")
            }
            NotificationKind::ReplyPost | NotificationKind::LikePost => {
                format!("/square#post-{related}")
            }
            NotificationKind::ReplyReply | NotificationKind::LikeReply => {
                let reply = Reply::find_by_id(ReplyId::from_uuid(related))
                    .one(&self.db)
                    .await?
                    .ok_or(NotificationsServiceError::ReplyNotFound)?;
                format!("/square#post-{}", reply.post_id)
            }
        };

        Ok(target)
    }

    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64, NotificationsServiceError> {
        let result = Notification::update_many()
            .col_expr(NotificationColumn::IsRead, Expr::value(true))
            .filter(NotificationColumn::UserId.eq(user_id))
            .filter(NotificationColumn::IsRead.eq(false))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    pub async fn unread_count(&self, user_id: UserId) -> Result<u64, NotificationsServiceError> {
        let count = Notification::find()
            .filter(NotificationColumn::UserId.eq(user_id))
            .filter(NotificationColumn::IsRead.eq(false))
            .count(&self.db)
            .await?;

        Ok(count)
    }
}
