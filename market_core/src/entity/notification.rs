use crate::ids::{NotificationId, UserId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What happened. Stored as its snake_case name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[sea_orm(string_value = "follow_user")]
    FollowUser,
    #[sea_orm(string_value = "follow_item")]
    FollowItem,
    #[sea_orm(string_value = "reply_post")]
    ReplyPost,
    #[sea_orm(string_value = "reply_reply")]
    ReplyReply,
    #[sea_orm(string_value = "like_post")]
    LikePost,
    #[sea_orm(string_value = "like_reply")]
    LikeReply,
    #[sea_orm(string_value = "purchase")]
    Purchase,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    pub sender_id: UserId,
    pub notification_type: NotificationKind,
    pub content: String,
    pub is_read: bool,
    pub date_created: String,
    /// Id of the item, post, reply or user the event concerns.
    pub related_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Recipient,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SenderId",
        to = "super::user::Column::Id"
    )]
    Sender,
}

impl ActiveModelBehavior for ActiveModel {}
