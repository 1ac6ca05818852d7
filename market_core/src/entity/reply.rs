use crate::ids::{PostId, ReplyId, UserId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reply")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: ReplyId,
    pub content: String,
    pub date_posted: String,
    pub user_id: UserId,
    pub post_id: PostId,
    /// Post this reply quotes, cleared if that post goes away.
    pub quoted_post_id: Option<PostId>,
    /// Reply this reply quotes, cleared if that reply goes away.
    pub quoted_reply_id: Option<ReplyId>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id"
    )]
    Post,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::reply_like::Entity")]
    ReplyLike,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::reply_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReplyLike.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
