// SeaORM entities, one module per table.

pub mod comment;
pub mod follow;
pub mod item;
pub mod like;
pub mod message;
pub mod notification;
pub mod post;
pub mod reply;
pub mod reply_like;
pub mod request;
pub mod session;
pub mod stock;
pub mod user;
pub mod user_follow;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use super::comment::{
        ActiveModel as CommentActiveModel, Column as CommentColumn, Entity as Comment,
        Model as CommentModel,
    };
    pub use super::follow::{
        ActiveModel as FollowActiveModel, Column as FollowColumn, Entity as Follow,
        Model as FollowModel,
    };
    pub use super::item::{
        ActiveModel as ItemActiveModel, Column as ItemColumn, Entity as Item, Model as ItemModel,
    };
    pub use super::like::{
        ActiveModel as LikeActiveModel, Column as LikeColumn, Entity as Like, Model as LikeModel,
    };
    pub use super::message::{
        ActiveModel as MessageActiveModel, Column as MessageColumn, Entity as Message,
        Model as MessageModel,
    };
    pub use super::notification::{
        ActiveModel as NotificationActiveModel, Column as NotificationColumn,
        Entity as Notification, Model as NotificationModel, NotificationKind,
    };
    pub use super::post::{
        ActiveModel as PostActiveModel, Column as PostColumn, Entity as Post, Model as PostModel,
    };
    pub use super::reply::{
        ActiveModel as ReplyActiveModel, Column as ReplyColumn, Entity as Reply,
        Model as ReplyModel,
    };
    pub use super::reply_like::{
        ActiveModel as ReplyLikeActiveModel, Column as ReplyLikeColumn, Entity as ReplyLike,
        Model as ReplyLikeModel,
    };
    pub use super::request::{
        ActiveModel as RequestActiveModel, Column as RequestColumn, Entity as Request,
        Model as RequestModel,
    };
    pub use super::session::{
        ActiveModel as SessionActiveModel, Column as SessionColumn, Entity as Session,
        Model as SessionModel,
    };
    pub use super::stock::{
        ActiveModel as StockActiveModel, Column as StockColumn, Entity as Stock,
        Model as StockModel,
    };
    pub use super::user::{
        ActiveModel as UserActiveModel, Column as UserColumn, Entity as User, Model as UserModel,
    };
    pub use super::user_follow::{
        ActiveModel as UserFollowActiveModel, Column as UserFollowColumn, Entity as UserFollow,
        Model as UserFollowModel,
    };

    // Re-export commonly used SeaORM types and traits
    pub use sea_orm::{
        ActiveModelTrait,
        ActiveValue,

        ColumnTrait,
        Condition,
        ConnectionTrait,

        // Database and connection types
        Database,
        DatabaseConnection,
        DatabaseTransaction,
        DbConn,
        // Common result types
        DbErr,

        // Core traits
        EntityTrait,
        ItemsAndPagesNumber,
        ModelTrait,
        NotSet,
        // Pagination
        PaginatorTrait,
        QueryFilter,
        QueryOrder,
        QuerySelect,
        Related,
        RelationTrait,
        // Active model helpers
        Set,
        TransactionTrait,
        Unchanged,
    };
}
