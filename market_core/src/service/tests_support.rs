//! Row fixtures shared by the service tests.

use crate::{
    entity::{item::DEFAULT_IMAGE, prelude::*, user::DEFAULT_AVATAR},
    ids::{ItemId, PostId, ReplyId, StockId, UserId},
    service::password::hash_password,
    time,
};

/// Inserts `<name>` with email `<name>@campus.test` and password `password`.
pub async fn seed_user<C: ConnectionTrait>(db: &C, name: &str) -> UserModel {
    User::insert(UserActiveModel {
        id: Set(UserId::new()),
        username: Set(name.to_string()),
        email: Set(format!("{name}@campus.test")),
        password: Set(hash_password("password")),
        contact: Set(format!("{name}-wechat")),
        avatar: Set(DEFAULT_AVATAR.to_string()),
        is_admin: Set(false),
        sales_count: Set(0),
        date_joined: Set(time::now()),
    })
    .exec_with_returning(db)
    .await
    .unwrap()
}

pub async fn seed_admin<C: ConnectionTrait>(db: &C, name: &str) -> UserModel {
    let user = seed_user(db, name).await;
    let mut active: UserActiveModel = user.into();
    active.is_admin = Set(true);
    active.update(db).await.unwrap()
}

pub async fn seed_item<C: ConnectionTrait>(
    db: &C,
    seller: UserId,
    title: &str,
    price: f64,
    stock: i32,
) -> ItemModel {
    Item::insert(ItemActiveModel {
        id: Set(ItemId::new()),
        title: Set(title.to_string()),
        price: Set(price),
        description: Set(format!("a {title}")),
        image_file: Set(DEFAULT_IMAGE.to_string()),
        stock: Set(stock),
        views: Set(0),
        sales_count: Set(0),
        date_posted: Set(time::now()),
        user_id: Set(seller),
    })
    .exec_with_returning(db)
    .await
    .unwrap()
}

pub async fn seed_stock<C: ConnectionTrait>(
    db: &C,
    owner: UserId,
    name: &str,
    quantity: i32,
) -> StockModel {
    Stock::insert(StockActiveModel {
        id: Set(StockId::new()),
        name: Set(name.to_string()),
        quantity: Set(quantity),
        description: Set(Some(format!("spare {name}"))),
        image_file: Set(DEFAULT_IMAGE.to_string()),
        date_added: Set(time::now()),
        user_id: Set(owner),
    })
    .exec_with_returning(db)
    .await
    .unwrap()
}

pub async fn seed_post<C: ConnectionTrait>(db: &C, author: UserId, content: &str) -> PostModel {
    Post::insert(PostActiveModel {
        id: Set(PostId::new()),
        content: Set(content.to_string()),
        image_file: Set(None),
        date_posted: Set(time::now()),
        user_id: Set(author),
    })
    .exec_with_returning(db)
    .await
    .unwrap()
}

pub async fn seed_reply<C: ConnectionTrait>(
    db: &C,
    author: UserId,
    post: PostId,
    content: &str,
) -> ReplyModel {
    Reply::insert(ReplyActiveModel {
        id: Set(ReplyId::new()),
        content: Set(content.to_string()),
        date_posted: Set(time::now()),
        user_id: Set(author),
        post_id: Set(post),
        quoted_post_id: Set(None),
        quoted_reply_id: Set(None),
    })
    .exec_with_returning(db)
    .await
    .unwrap()
}
