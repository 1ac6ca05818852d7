use std::collections::HashMap;

use sea_orm::sea_query::{Expr, OnConflict};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    entity::{item::DEFAULT_IMAGE, prelude::*},
    error::{positive_price, positive_quantity, required, ValidationError},
    ids::{CommentId, FollowId, ItemId, StockId, UserId},
    service::{
        card_for, load_cards, messages, notifications::notify, page_index, Page, UserCard,
    },
    time,
};

pub const PER_PAGE: u64 = 12;

#[derive(Debug, Error)]
pub enum ItemsServiceError {
    #[error("fatal database error")]
    DbError(#[from] DbErr),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("item not found")]
    ItemNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("stock entry not found")]
    StockNotFound,

    #[error("comment not found")]
    CommentNotFound,

    #[error("forbidden: not the owner")]
    Forbidden,

    #[error("you cannot do that with your own item")]
    OwnItem,

    #[error("only {available} left in stock")]
    InsufficientStock { available: i32 },

    #[error("you cannot message yourself")]
    SelfMessage,
}

/// Market ordering. Unknown values fall back to `Latest`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSort {
    #[default]
    Latest,
    MostFollowed,
    MostViewed,
    PriceAsc,
    PriceDesc,
}

impl From<&str> for MarketSort {
    fn from(value: &str) -> Self {
        match value {
            "most_followed" => MarketSort::MostFollowed,
            "most_viewed" => MarketSort::MostViewed,
            "price_asc" => MarketSort::PriceAsc,
            "price_desc" => MarketSort::PriceDesc,
            _ => MarketSort::Latest,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemForm {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub stock: i32,
    #[serde(default)]
    pub image_file: Option<String>,
}

/// List part of a stock entry on the market.
#[derive(Debug, Clone, Deserialize)]
pub struct StockListingForm {
    pub stock_id: StockId,
    #[serde(default = "default_listing_quantity")]
    pub stock_quantity: i32,
    #[serde(default = "default_listing_price")]
    pub stock_price: f64,
    /// HTML checkbox: present as `"on"` when ticked.
    #[serde(default)]
    pub use_stock_description: Option<String>,
}

fn default_listing_quantity() -> i32 {
    1
}

fn default_listing_price() -> f64 {
    0.01
}

impl StockListingForm {
    pub fn uses_description(&self) -> bool {
        self.use_stock_description.as_deref() == Some("on")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemCard {
    #[serde(flatten)]
    pub item: ItemModel,
    pub seller: UserCard,
    pub follower_count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: CommentModel,
    pub author: UserCard,
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: ItemModel,
    pub seller: UserCard,
    pub seller_contact: String,
    pub follower_count: u64,
    pub following: bool,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Purchase {
    pub item: ItemModel,
    /// The buyer's inventory row after the purchase landed in it.
    pub stock: StockModel,
}

pub(crate) async fn items_by_user<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
) -> Result<Vec<ItemModel>, DbErr> {
    Item::find()
        .filter(ItemColumn::UserId.eq(user_id))
        .order_by_desc(ItemColumn::DatePosted)
        .order_by_desc(ItemColumn::Id)
        .all(conn)
        .await
}

/// Most recently followed first.
pub(crate) async fn followed_items<C: ConnectionTrait>(
    conn: &C,
    user_id: UserId,
) -> Result<Vec<ItemModel>, DbErr> {
    Item::find()
        .inner_join(Follow)
        .filter(FollowColumn::UserId.eq(user_id))
        .order_by_desc(FollowColumn::DateFollowed)
        .order_by_desc(FollowColumn::Id)
        .all(conn)
        .await
}

/// Delete items together with their follows and comments.
pub(crate) async fn remove_items<C: ConnectionTrait>(
    conn: &C,
    item_ids: Vec<ItemId>,
) -> Result<(), DbErr> {
    if item_ids.is_empty() {
        return Ok(());
    }

    Follow::delete_many()
        .filter(FollowColumn::ItemId.is_in(item_ids.clone()))
        .exec(conn)
        .await?;
    Comment::delete_many()
        .filter(CommentColumn::ItemId.is_in(item_ids.clone()))
        .exec(conn)
        .await?;
    Item::delete_many()
        .filter(ItemColumn::Id.is_in(item_ids))
        .exec(conn)
        .await?;
    Ok(())
}

async fn follower_counts<C: ConnectionTrait>(
    conn: &C,
    item_ids: Vec<ItemId>,
) -> Result<HashMap<ItemId, u64>, DbErr> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = Follow::find()
        .select_only()
        .column(FollowColumn::ItemId)
        .column_as(Expr::col(FollowColumn::Id).count(), "count")
        .filter(FollowColumn::ItemId.is_in(item_ids))
        .group_by(FollowColumn::ItemId)
        .into_tuple::<(ItemId, i64)>()
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(id, count)| (id, count.max(0) as u64))
        .collect())
}

fn validate_item(form: &ItemForm) -> Result<(String, String, f64, i32), ValidationError> {
    Ok((
        required("title", &form.title)?,
        required("description", &form.description)?,
        positive_price(form.price)?,
        positive_quantity("stock", form.stock)?,
    ))
}

fn image_or_default(image_file: Option<&str>) -> String {
    match image_file.map(str::trim) {
        Some(file) if !file.is_empty() => file.to_string(),
        _ => DEFAULT_IMAGE.to_string(),
    }
}

#[derive(Clone)]
pub struct ItemsService {
    db: DatabaseConnection,
}

impl ItemsService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn get_user(&self, user_id: UserId) -> Result<UserModel, ItemsServiceError> {
        User::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(ItemsServiceError::UserNotFound)
    }

    pub async fn get_item(&self, item_id: ItemId) -> Result<ItemModel, ItemsServiceError> {
        Item::find_by_id(item_id)
            .one(&self.db)
            .await?
            .ok_or(ItemsServiceError::ItemNotFound)
    }

    async fn cards(&self, items: Vec<ItemModel>) -> Result<Vec<ItemCard>, ItemsServiceError> {
        let sellers = load_cards(&self.db, items.iter().map(|i| i.user_id)).await?;
        let counts = follower_counts(&self.db, items.iter().map(|i| i.id).collect()).await?;

        Ok(items
            .into_iter()
            .map(|item| ItemCard {
                seller: card_for(&sellers, item.user_id),
                follower_count: counts.get(&item.id).copied().unwrap_or(0),
                item,
            })
            .collect())
    }

    /// Market listing, 12 per page. `search` matches title or description.
    pub async fn list_market(
        &self,
        search: &str,
        sort: MarketSort,
        page: u64,
    ) -> Result<Page<ItemCard>, ItemsServiceError> {
        let (page, index) = page_index(page);

        let mut query = Item::find();
        let search = search.trim();
        if !search.is_empty() {
            query = query.filter(
                Condition::any()
                    .add(ItemColumn::Title.contains(search))
                    .add(ItemColumn::Description.contains(search)),
            );
        }

        query = match sort {
            MarketSort::Latest => query.order_by_desc(ItemColumn::DatePosted),
            MarketSort::MostViewed => query.order_by_desc(ItemColumn::Views),
            MarketSort::PriceAsc => query.order_by_asc(ItemColumn::Price),
            MarketSort::PriceDesc => query.order_by_desc(ItemColumn::Price),
            MarketSort::MostFollowed => query
                .left_join(Follow)
                .group_by(ItemColumn::Id)
                .order_by_desc(Expr::col((Follow, FollowColumn::Id)).count()),
        };
        // stable tie-break, newest first
        query = query.order_by_desc(ItemColumn::Id);

        let paginator = query.paginate(&self.db, PER_PAGE);
        let totals = paginator.num_items_and_pages().await?;
        let items = paginator.fetch_page(index).await?;

        let cards = self.cards(items).await?;
        Ok(Page::new(cards, page, PER_PAGE, totals))
    }

    pub async fn create_item(
        &self,
        seller_id: UserId,
        form: ItemForm,
    ) -> Result<ItemModel, ItemsServiceError> {
        let (title, description, price, stock) = validate_item(&form)?;
        self.get_user(seller_id).await?;

        let item = ItemActiveModel {
            id: Set(ItemId::new()),
            title: Set(title),
            price: Set(price),
            description: Set(description),
            image_file: Set(image_or_default(form.image_file.as_deref())),
            stock: Set(stock),
            views: Set(0),
            sales_count: Set(0),
            date_posted: Set(time::now()),
            user_id: Set(seller_id),
        };

        let item = Item::insert(item).exec_with_returning(&self.db).await?;
        info!(item = %item.id, seller = %seller_id, "listed item");
        Ok(item)
    }

    /// Move `stock_quantity` units of a stock entry onto the market.
    pub async fn create_from_stock(
        &self,
        seller_id: UserId,
        form: StockListingForm,
    ) -> Result<ItemModel, ItemsServiceError> {
        let stock = Stock::find_by_id(form.stock_id)
            .one(&self.db)
            .await?
            .ok_or(ItemsServiceError::StockNotFound)?;

        if stock.user_id != seller_id {
            return Err(ItemsServiceError::Forbidden);
        }

        let quantity = positive_quantity("quantity", form.stock_quantity)?;
        if quantity > stock.quantity {
            return Err(ItemsServiceError::InsufficientStock {
                available: stock.quantity,
            });
        }
        let price = positive_price(form.stock_price)?;

        let description = if form.uses_description() {
            stock.description.clone().unwrap_or_default()
        } else {
            String::new()
        };

        let txn = self.db.begin().await?;

        let item = ItemActiveModel {
            id: Set(ItemId::new()),
            title: Set(stock.name.clone()),
            price: Set(price),
            description: Set(description),
            image_file: Set(stock.image_file.clone()),
            stock: Set(quantity),
            views: Set(0),
            sales_count: Set(0),
            date_posted: Set(time::now()),
            user_id: Set(seller_id),
        };
        let item = Item::insert(item).exec_with_returning(&txn).await?;

        let remaining = stock.quantity - quantity;
        if remaining == 0 {
            stock.delete(&txn).await?;
        } else {
            let mut active: StockActiveModel = stock.into();
            active.quantity = Set(remaining);
            active.update(&txn).await?;
        }

        txn.commit().await?;
        info!(item = %item.id, seller = %seller_id, quantity, "listed item from stock");
        Ok(item)
    }

    /// Count a view and return the item.
    pub async fn view_item(&self, item_id: ItemId) -> Result<ItemModel, ItemsServiceError> {
        let result = Item::update_many()
            .col_expr(ItemColumn::Views, Expr::col(ItemColumn::Views).add(1))
            .filter(ItemColumn::Id.eq(item_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ItemsServiceError::ItemNotFound);
        }
        self.get_item(item_id).await
    }

    /// Detail page payload. Counts as a view.
    pub async fn item_detail(
        &self,
        item_id: ItemId,
        viewer: Option<UserId>,
    ) -> Result<ItemDetail, ItemsServiceError> {
        let item = self.view_item(item_id).await?;
        let seller = User::find_by_id(item.user_id).one(&self.db).await?;

        let follower_count = Follow::find()
            .filter(FollowColumn::ItemId.eq(item_id))
            .count(&self.db)
            .await?;

        let following = match viewer {
            Some(viewer) => Follow::find()
                .filter(FollowColumn::ItemId.eq(item_id))
                .filter(FollowColumn::UserId.eq(viewer))
                .one(&self.db)
                .await?
                .is_some(),
            None => false,
        };

        let comments = Comment::find()
            .filter(CommentColumn::ItemId.eq(item_id))
            .order_by_asc(CommentColumn::DatePosted)
            .order_by_asc(CommentColumn::Id)
            .all(&self.db)
            .await?;
        let authors = load_cards(&self.db, comments.iter().map(|c| c.user_id)).await?;
        let comments = comments
            .into_iter()
            .map(|comment| CommentView {
                author: card_for(&authors, comment.user_id),
                comment,
            })
            .collect();

        Ok(ItemDetail {
            seller: seller
                .as_ref()
                .map(UserCard::from)
                .unwrap_or_else(|| UserCard::missing(item.user_id)),
            seller_contact: seller.map(|s| s.contact).unwrap_or_default(),
            follower_count,
            following,
            comments,
            item,
        })
    }

    pub async fn update_item(
        &self,
        owner_id: UserId,
        item_id: ItemId,
        form: ItemForm,
    ) -> Result<ItemModel, ItemsServiceError> {
        let item = self.get_item(item_id).await?;
        if item.user_id != owner_id {
            return Err(ItemsServiceError::Forbidden);
        }
        let (title, description, price, stock) = validate_item(&form)?;

        let mut active: ItemActiveModel = item.into();
        active.title = Set(title);
        active.description = Set(description);
        active.price = Set(price);
        active.stock = Set(stock);
        if let Some(file) = form.image_file.as_deref().filter(|f| !f.trim().is_empty()) {
            active.image_file = Set(file.trim().to_string());
        }

        Ok(active.update(&self.db).await?)
    }

    pub async fn delete_item(
        &self,
        actor: &UserModel,
        item_id: ItemId,
    ) -> Result<(), ItemsServiceError> {
        let item = self.get_item(item_id).await?;
        if item.user_id != actor.id && !actor.is_admin {
            return Err(ItemsServiceError::Forbidden);
        }

        let txn = self.db.begin().await?;
        remove_items(&txn, vec![item_id]).await?;
        txn.commit().await?;

        info!(item = %item_id, actor = %actor.id, "deleted item");
        Ok(())
    }

    /// Returns `true` when a new follow was recorded.
    pub async fn follow_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<bool, ItemsServiceError> {
        let user = self.get_user(user_id).await?;
        let item = self.get_item(item_id).await?;
        if item.user_id == user_id {
            return Err(ItemsServiceError::OwnItem);
        }

        let txn = self.db.begin().await?;
        let follow = FollowActiveModel {
            id: Set(FollowId::new()),
            user_id: Set(user_id),
            item_id: Set(item_id),
            date_followed: Set(time::now()),
        };
        let inserted = Follow::insert(follow)
            .on_conflict(
                OnConflict::columns([FollowColumn::UserId, FollowColumn::ItemId])
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
            item.user_id,
            user_id,
            NotificationKind::FollowItem,
            format!("{} followed your item \"{}\"", user.username, item.title),
            Some(item_id.into_uuid()),
        )
        .await?;

        txn.commit().await?;
        Ok(true)
    }

    /// Returns `true` when a follow was removed.
    pub async fn unfollow_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> Result<bool, ItemsServiceError> {
        self.get_item(item_id).await?;
        let result = Follow::delete_many()
            .filter(FollowColumn::UserId.eq(user_id))
            .filter(FollowColumn::ItemId.eq(item_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn buy_item(
        &self,
        buyer_id: UserId,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<Purchase, ItemsServiceError> {
        let buyer = self.get_user(buyer_id).await?;
        let item = self.get_item(item_id).await?;
        if item.user_id == buyer_id {
            return Err(ItemsServiceError::OwnItem);
        }
        let quantity = positive_quantity("quantity", quantity)?;
        if quantity > item.stock {
            return Err(ItemsServiceError::InsufficientStock {
                available: item.stock,
            });
        }

        let txn = self.db.begin().await?;

        // guarded decrement, so a concurrent buyer cannot oversell
        let result = Item::update_many()
            .col_expr(ItemColumn::Stock, Expr::col(ItemColumn::Stock).sub(quantity))
            .col_expr(
                ItemColumn::SalesCount,
                Expr::col(ItemColumn::SalesCount).add(quantity),
            )
            .filter(ItemColumn::Id.eq(item_id))
            .filter(ItemColumn::Stock.gte(quantity))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            let available = Item::find_by_id(item_id)
                .one(&txn)
                .await?
                .map(|i| i.stock)
                .unwrap_or(0);
            return Err(ItemsServiceError::InsufficientStock { available });
        }

        User::update_many()
            .col_expr(
                UserColumn::SalesCount,
                Expr::col(UserColumn::SalesCount).add(quantity),
            )
            .filter(UserColumn::Id.eq(item.user_id))
            .exec(&txn)
            .await?;

        let existing = Stock::find()
            .filter(StockColumn::UserId.eq(buyer_id))
            .filter(StockColumn::Name.eq(item.title.as_str()))
            .one(&txn)
            .await?;
        let stock = match existing {
            Some(stock) => {
                let total = stock.quantity + quantity;
                let mut active: StockActiveModel = stock.into();
                active.quantity = Set(total);
                active.update(&txn).await?
            }
            None => {
                let stock = StockActiveModel {
                    id: Set(StockId::new()),
                    name: Set(item.title.clone()),
                    quantity: Set(quantity),
                    description: Set(Some(item.description.clone())),
                    image_file: Set(item.image_file.clone()),
                    date_added: Set(time::now()),
                    user_id: Set(buyer_id),
                };
                Stock::insert(stock).exec_with_returning(&txn).await?
            }
        };

        notify(
            &txn,
            item.user_id,
            buyer_id,
            NotificationKind::Purchase,
            format!("{} bought {} x \"{}\"", buyer.username, quantity, item.title),
            Some(item_id.into_uuid()),
        )
        .await?;

        let item = Item::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or(ItemsServiceError::ItemNotFound)?;

        txn.commit().await?;
        info!(item = %item_id, buyer = %buyer_id, quantity, "purchase");
        Ok(Purchase { item, stock })
    }

    /// Share an item summary as a direct message. `host_url` is the site root.
    pub async fn forward_to_message(
        &self,
        sender_id: UserId,
        item_id: ItemId,
        receiver_id: UserId,
        host_url: &str,
    ) -> Result<MessageModel, ItemsServiceError> {
        let item = self.get_item(item_id).await?;
        if sender_id == receiver_id {
            return Err(ItemsServiceError::SelfMessage);
        }
        self.get_user(receiver_id).await?;

        let seller = User::find_by_id(item.user_id)
            .one(&self.db)
            .await?
            .map(|s| s.username)
            .unwrap_or_default();
        let followers = Follow::find()
            .filter(FollowColumn::ItemId.eq(item_id))
            .count(&self.db)
            .await?;

        let host = host_url.trim_end_matches('/');
        let content = format!(
            "[Shared item]\nTitle: {}\nPrice: ¥{:.2}\nLink: {}/item/{}\nSeller: {}\nStock: {}\nViews: {}\nFollowers: {}\n\n{}",
            item.title, item.price, host, item.id, seller, item.stock, item.views, followers, item.description
        );

        Ok(messages::insert_message(&self.db, sender_id, receiver_id, content).await?)
    }

    pub async fn add_comment(
        &self,
        user_id: UserId,
        item_id: ItemId,
        content: &str,
    ) -> Result<CommentModel, ItemsServiceError> {
        let content = required("comment", content)?;
        self.get_user(user_id).await?;
        self.get_item(item_id).await?;

        let comment = CommentActiveModel {
            id: Set(CommentId::new()),
            content: Set(content),
            date_posted: Set(time::now()),
            user_id: Set(user_id),
            item_id: Set(item_id),
        };
        Ok(Comment::insert(comment).exec_with_returning(&self.db).await?)
    }

    /// Author or admin. Returns the item the comment was on.
    pub async fn delete_comment(
        &self,
        actor: &UserModel,
        comment_id: CommentId,
    ) -> Result<ItemId, ItemsServiceError> {
        let comment = Comment::find_by_id(comment_id)
            .one(&self.db)
            .await?
            .ok_or(ItemsServiceError::CommentNotFound)?;
        if comment.user_id != actor.id && !actor.is_admin {
            return Err(ItemsServiceError::Forbidden);
        }

        let item_id = comment.item_id;
        comment.delete(&self.db).await?;
        Ok(item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::memory_db,
        service::tests_support::{seed_admin, seed_item, seed_stock, seed_user},
    };

    async fn setup() -> (DatabaseConnection, ItemsService) {
        let db = memory_db().await;
        let service = ItemsService::new(db.clone());
        (db, service)
    }

    fn lamp_form() -> ItemForm {
        ItemForm {
            title: "Desk lamp".into(),
            description: "Warm light, barely used".into(),
            price: 25.0,
            stock: 2,
            image_file: None,
        }
    }

    #[tokio::test]
    async fn test_create_item_validates() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;

        let item = service.create_item(alice.id, lamp_form()).await.unwrap();
        assert_eq!(item.image_file, DEFAULT_IMAGE);
        assert_eq!(item.views, 0);

        let free = ItemForm {
            price: 0.0,
            ..lamp_form()
        };
        assert!(matches!(
            service.create_item(alice.id, free).await,
            Err(ItemsServiceError::Validation(_))
        ));

        let none_left = ItemForm {
            stock: 0,
            ..lamp_form()
        };
        assert!(matches!(
            service.create_item(alice.id, none_left).await,
            Err(ItemsServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_from_stock_moves_quantity() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let stock = seed_stock(&db, alice.id, "Calculator", 3).await;

        let form = |quantity, with_description: bool| StockListingForm {
            stock_id: stock.id,
            stock_quantity: quantity,
            stock_price: 15.0,
            use_stock_description: with_description.then(|| "on".to_string()),
        };

        assert!(matches!(
            service.create_from_stock(bob.id, form(1, false)).await,
            Err(ItemsServiceError::Forbidden)
        ));
        assert!(matches!(
            service.create_from_stock(alice.id, form(4, false)).await,
            Err(ItemsServiceError::InsufficientStock { available: 3 })
        ));

        let item = service.create_from_stock(alice.id, form(2, true)).await.unwrap();
        assert_eq!(item.title, "Calculator");
        assert_eq!(item.stock, 2);
        assert_eq!(item.description, "spare Calculator");
        let left = Stock::find_by_id(stock.id).one(&db).await.unwrap().unwrap();
        assert_eq!(left.quantity, 1);

        let item = service.create_from_stock(alice.id, form(1, false)).await.unwrap();
        assert_eq!(item.description, "");
        assert!(Stock::find_by_id(stock.id).one(&db).await.unwrap().is_none());

        assert!(matches!(
            service.create_from_stock(alice.id, form(1, false)).await,
            Err(ItemsServiceError::StockNotFound)
        ));
    }

    #[tokio::test]
    async fn test_item_detail_counts_views() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let item = seed_item(&db, alice.id, "bike", 80.0, 1).await;

        service.follow_item(bob.id, item.id).await.unwrap();
        service.add_comment(bob.id, item.id, "still available?").await.unwrap();

        let detail = service.item_detail(item.id, Some(bob.id)).await.unwrap();
        assert_eq!(detail.item.views, 1);
        assert_eq!(detail.seller.username, "alice");
        assert_eq!(detail.seller_contact, "alice-wechat");
        assert_eq!(detail.follower_count, 1);
        assert!(detail.following);
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].author.username, "bob");

        let detail = service.item_detail(item.id, None).await.unwrap();
        assert_eq!(detail.item.views, 2);
        assert!(!detail.following);

        assert!(matches!(
            service.view_item(ItemId::new()).await,
            Err(ItemsServiceError::ItemNotFound)
        ));
    }

    #[tokio::test]
    async fn test_follow_already_recorded_is_a_no_op() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let item = seed_item(&db, alice.id, "bike", 80.0, 1).await;

        // a row written by a parallel request that won the race
        Follow::insert(FollowActiveModel {
            id: Set(FollowId::new()),
            user_id: Set(bob.id),
            item_id: Set(item.id),
            date_followed: Set(time::now()),
        })
        .exec(&db)
        .await
        .unwrap();

        assert!(!service.follow_item(bob.id, item.id).await.unwrap());
        assert_eq!(Follow::find().count(&db).await.unwrap(), 1);
        assert_eq!(Notification::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_follow_then_unfollow() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let item = seed_item(&db, alice.id, "bike", 80.0, 1).await;

        assert!(matches!(
            service.follow_item(alice.id, item.id).await,
            Err(ItemsServiceError::OwnItem)
        ));

        assert!(service.follow_item(bob.id, item.id).await.unwrap());
        assert!(!service.follow_item(bob.id, item.id).await.unwrap());
        assert_eq!(Follow::find().count(&db).await.unwrap(), 1);

        let notes = Notification::find().all(&db).await.unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].notification_type, NotificationKind::FollowItem);
        assert_eq!(notes[0].related_id, Some(item.id.into_uuid()));

        let followed = followed_items(&db, bob.id).await.unwrap();
        assert_eq!(followed.len(), 1);
        assert_eq!(items_by_user(&db, alice.id).await.unwrap()[0].id, item.id);
        assert!(items_by_user(&db, bob.id).await.unwrap().is_empty());

        assert!(service.unfollow_item(bob.id, item.id).await.unwrap());
        assert!(!service.unfollow_item(bob.id, item.id).await.unwrap());
        assert_eq!(Follow::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_buy_item_updates_everything() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let item = seed_item(&db, alice.id, "notebook", 3.5, 5).await;

        let purchase = service.buy_item(bob.id, item.id, 2).await.unwrap();
        assert_eq!(purchase.item.stock, 3);
        assert_eq!(purchase.item.sales_count, 2);
        assert_eq!(purchase.stock.name, "notebook");
        assert_eq!(purchase.stock.quantity, 2);

        let again = service.buy_item(bob.id, item.id, 3).await.unwrap();
        assert_eq!(again.item.stock, 0);
        assert_eq!(again.stock.id, purchase.stock.id);
        assert_eq!(again.stock.quantity, 5);

        let seller = User::find_by_id(alice.id).one(&db).await.unwrap().unwrap();
        assert_eq!(seller.sales_count, 5);

        let purchases = Notification::find()
            .filter(NotificationColumn::NotificationType.eq(NotificationKind::Purchase))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(purchases, 2);

        // sold out: nothing changes
        assert!(matches!(
            service.buy_item(bob.id, item.id, 1).await,
            Err(ItemsServiceError::InsufficientStock { available: 0 })
        ));
        assert_eq!(Stock::find().count(&db).await.unwrap(), 1);
        assert!(matches!(
            service.buy_item(alice.id, item.id, 1).await,
            Err(ItemsServiceError::OwnItem)
        ));
    }

    #[tokio::test]
    async fn test_market_sorting_and_search() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let cheap = seed_item(&db, alice.id, "pencil", 1.0, 10).await;
        let pricey = seed_item(&db, alice.id, "laptop", 900.0, 1).await;
        let mid = seed_item(&db, alice.id, "backpack", 40.0, 1).await;

        service.follow_item(bob.id, mid.id).await.unwrap();
        service.view_item(pricey.id).await.unwrap();

        let ids = |page: Page<ItemCard>| page.items.into_iter().map(|c| c.item.id).collect::<Vec<_>>();

        let latest = service.list_market("", MarketSort::Latest, 1).await.unwrap();
        assert_eq!(latest.total_items, 3);
        assert_eq!(latest.items[0].item.id, mid.id);
        assert_eq!(latest.items[0].follower_count, 1);
        assert_eq!(latest.items[0].seller.username, "alice");

        assert_eq!(
            ids(service.list_market("", MarketSort::PriceAsc, 1).await.unwrap()),
            vec![cheap.id, mid.id, pricey.id]
        );
        assert_eq!(
            ids(service.list_market("", MarketSort::PriceDesc, 1).await.unwrap()),
            vec![pricey.id, mid.id, cheap.id]
        );

        let followed = service.list_market("", MarketSort::MostFollowed, 1).await.unwrap();
        assert_eq!(followed.total_items, 3);
        assert_eq!(followed.items[0].item.id, mid.id);

        let viewed = service.list_market("", MarketSort::MostViewed, 1).await.unwrap();
        assert_eq!(viewed.items[0].item.id, pricey.id);

        let found = service.list_market("LAP", MarketSort::from("bogus"), 1).await.unwrap();
        assert_eq!(ids(found), vec![pricey.id]);
        let by_description = service.list_market("a pencil", MarketSort::Latest, 1).await.unwrap();
        assert_eq!(ids(by_description), vec![cheap.id]);
    }

    #[tokio::test]
    async fn test_market_pages_hold_twelve() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        for i in 0..13 {
            seed_item(&db, alice.id, &format!("item {i}"), 1.0, 1).await;
        }

        let first = service.list_market("", MarketSort::Latest, 1).await.unwrap();
        assert_eq!(first.items.len(), 12);
        assert_eq!(first.total_pages, 2);
        let second = service.list_market("", MarketSort::Latest, 2).await.unwrap();
        assert_eq!(second.items.len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_permissions() {
        let (db, service) = setup().await;
        let admin = seed_admin(&db, "root").await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let item = service.create_item(alice.id, lamp_form()).await.unwrap();

        assert!(matches!(
            service.update_item(bob.id, item.id, lamp_form()).await,
            Err(ItemsServiceError::Forbidden)
        ));
        // admins moderate, they do not edit
        assert!(matches!(
            service.update_item(admin.id, item.id, lamp_form()).await,
            Err(ItemsServiceError::Forbidden)
        ));

        let updated = service
            .update_item(
                alice.id,
                item.id,
                ItemForm {
                    price: 20.0,
                    image_file: Some("lamp.jpg".into()),
                    ..lamp_form()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price, 20.0);
        assert_eq!(updated.image_file, "lamp.jpg");

        service.follow_item(bob.id, item.id).await.unwrap();
        service.add_comment(bob.id, item.id, "nice").await.unwrap();

        assert!(matches!(
            service.delete_item(&bob, item.id).await,
            Err(ItemsServiceError::Forbidden)
        ));
        service.delete_item(&admin, item.id).await.unwrap();
        assert_eq!(Item::find().count(&db).await.unwrap(), 0);
        assert_eq!(Follow::find().count(&db).await.unwrap(), 0);
        assert_eq!(Comment::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_comments_and_forwarding() {
        let (db, service) = setup().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;
        let carol = seed_user(&db, "carol").await;
        let item = seed_item(&db, alice.id, "bike", 80.0, 1).await;

        let comment = service.add_comment(bob.id, item.id, "is it red?").await.unwrap();
        assert!(matches!(
            service.delete_comment(&carol, comment.id).await,
            Err(ItemsServiceError::Forbidden)
        ));
        assert_eq!(service.delete_comment(&bob, comment.id).await.unwrap(), item.id);

        let message = service
            .forward_to_message(bob.id, item.id, carol.id, "http://market.test/")
            .await
            .unwrap();
        assert_eq!(message.receiver_id, carol.id);
        assert!(message.content.contains("Title: bike"));
        assert!(message.content.contains("Price: ¥80.00"));
        assert!(message
            .content
            .contains(&format!("Link: http://market.test/item/{}", item.id)));
        assert!(message.content.contains("Seller: alice"));
        assert!(message.content.ends_with("a bike"));

        assert!(matches!(
            service.forward_to_message(bob.id, item.id, bob.id, "http://x/").await,
            Err(ItemsServiceError::SelfMessage)
        ));
        assert!(matches!(
            service
                .forward_to_message(bob.id, item.id, UserId::new(), "http://x/")
                .await,
            Err(ItemsServiceError::UserNotFound)
        ));
    }
}
