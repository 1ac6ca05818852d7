use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Form, Json, Router,
};
use market_core::{
    entity::prelude::{ItemModel, StockModel},
    ids::{CommentId, ItemId, UserId},
    service::items::{ItemDetail, ItemForm, StockListingForm},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    flash::{Flash, IncomingFlash, Page, Redirect},
    routes::{site_url, FormPage},
    session::{CurrentUser, MaybeUser},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct NewItemPage {
    pub form: &'static str,
    /// Stock entries the seller can list from, by name.
    pub stocks: Vec<StockModel>,
}

#[derive(Debug, Deserialize)]
pub struct BuyForm {
    #[serde(default = "one")]
    pub quantity: i32,
}

fn one() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ForwardBody {
    #[serde(default)]
    pub receiver_id: Option<UserId>,
}

#[derive(Debug, Serialize)]
pub struct ForwardResult {
    pub success: bool,
    pub message: String,
}

fn item_path(id: ItemId) -> String {
    format!("/item/{id}")
}

/// GET /item/new
pub async fn new_item_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
) -> Result<Page<NewItemPage>, ApiError> {
    let mut stocks = state.services.stocks.list_for_user(user.id).await?;
    stocks.sort_by(|a, b| a.name.cmp(&b.name));

    Ok(Page::new(
        flash,
        NewItemPage {
            form: "item",
            stocks,
        },
    ))
}

/// POST /item/new
pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, ApiError> {
    state.services.items.create_item(user.id, form).await?;
    Ok(Redirect::to("/home").with(Flash::success("Item listed!")))
}

/// POST /item/add_from_stock
pub async fn add_from_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<StockListingForm>,
) -> Result<Redirect, ApiError> {
    state.services.items.create_from_stock(user.id, form).await?;
    Ok(Redirect::to("/home").with(Flash::success("Item listed!")))
}

/// GET /item/:id
pub async fn item_detail(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    flash: IncomingFlash,
    Path(item_id): Path<ItemId>,
) -> Result<Page<ItemDetail>, ApiError> {
    let detail = state
        .services
        .items
        .item_detail(item_id, viewer.map(|v| v.id))
        .await?;
    Ok(Page::new(flash, detail))
}

/// GET /item/:id/update
pub async fn edit_item_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
    Path(item_id): Path<ItemId>,
) -> Result<Page<FormPage<ItemModel>>, ApiError> {
    let item = state.services.items.get_item(item_id).await?;
    if item.user_id != user.id {
        return Err(ApiError::Forbidden("forbidden: not the owner".into()));
    }
    Ok(Page::new(
        flash,
        FormPage {
            form: "item",
            values: item,
        },
    ))
}

/// POST /item/:id/update
pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<ItemId>,
    Form(form): Form<ItemForm>,
) -> Result<Redirect, ApiError> {
    state.services.items.update_item(user.id, item_id, form).await?;
    Ok(Redirect::to(item_path(item_id)).with(Flash::success("Item updated!")))
}

/// POST /item/:id/delete
pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Result<Redirect, ApiError> {
    state.services.items.delete_item(&user, item_id).await?;
    Ok(Redirect::to("/profile").with(Flash::success("Item deleted")))
}

/// POST /item/:id/follow
pub async fn follow_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Result<Redirect, ApiError> {
    let redirect = Redirect::to(item_path(item_id));
    if state.services.items.follow_item(user.id, item_id).await? {
        Ok(redirect.with(Flash::success("You are now following this item")))
    } else {
        Ok(redirect)
    }
}

/// POST /item/:id/unfollow
pub async fn unfollow_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<ItemId>,
) -> Result<Redirect, ApiError> {
    let redirect = Redirect::to(item_path(item_id));
    if state.services.items.unfollow_item(user.id, item_id).await? {
        Ok(redirect.with(Flash::success("Unfollowed this item")))
    } else {
        Ok(redirect)
    }
}

/// POST /item/:id/buy
pub async fn buy_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<ItemId>,
    Form(form): Form<BuyForm>,
) -> Result<Redirect, ApiError> {
    let purchase = state
        .services
        .items
        .buy_item(user.id, item_id, form.quantity)
        .await?;

    Ok(Redirect::to(item_path(item_id)).with(Flash::success(format!(
        "Bought {} x {}, you now hold {}",
        form.quantity, purchase.item.title, purchase.stock.quantity
    ))))
}

/// POST /item/:id/comment
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<ItemId>,
    Form(form): Form<CommentForm>,
) -> Result<Redirect, ApiError> {
    state
        .services
        .items
        .add_comment(user.id, item_id, &form.content)
        .await?;
    Ok(Redirect::to(format!("{}#comments", item_path(item_id))).with(Flash::success("Comment posted")))
}

/// POST /comment/:id/delete
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(comment_id): Path<CommentId>,
) -> Result<Redirect, ApiError> {
    let item_id = state.services.items.delete_comment(&user, comment_id).await?;
    Ok(Redirect::to(format!("{}#comments", item_path(item_id))).with(Flash::success("Comment deleted")))
}

/// POST /item/:id/forward/message
pub async fn forward_to_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
    Path(item_id): Path<ItemId>,
    Json(body): Json<ForwardBody>,
) -> Result<Json<ForwardResult>, ApiError> {
    let Some(receiver_id) = body.receiver_id else {
        return Ok(Json(ForwardResult {
            success: false,
            message: "Choose someone to forward to".to_string(),
        }));
    };

    let host = site_url(&state, &headers);
    state
        .services
        .items
        .forward_to_message(user.id, item_id, receiver_id, &host)
        .await?;

    Ok(Json(ForwardResult {
        success: true,
        message: "Forwarded".to_string(),
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/item/new", get(new_item_form).post(create_item))
        .route("/item/add_from_stock", post(add_from_stock))
        .route("/item/:id", get(item_detail))
        .route("/item/:id/update", get(edit_item_form).post(update_item))
        .route("/item/:id/delete", post(delete_item))
        .route("/item/:id/follow", post(follow_item))
        .route("/item/:id/unfollow", post(unfollow_item))
        .route("/item/:id/buy", post(buy_item))
        .route("/item/:id/comment", post(add_comment))
        .route("/comment/:id/delete", post(delete_comment))
        .route("/item/:id/forward/message", post(forward_to_message))
}
