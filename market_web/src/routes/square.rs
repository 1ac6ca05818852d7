use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Form, Json, Router,
};
use market_core::{
    ids::{PostId, ReplyId},
    service::{
        board::{LikeState, PostView, ReplyForm, SearchType},
        Page as Listing,
    },
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    flash::{Flash, IncomingFlash, Page, Redirect},
    session::CurrentUser,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct SquareQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub search_type: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SquarePage {
    pub posts: Listing<PostView>,
    pub search_query: String,
    pub search_type: SearchType,
}

#[derive(Debug, Deserialize)]
pub struct PostForm {
    pub content: String,
    #[serde(default)]
    pub image_file: Option<String>,
}

fn post_anchor(id: PostId) -> String {
    format!("/square#post-{id}")
}

/// GET /square
pub async fn square(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
    Query(query): Query<SquareQuery>,
) -> Result<Page<SquarePage>, ApiError> {
    let search = query.search.unwrap_or_default();
    let search_type = SearchType::from(query.search_type.as_deref().unwrap_or_default());
    let posts = state
        .services
        .board
        .list_square(&search, search_type, query.page.unwrap_or(1), Some(user.id))
        .await?;

    Ok(Page::new(
        flash,
        SquarePage {
            posts,
            search_query: search,
            search_type,
        },
    ))
}

/// POST /square
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<PostForm>,
) -> Result<Redirect, ApiError> {
    state
        .services
        .board
        .create_post(user.id, &form.content, form.image_file)
        .await?;
    Ok(Redirect::to("/square").with(Flash::success("Posted!")))
}

/// POST /post/:id/like
pub async fn like_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<PostId>,
) -> Result<Json<LikeState>, ApiError> {
    Ok(Json(
        state.services.board.toggle_post_like(user.id, post_id).await?,
    ))
}

/// POST /reply/:id/like
pub async fn like_reply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(reply_id): Path<ReplyId>,
) -> Result<Json<LikeState>, ApiError> {
    Ok(Json(
        state.services.board.toggle_reply_like(user.id, reply_id).await?,
    ))
}

/// POST /post/:id/reply
pub async fn reply_to_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<PostId>,
    Form(form): Form<ReplyForm>,
) -> Result<Redirect, ApiError> {
    state
        .services
        .board
        .reply_to_post(user.id, post_id, &form.content, form.quote())
        .await?;
    Ok(Redirect::to(post_anchor(post_id)).with(Flash::success("Reply posted!")))
}

/// POST /post/:id/delete
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<PostId>,
) -> Result<Redirect, ApiError> {
    state.services.board.delete_post(&user, post_id).await?;
    Ok(Redirect::to("/square").with(Flash::success("Post deleted")))
}

/// POST /reply/:id/delete
pub async fn delete_reply(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(reply_id): Path<ReplyId>,
) -> Result<Redirect, ApiError> {
    let post_id = state.services.board.get_reply(reply_id).await?.post_id;
    state.services.board.delete_reply(&user, reply_id).await?;
    Ok(Redirect::to(post_anchor(post_id)).with(Flash::success("Reply deleted")))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/square", get(square).post(create_post))
        .route("/post/:id/like", post(like_post))
        .route("/reply/:id/like", post(like_reply))
        .route("/post/:id/reply", post(reply_to_post))
        .route("/post/:id/delete", post(delete_post))
        .route("/reply/:id/delete", post(delete_reply))
}
