use axum::{
    extract::{Query, State},
    routing::get,
    Form, Json, Router,
};
use market_core::{
    entity::prelude::MessageModel,
    ids::UserId,
    service::{accounts::UserSearchHit, messages::Conversation, UserCard},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    flash::{Flash, IncomingFlash, Page, Redirect},
    session::CurrentUser,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendForm {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct Inbox {
    pub conversations: Vec<Conversation>,
    pub search_query: String,
    pub search_results: Vec<UserSearchHit>,
    pub selected: Option<UserCard>,
    pub thread: Vec<MessageModel>,
}

/// GET /messages
pub async fn inbox(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
    Query(query): Query<InboxQuery>,
) -> Result<Page<Inbox>, ApiError> {
    let services = &state.services;
    let search = query.search.unwrap_or_default();

    let search_results = if search.trim().is_empty() {
        Vec::new()
    } else {
        services.accounts.search_users(&search, user.id).await?
    };

    // Opening a thread marks it read, so it goes before the inbox counts.
    let (selected, thread) = match query.user_id {
        Some(partner_id) => {
            let partner = services.accounts.get_user(partner_id).await?;
            let thread = services.messages.thread(user.id, partner_id).await?;
            (Some(UserCard::from(&partner)), thread)
        }
        None => (None, Vec::new()),
    };

    let conversations = services.messages.conversations(user.id).await?;

    Ok(Page::new(
        flash,
        Inbox {
            conversations,
            search_query: search,
            search_results,
            selected,
            thread,
        },
    ))
}

/// POST /messages?user_id=
pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<InboxQuery>,
    Form(form): Form<SendForm>,
) -> Result<Redirect, ApiError> {
    let receiver_id = query
        .user_id
        .ok_or_else(|| ApiError::BadRequest("no recipient selected".into()))?;

    state
        .services
        .messages
        .send(user.id, receiver_id, &form.content)
        .await?;

    Ok(Redirect::to(format!("/messages?user_id={receiver_id}")).with(Flash::success("Message sent!")))
}

/// GET /search_users?q=
pub async fn search_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<UserSearchQuery>,
) -> Result<Json<Vec<UserSearchHit>>, ApiError> {
    Ok(Json(
        state.services.accounts.search_users(&query.q, user.id).await?,
    ))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(inbox).post(send_message))
        .route("/search_users", get(search_users))
}
