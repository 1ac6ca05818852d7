use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Form, Router,
};
use market_core::{
    entity::prelude::RequestModel,
    ids::RequestId,
    service::{
        requests::{RequestCard, RequestForm},
        Page as Listing,
    },
};
use serde::{Deserialize, Serialize};

use crate::{
    error::ApiError,
    flash::{Flash, IncomingFlash, Page, Redirect},
    routes::FormPage,
    session::CurrentUser,
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct RequestsQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct RequestsPage {
    pub requests: Listing<RequestCard>,
    pub search_query: String,
}

fn request_path(id: RequestId) -> String {
    format!("/request/{id}")
}

/// GET /requests
pub async fn list_requests(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Query(query): Query<RequestsQuery>,
) -> Result<Page<RequestsPage>, ApiError> {
    let search = query.search.unwrap_or_default();
    let requests = state
        .services
        .requests
        .list_requests(&search, query.page.unwrap_or(1))
        .await?;

    Ok(Page::new(
        flash,
        RequestsPage {
            requests,
            search_query: search,
        },
    ))
}

/// GET /request/new
pub async fn new_request_form(
    CurrentUser(_): CurrentUser,
    flash: IncomingFlash,
) -> Page<FormPage<()>> {
    Page::new(flash, FormPage::blank("request"))
}

/// POST /request/new
pub async fn create_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<RequestForm>,
) -> Result<Redirect, ApiError> {
    state.services.requests.create(user.id, form).await?;
    Ok(Redirect::to("/requests").with(Flash::success("Request posted!")))
}

/// GET /request/:id
pub async fn request_detail(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Path(request_id): Path<RequestId>,
) -> Result<Page<RequestCard>, ApiError> {
    Ok(Page::new(flash, state.services.requests.get(request_id).await?))
}

/// GET /request/:id/update
pub async fn edit_request_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
    Path(request_id): Path<RequestId>,
) -> Result<Page<FormPage<RequestModel>>, ApiError> {
    let request = state.services.requests.get(request_id).await?.request;
    if request.user_id != user.id {
        return Err(ApiError::Forbidden("forbidden: not the owner".into()));
    }
    Ok(Page::new(
        flash,
        FormPage {
            form: "request",
            values: request,
        },
    ))
}

/// POST /request/:id/update
pub async fn update_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<RequestId>,
    Form(form): Form<RequestForm>,
) -> Result<Redirect, ApiError> {
    state
        .services
        .requests
        .update(user.id, request_id, form)
        .await?;
    Ok(Redirect::to(request_path(request_id)).with(Flash::success("Request updated!")))
}

/// POST /request/:id/delete
pub async fn delete_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<RequestId>,
) -> Result<Redirect, ApiError> {
    state.services.requests.delete(&user, request_id).await?;
    Ok(Redirect::to("/requests").with(Flash::success("Request deleted")))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(list_requests))
        .route("/request/new", get(new_request_form).post(create_request))
        .route("/request/:id", get(request_detail))
        .route("/request/:id/update", get(edit_request_form).post(update_request))
        .route("/request/:id/delete", post(delete_request))
}
