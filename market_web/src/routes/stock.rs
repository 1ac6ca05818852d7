use axum::{
    extract::{Path, State},
    routing::{get, post},
    Form, Router,
};
use market_core::{entity::prelude::StockModel, ids::StockId, service::stocks::StockForm};

use crate::{
    error::ApiError,
    flash::{Flash, IncomingFlash, Page, Redirect},
    routes::FormPage,
    session::CurrentUser,
    AppState,
};

/// GET /stock/new
pub async fn new_stock_form(
    CurrentUser(_): CurrentUser,
    flash: IncomingFlash,
) -> Page<FormPage<()>> {
    Page::new(flash, FormPage::blank("stock"))
}

/// POST /stock/new
pub async fn create_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<StockForm>,
) -> Result<Redirect, ApiError> {
    state.services.stocks.create(user.id, form).await?;
    Ok(Redirect::to("/profile").with(Flash::success("Stock added!")))
}

/// GET /stock/:id/update
pub async fn edit_stock_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
    Path(stock_id): Path<StockId>,
) -> Result<Page<FormPage<StockModel>>, ApiError> {
    let stock = state.services.stocks.get_owned(user.id, stock_id).await?;
    Ok(Page::new(
        flash,
        FormPage {
            form: "stock",
            values: stock,
        },
    ))
}

/// POST /stock/:id/update
pub async fn update_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(stock_id): Path<StockId>,
    Form(form): Form<StockForm>,
) -> Result<Redirect, ApiError> {
    state.services.stocks.update(user.id, stock_id, form).await?;
    Ok(Redirect::to("/profile").with(Flash::success("Stock updated!")))
}

/// POST /stock/:id/delete
pub async fn delete_stock(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(stock_id): Path<StockId>,
) -> Result<Redirect, ApiError> {
    state.services.stocks.delete(user.id, stock_id).await?;
    Ok(Redirect::to("/profile").with(Flash::success("Stock deleted")))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock/new", get(new_stock_form).post(create_stock))
        .route("/stock/:id/update", get(edit_stock_form).post(update_stock))
        .route("/stock/:id/delete", post(delete_stock))
}
