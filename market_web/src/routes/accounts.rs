use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use market_core::service::{
    accounts::RegisterForm,
    items::{ItemCard, MarketSort},
    Page as Listing, UserCard,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    cookies::{self, SESSION_COOKIE},
    error::ApiError,
    flash::{Flash, IncomingFlash, Page, Redirect},
    routes::FormPage,
    session::{MaybeUser, SessionToken},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct MarketQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct MarketPage {
    pub items: Listing<ItemCard>,
    pub current_sort: MarketSort,
    pub search_query: String,
}

#[derive(Debug, Serialize)]
pub struct Landing {
    pub page: &'static str,
    pub user: Option<UserCard>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// GET /
pub async fn welcome(MaybeUser(user): MaybeUser, flash: IncomingFlash) -> Page<Landing> {
    Page::new(
        flash,
        Landing {
            page: "welcome",
            user: user.as_ref().map(UserCard::from),
        },
    )
}

/// GET /home
pub async fn home(MaybeUser(user): MaybeUser, flash: IncomingFlash) -> Page<Landing> {
    Page::new(
        flash,
        Landing {
            page: "home",
            user: user.as_ref().map(UserCard::from),
        },
    )
}

/// GET /market
pub async fn market(
    State(state): State<AppState>,
    flash: IncomingFlash,
    Query(query): Query<MarketQuery>,
) -> Result<Page<MarketPage>, ApiError> {
    let sort = MarketSort::from(query.sort_by.as_deref().unwrap_or("latest"));
    let search = query.search.unwrap_or_default();

    let items = state
        .services
        .items
        .list_market(&search, sort, query.page.unwrap_or(1))
        .await?;

    Ok(Page::new(
        flash,
        MarketPage {
            items,
            current_sort: sort,
            search_query: search,
        },
    ))
}

/// GET /register
pub async fn register_form(MaybeUser(user): MaybeUser, flash: IncomingFlash) -> Response {
    if user.is_some() {
        return Redirect::to("/home").into_response();
    }
    Page::new(flash, FormPage::blank("register")).into_response()
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<RegisterForm>,
) -> Result<Redirect, ApiError> {
    if user.is_some() {
        return Ok(Redirect::to("/home"));
    }
    state.services.accounts.register(form).await?;
    Ok(Redirect::to("/login").with(Flash::success("Account created, please log in!")))
}

/// GET /login
pub async fn login_form(MaybeUser(user): MaybeUser, flash: IncomingFlash) -> Response {
    if user.is_some() {
        return Redirect::to("/home").into_response();
    }
    Page::new(flash, FormPage::blank("login")).into_response()
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, ApiError> {
    let accounts = &state.services.accounts;
    let user = accounts.authenticate(&form.email, &form.password).await?;

    let ttl_hours = state.config.session_ttl_hours;
    let session = accounts.create_session(user.id, ttl_hours).await?;
    info!(user = %user.id, "logged in");

    Ok(Redirect::to("/home")
        .with(Flash::success("Logged in!"))
        .with_cookie(cookies::set(
            SESSION_COOKIE,
            &session.token,
            Some(ttl_hours * 3600),
        )))
}

/// GET /logout
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<Redirect, ApiError> {
    if let Some(token) = token {
        state.services.accounts.end_session(&token).await?;
    }
    Ok(Redirect::to("/home").with_cookie(cookies::clear(SESSION_COOKIE)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(welcome))
        .route("/home", get(home))
        .route("/market", get(market))
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}
