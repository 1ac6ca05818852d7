use axum::{
    extract::{Path, State},
    routing::{get, post},
    Form, Router,
};
use market_core::{
    entity::prelude::UserModel,
    ids::UserId,
    service::{accounts::ProfileForm, social::Profile},
};

use crate::{
    error::ApiError,
    flash::{Flash, IncomingFlash, Page, Redirect},
    routes::FormPage,
    session::CurrentUser,
    AppState,
};

fn profile_path(id: UserId) -> String {
    format!("/user/{id}/profile")
}

/// GET /profile
pub async fn own_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
) -> Result<Page<Profile>, ApiError> {
    let profile = state.services.social.profile(user.id, user.id).await?;
    Ok(Page::new(flash, profile))
}

/// GET /profile/edit
pub async fn edit_profile_form(
    CurrentUser(user): CurrentUser,
    flash: IncomingFlash,
) -> Page<FormPage<UserModel>> {
    Page::new(
        flash,
        FormPage {
            form: "profile",
            values: user,
        },
    )
}

/// POST /profile/edit
pub async fn edit_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect, ApiError> {
    state.services.accounts.update_profile(user.id, form).await?;
    Ok(Redirect::to("/profile").with(Flash::success("Profile updated!")))
}

/// GET /user/:id/info
pub async fn user_info(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    flash: IncomingFlash,
    Path(user_id): Path<UserId>,
) -> Result<Page<UserModel>, ApiError> {
    let user = state.services.accounts.get_user(user_id).await?;
    Ok(Page::new(flash, user))
}

/// GET /user/:id/profile
pub async fn user_profile(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    flash: IncomingFlash,
    Path(user_id): Path<UserId>,
) -> Result<Page<Profile>, ApiError> {
    let profile = state.services.social.profile(user_id, viewer.id).await?;
    Ok(Page::new(flash, profile))
}

/// POST /user/:id/follow
pub async fn follow_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<UserId>,
) -> Result<Redirect, ApiError> {
    let redirect = Redirect::to(profile_path(user_id));
    if state.services.social.follow_user(user.id, user_id).await? {
        Ok(redirect.with(Flash::success("Followed!")))
    } else {
        Ok(redirect)
    }
}

/// POST /user/:id/unfollow
pub async fn unfollow_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<UserId>,
) -> Result<Redirect, ApiError> {
    let redirect = Redirect::to(profile_path(user_id));
    if state.services.social.unfollow_user(user.id, user_id).await? {
        Ok(redirect.with(Flash::success("Unfollowed")))
    } else {
        Ok(redirect)
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(own_profile))
        .route("/profile/edit", get(edit_profile_form).post(edit_profile))
        .route("/user/:id/info", get(user_info))
        .route("/user/:id/profile", get(user_profile))
        .route("/user/:id/follow", post(follow_user))
        .route("/user/:id/unfollow", post(unfollow_user))
}
