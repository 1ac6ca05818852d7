use axum::{
    extract::{Path, State},
    routing::post,
    Router,
};
use market_core::ids::UserId;
use tracing::info;

use crate::{
    error::ApiError,
    flash::{Flash, Redirect},
    session::CurrentUser,
    AppState,
};

/// POST /admin/user/:id/delete
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(target): Path<UserId>,
) -> Result<Redirect, ApiError> {
    state.services.accounts.delete_user(&user, target).await?;
    info!(admin = %user.id, %target, "user deleted by admin");
    Ok(Redirect::to("/market").with(Flash::success("User deleted")))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/user/:id/delete", post(delete_user))
}
