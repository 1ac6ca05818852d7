//! Cookie-session extractors.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use market_core::entity::prelude::UserModel;

use crate::{
    cookies::{self, SESSION_COOKIE},
    error::ApiError,
    AppState,
};

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<UserModel>, ApiError> {
    let Some(token) = cookies::read(&parts.headers, SESSION_COOKIE) else {
        return Ok(None);
    };
    Ok(state.services.accounts.resolve_session(&token).await?)
}

/// A logged-in user. Rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserModel);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or(ApiError::Unauthenticated)
    }
}

/// The logged-in user, if there is one.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserModel>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(parts, state).await?))
    }
}

/// Raw session token, for logout.
#[derive(Debug, Clone)]
pub struct SessionToken(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(cookies::read(&parts.headers, SESSION_COOKIE)))
    }
}
