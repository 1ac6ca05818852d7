use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use market_core::{
    error::ValidationError,
    service::{
        accounts::AccountsServiceError, board::BoardServiceError, items::ItemsServiceError,
        messages::MessagesServiceError, notifications::NotificationsServiceError,
        requests::RequestsServiceError, social::SocialServiceError, stocks::StocksServiceError,
    },
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Everything a handler can fail with, already bucketed by HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("login required")]
    Unauthenticated,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error")]
    Database(#[from] DbErr),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Unauthenticated => json!({
                "error": self.to_string(),
                "login": "/login",
            }),
            ApiError::Database(err) => {
                error!(error = %err, "request failed on the database");
                json!({ "error": "internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<AccountsServiceError> for ApiError {
    fn from(error: AccountsServiceError) -> Self {
        match error {
            AccountsServiceError::DbError(error) => ApiError::Database(error),
            AccountsServiceError::Validation(_) | AccountsServiceError::WrongPassword => {
                ApiError::BadRequest(error.to_string())
            }
            AccountsServiceError::UserNotFound => ApiError::NotFound(error.to_string()),
            AccountsServiceError::UsernameTaken
            | AccountsServiceError::EmailTaken
            | AccountsServiceError::CannotDeleteSelf => ApiError::Conflict(error.to_string()),
            AccountsServiceError::InvalidCredentials => ApiError::Unauthorized(error.to_string()),
            AccountsServiceError::Forbidden => ApiError::Forbidden(error.to_string()),
        }
    }
}

impl From<ItemsServiceError> for ApiError {
    fn from(error: ItemsServiceError) -> Self {
        match error {
            ItemsServiceError::DbError(error) => ApiError::Database(error),
            ItemsServiceError::Validation(_) => ApiError::BadRequest(error.to_string()),
            ItemsServiceError::ItemNotFound
            | ItemsServiceError::UserNotFound
            | ItemsServiceError::StockNotFound
            | ItemsServiceError::CommentNotFound => ApiError::NotFound(error.to_string()),
            ItemsServiceError::Forbidden => ApiError::Forbidden(error.to_string()),
            ItemsServiceError::OwnItem
            | ItemsServiceError::InsufficientStock { .. }
            | ItemsServiceError::SelfMessage => ApiError::Conflict(error.to_string()),
        }
    }
}

impl From<RequestsServiceError> for ApiError {
    fn from(error: RequestsServiceError) -> Self {
        match error {
            RequestsServiceError::DbError(error) => ApiError::Database(error),
            RequestsServiceError::Validation(_) => ApiError::BadRequest(error.to_string()),
            RequestsServiceError::RequestNotFound | RequestsServiceError::UserNotFound => {
                ApiError::NotFound(error.to_string())
            }
            RequestsServiceError::Forbidden => ApiError::Forbidden(error.to_string()),
        }
    }
}

impl From<StocksServiceError> for ApiError {
    fn from(error: StocksServiceError) -> Self {
        match error {
            StocksServiceError::DbError(error) => ApiError::Database(error),
            StocksServiceError::Validation(_) => ApiError::BadRequest(error.to_string()),
            StocksServiceError::StockNotFound | StocksServiceError::UserNotFound => {
                ApiError::NotFound(error.to_string())
            }
            StocksServiceError::Forbidden => ApiError::Forbidden(error.to_string()),
        }
    }
}

impl From<BoardServiceError> for ApiError {
    fn from(error: BoardServiceError) -> Self {
        match error {
            BoardServiceError::DbError(error) => ApiError::Database(error),
            BoardServiceError::Validation(_) => ApiError::BadRequest(error.to_string()),
            BoardServiceError::PostNotFound
            | BoardServiceError::ReplyNotFound
            | BoardServiceError::UserNotFound => ApiError::NotFound(error.to_string()),
            BoardServiceError::Forbidden => ApiError::Forbidden(error.to_string()),
        }
    }
}

impl From<SocialServiceError> for ApiError {
    fn from(error: SocialServiceError) -> Self {
        match error {
            SocialServiceError::DbError(error) => ApiError::Database(error),
            SocialServiceError::UserNotFound => ApiError::NotFound(error.to_string()),
            SocialServiceError::SelfFollow => ApiError::Conflict(error.to_string()),
        }
    }
}

impl From<MessagesServiceError> for ApiError {
    fn from(error: MessagesServiceError) -> Self {
        match error {
            MessagesServiceError::DbError(error) => ApiError::Database(error),
            MessagesServiceError::Validation(_) => ApiError::BadRequest(error.to_string()),
            MessagesServiceError::UserNotFound => ApiError::NotFound(error.to_string()),
            MessagesServiceError::SelfMessage => ApiError::Conflict(error.to_string()),
        }
    }
}

impl From<NotificationsServiceError> for ApiError {
    fn from(error: NotificationsServiceError) -> Self {
        match error {
            NotificationsServiceError::DbError(error) => ApiError::Database(error),
            NotificationsServiceError::NotificationNotFound
            | NotificationsServiceError::ReplyNotFound => ApiError::NotFound(error.to_string()),
            NotificationsServiceError::Forbidden => ApiError::Forbidden(error.to_string()),
        }
    }
}
