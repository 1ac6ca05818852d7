use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};

use crate::AppState;

pub mod accounts;
pub mod admin;
pub mod health;
pub mod items;
pub mod messages;
pub mod notifications;
pub mod profile;
pub mod requests;
pub mod square;
pub mod stock;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<u64>,
}

/// Payload of a GET form page: which form to show and what to pre-fill.
#[derive(Debug, Serialize)]
pub struct FormPage<T> {
    pub form: &'static str,
    pub values: T,
}

impl FormPage<()> {
    pub fn blank(form: &'static str) -> Self {
        Self { form, values: () }
    }
}

/// Absolute site root with a trailing slash, for links that leave the site.
pub fn site_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(url) = &state.config.public_url {
        return format!("{}/", url.trim_end_matches('/'));
    }
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    format!("http://{host}/")
}
