//! One-shot status messages carried across a redirect, and the JSON page
//! envelope that delivers them.

use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::cookies::{self, FLASH_COOKIE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    fn encode(&self) -> String {
        // serializing a two-field struct cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    fn decode(raw: &str) -> Option<Self> {
        let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
        serde_json::from_slice(&bytes).ok()
    }
}

/// The flash left by the previous response, if any.
#[derive(Debug, Clone, Default)]
pub struct IncomingFlash(pub Option<Flash>);

#[async_trait]
impl<S> FromRequestParts<S> for IncomingFlash
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IncomingFlash(
            cookies::read(&parts.headers, FLASH_COOKIE).and_then(|raw| Flash::decode(&raw)),
        ))
    }
}

/// JSON page: `{ "flash": ..., "data": ... }`. Consumes the flash cookie.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub flash: Option<Flash>,
    pub data: T,
}

impl<T: Serialize> Page<T> {
    pub fn new(flash: IncomingFlash, data: T) -> Self {
        Self {
            flash: flash.0,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for Page<T> {
    fn into_response(self) -> Response {
        let had_flash = self.flash.is_some();
        let mut response = Json(self).into_response();
        if had_flash {
            response
                .headers_mut()
                .append(header::SET_COOKIE, cookies::clear(FLASH_COOKIE));
        }
        response
    }
}

/// `303 See Other`, optionally leaving a flash and extra cookies behind.
#[derive(Debug)]
pub struct Redirect {
    to: String,
    flash: Option<Flash>,
    cookies: Vec<HeaderValue>,
}

impl Redirect {
    pub fn to(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            flash: None,
            cookies: Vec::new(),
        }
    }

    pub fn with(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }

    pub fn with_cookie(mut self, cookie: HeaderValue) -> Self {
        self.cookies.push(cookie);
        self
    }
}

impl IntoResponse for Redirect {
    fn into_response(self) -> Response {
        let location =
            HeaderValue::from_str(&self.to).unwrap_or_else(|_| HeaderValue::from_static("/"));
        let mut response = (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response();

        let headers = response.headers_mut();
        if let Some(flash) = self.flash {
            headers.append(
                header::SET_COOKIE,
                cookies::set(FLASH_COOKIE, &flash.encode(), None),
            );
        }
        for cookie in self.cookies {
            headers.append(header::SET_COOKIE, cookie);
        }
        response
    }
}
