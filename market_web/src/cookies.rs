//! Minimal `Cookie` / `Set-Cookie` handling for the session and flash cookies.

use axum::http::{header, HeaderMap, HeaderValue};

pub const SESSION_COOKIE: &str = "market_session";
pub const FLASH_COOKIE: &str = "market_flash";

/// Value of cookie `name` from the request headers.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value. `max_age` in seconds; `None` makes a browser-session cookie.
pub fn set(name: &str, value: &str, max_age: Option<i64>) -> HeaderValue {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={max_age}"));
    }
    // values are base64url or fixed tokens
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

pub fn clear(name: &str) -> HeaderValue {
    set(name, "", Some(0))
}
