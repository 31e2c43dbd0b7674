//! Session resolution and session-aware responses

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

/// Header a client can use to pick its session explicitly
pub const SESSION_HEADER: &str = "x-session-id";
/// Cookie issued to clients that did not bring a session
pub const SESSION_COOKIE: &str = "cart_session";

/// Returns the caller's session id and whether it was just created.
///
/// Looks at the `x-session-id` header first, then the `cart_session` cookie,
/// and falls back to a fresh UUID.
pub fn resolve_session_id(headers: &HeaderMap) -> (String, bool) {
    if let Some(id) = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return (id.to_string(), false);
    }

    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        });

    match from_cookie {
        Some(id) => (id, false),
        None => (Uuid::new_v4().simple().to_string(), true),
    }
}

/// Serializes `body` and, for a brand new session, attaches the session cookie.
pub fn session_response(
    session_id: &str,
    is_new_session: bool,
    status: StatusCode,
    body: impl Serialize,
) -> Response {
    let mut response = (status, Json(body)).into_response();

    if is_new_session {
        let cookie_val = format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, session_id);
        if let Ok(value) = HeaderValue::from_str(&cookie_val) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }

    response
}
