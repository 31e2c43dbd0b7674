//! REST API handlers for session lifecycle

use axum::{extract::State, http::HeaderMap, response::IntoResponse, routing::delete, Json, Router};
use serde_json::json;

use super::state::SharedState;
use crate::router::session::resolve_session_id;

/// Creates routes for session operations
pub fn routes() -> Router<SharedState> {
    Router::new().route("/session", delete(end_session))
}

/// Endpoint: DELETE /session
/// Drops the cart, the orders and every running tracker of the session.
async fn end_session(State(state): State<SharedState>, headers: HeaderMap) -> impl IntoResponse {
    let (session_id, _) = resolve_session_id(&headers);
    let ended = state.end_session(&session_id);

    Json(json!({ "sessionId": session_id, "ended": ended }))
}
