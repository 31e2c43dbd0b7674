//! REST API handlers for checkout, order queries and tracking

use super::models::*;
use crate::router::{
    errors::ApiError,
    session::{resolve_session_id, session_response},
};
use super::errors::OrderError;
use crate::session::{Session, SharedState};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;

/// Creates routes for order-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/status", patch(update_status))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/review", post(submit_review))
        .route(
            "/orders/:id/tracking",
            post(start_tracking).delete(stop_tracking),
        )
}

/// Endpoint: POST /checkout
/// Turns the cart into an order, then clears the cart.
async fn checkout(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Json<CheckoutInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body?;
    let (session_id, is_new_session) = resolve_session_id(&headers);

    let details = CheckoutDetails {
        payment_method: input.payment_method,
        address: input.address,
        delivery_fee: input
            .delivery_fee
            .unwrap_or(state.config.default_delivery_fee),
    };

    // An unknown session has nothing in its cart.
    let mut session = state
        .find_session_mut(&session_id)
        .ok_or(OrderError::EmptyCart)?;
    let Session { cart, orders, .. } = &mut *session;

    let order_id = orders.create_order_from_cart(cart, details)?;
    // Only once the order exists: a failed checkout keeps the cart.
    cart.clear();

    let order = orders.get_order_by_id(&order_id)?.clone();
    Ok(session_response(
        &session_id,
        is_new_session,
        StatusCode::CREATED,
        OrderResponse::from(order),
    ))
}

/// Endpoint: GET /orders
/// Most recent first; `?active=true` hides cancelled orders.
async fn list_orders(
    State(state): State<SharedState>,
    headers: HeaderMap,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let (session_id, is_new_session) = resolve_session_id(&headers);

    let orders: Vec<OrderResponse> = match state.find_session(&session_id) {
        Some(session) => session
            .orders
            .orders()
            .iter()
            .filter(|o| !query.active || o.is_active())
            .cloned()
            .map(OrderResponse::from)
            .collect(),
        None => Vec::new(),
    };

    Ok(session_response(
        &session_id,
        is_new_session,
        StatusCode::OK,
        json!({ "orders": orders }),
    ))
}

/// Endpoint: GET /orders/:id
async fn get_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Response, ApiError> {
    let (session_id, is_new_session) = resolve_session_id(&headers);

    let session = state
        .find_session(&session_id)
        .ok_or_else(|| OrderError::NotFound(order_id.clone()))?;
    let order = session.orders.get_order_by_id(&order_id)?.clone();

    Ok(session_response(
        &session_id,
        is_new_session,
        StatusCode::OK,
        OrderResponse::from(order),
    ))
}

/// Endpoint: PATCH /orders/:id/status
/// Forward one stage, or cancel. `expectedVersion` guards against lost updates.
async fn update_status(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
    body: Result<Json<UpdateStatusInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body?;
    let (session_id, is_new_session) = resolve_session_id(&headers);

    let mut session = state
        .find_session_mut(&session_id)
        .ok_or_else(|| OrderError::NotFound(order_id.clone()))?;
    let order = match input.expected_version {
        Some(version) => session
            .orders
            .update_order_status_if(&order_id, input.status, version)?,
        None => session.orders.update_order_status(&order_id, input.status)?,
    }
    .clone();

    Ok(session_response(
        &session_id,
        is_new_session,
        StatusCode::OK,
        OrderResponse::from(order),
    ))
}

/// Endpoint: POST /orders/:id/cancel
async fn cancel_order(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Response, ApiError> {
    let (session_id, is_new_session) = resolve_session_id(&headers);

    let mut session = state
        .find_session_mut(&session_id)
        .ok_or_else(|| OrderError::NotFound(order_id.clone()))?;
    let order = session.orders.cancel_order(&order_id)?.clone();
    session.stop_tracking(&order_id);

    Ok(session_response(
        &session_id,
        is_new_session,
        StatusCode::OK,
        OrderResponse::from(order),
    ))
}

/// Endpoint: POST /orders/:id/review
async fn submit_review(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
    body: Result<Json<ReviewInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body?;
    let (session_id, is_new_session) = resolve_session_id(&headers);

    let mut session = state
        .find_session_mut(&session_id)
        .ok_or_else(|| OrderError::NotFound(order_id.clone()))?;
    let order = session
        .orders
        .submit_review(
            &order_id,
            input.pharmacy_rating,
            input.delivery_rating,
            input.comment,
        )?
        .clone();

    Ok(session_response(
        &session_id,
        is_new_session,
        StatusCode::OK,
        OrderResponse::from(order),
    ))
}

/// Endpoint: POST /orders/:id/tracking
/// Starts live (simulated) tracking; stages are applied to the order as they come.
async fn start_tracking(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Response, ApiError> {
    let (session_id, is_new_session) = resolve_session_id(&headers);
    let status = state.start_tracking(&session_id, &order_id)?;

    Ok(session_response(
        &session_id,
        is_new_session,
        StatusCode::ACCEPTED,
        json!({ "orderId": order_id, "status": status, "tracking": true }),
    ))
}

/// Endpoint: DELETE /orders/:id/tracking
/// The observing view went away; stop the timer.
async fn stop_tracking(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Response, ApiError> {
    let (session_id, is_new_session) = resolve_session_id(&headers);
    let stopped = state.stop_tracking(&session_id, &order_id);

    Ok(session_response(
        &session_id,
        is_new_session,
        StatusCode::OK,
        json!({ "orderId": order_id, "tracking": false, "stopped": stopped }),
    ))
}
