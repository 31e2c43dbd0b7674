//! REST API handlers for cart operations
//!
//! Every endpoint answers with the full cart so the client can re-render
//! from a single response.

use super::{aggregate::Cart, models::*};
use crate::router::{
    errors::ApiError,
    session::{resolve_session_id, session_response},
};
use crate::session::SharedState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::{get, post, put},
    Json, Router,
};

/// Creates routes for cart-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/cart", get(get_cart).delete(clear_cart))
        .route("/cart/items", post(add_item))
        .route("/cart/products", post(add_catalog_product))
        .route("/cart/items/:id", put(update_quantity).delete(remove_item))
        .route("/cart/items/:id/decrement", post(decrement_item))
}

/// Whether a cart operation may bring a new session into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    /// Adds lines: the session is created on first use
    Create,
    /// Only changes or drops existing lines: an unknown session stays unknown
    Existing,
}

fn cart_response(session_id: String, cart: &Cart) -> Result<CartResponse, ApiError> {
    Ok(CartResponse {
        session_id,
        items: cart.lines().to_vec(),
        item_count: cart.item_count(),
        total: cart.total()?,
    })
}

/// Runs `op` on the caller's cart and answers with the resulting cart.
///
/// With [`Access::Existing`] and no session yet, `op` runs against a
/// throwaway empty cart so its input is still validated.
fn with_cart(
    state: &SharedState,
    headers: &HeaderMap,
    access: Access,
    op: impl FnOnce(&mut Cart) -> Result<(), ApiError>,
) -> Result<Response, ApiError> {
    let (session_id, is_new_session) = resolve_session_id(headers);
    let session = match access {
        Access::Create => Some(state.session(&session_id)),
        Access::Existing => state.find_session_mut(&session_id),
    };

    let body = match session {
        Some(mut session) => {
            op(&mut session.cart)?;
            cart_response(session_id.clone(), &session.cart)?
        }
        None => {
            let mut cart = Cart::new();
            op(&mut cart)?;
            cart_response(session_id.clone(), &cart)?
        }
    };
    Ok(session_response(&session_id, is_new_session, StatusCode::OK, body))
}

/// Endpoint: GET /cart
async fn get_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let (session_id, is_new_session) = resolve_session_id(&headers);
    let body = match state.find_session(&session_id) {
        Some(session) => cart_response(session_id.clone(), &session.cart)?,
        None => cart_response(session_id.clone(), &Cart::new())?,
    };
    Ok(session_response(&session_id, is_new_session, StatusCode::OK, body))
}

/// Endpoint: POST /cart/items
/// Adds `quantity` units (default 1), merging with an existing line.
async fn add_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Json<CartLine>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(line) = body?;
    line.validate()?;

    with_cart(&state, &headers, Access::Create, |cart| {
        tracing::debug!(product_id = %line.id, quantity = line.quantity, "Adding to cart");
        cart.add(line)?;
        Ok(())
    })
}

/// Endpoint: POST /cart/products
/// Same as `POST /cart/items`, from a catalog product payload.
async fn add_catalog_product(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Json<AddCatalogProductInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body?;
    let line = input.product.into_cart_line(input.quantity);
    line.validate()?;

    with_cart(&state, &headers, Access::Create, |cart| {
        cart.add(line)?;
        Ok(())
    })
}

/// Endpoint: DELETE /cart/items/:id
async fn remove_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Result<Response, ApiError> {
    with_cart(&state, &headers, Access::Existing, |cart| {
        cart.remove(&product_id);
        Ok(())
    })
}

/// Endpoint: POST /cart/items/:id/decrement
async fn decrement_item(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Result<Response, ApiError> {
    with_cart(&state, &headers, Access::Existing, |cart| {
        cart.decrement(&product_id);
        Ok(())
    })
}

/// Endpoint: PUT /cart/items/:id
/// A quantity of zero or less removes the line.
async fn update_quantity(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    body: Result<Json<UpdateQuantityInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = body?;

    with_cart(&state, &headers, Access::Existing, |cart| {
        cart.update_quantity(&product_id, input.quantity)?;
        Ok(())
    })
}

/// Endpoint: DELETE /cart
async fn clear_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    with_cart(&state, &headers, Access::Existing, |cart| {
        cart.clear();
        Ok(())
    })
}
