//! Orders Domain Module
//!
//! This module contains everything that happens after checkout:
//! - Domain models (Order, OrderStatus state machine, checkout inputs)
//! - The OrderBook (creation from a cart, lookup, status transitions, reviews)
//! - REST API handlers

pub mod book;
pub mod errors;
pub mod handlers;
pub mod models;

// Re-export commonly used types for convenience
pub use book::OrderBook;
pub use errors::OrderError;
pub use handlers::routes;
pub use models::{CheckoutDetails, Order, OrderStatus, PaymentMethod};
