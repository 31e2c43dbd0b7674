//! Cart Domain Module
//!
//! This module contains the cart aggregate and everything around it:
//! - Domain models (CartLine, catalog mapping, inputs, responses)
//! - The Cart aggregate (add/remove/decrement/update/clear, derived total)
//! - Business logic helpers (line merging, formatting)
//! - REST API handlers

pub mod aggregate;
pub mod errors;
pub mod handlers;
pub mod helpers;
pub mod models;

// Re-export commonly used types for convenience
pub use aggregate::Cart;
pub use errors::CartError;
pub use handlers::routes;
pub use models::CartLine;
