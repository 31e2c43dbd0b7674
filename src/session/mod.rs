//! Session Module
//!
//! Per-client state containers and the shared application state:
//! - `Session` (cart, order book, live trackers)
//! - `AppState` / `SharedState`
//! - REST API handlers for session teardown

pub mod handlers;
pub mod state;

pub use handlers::routes;
pub use state::{AppState, Session, SharedState};
