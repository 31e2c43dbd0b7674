//! Pharmacy Orders Library
//!
//! This library provides the order lifecycle core of a pharmacy delivery app:
//! the cart, orders built from it, and (simulated) live delivery tracking,
//! exposed over a small JSON API.

// Domain modules
pub mod cart;
pub mod orders;
pub mod tracking;

// Application state
pub mod config;
pub mod session;

// Infrastructure
pub mod router;
