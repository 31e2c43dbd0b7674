//! Delivery Tracking Module
//!
//! Live delivery stages for orders:
//! - `StageCursor`, the forward-only pointer into a stage list
//! - The `TrackingFeed` interface and its cancel-on-drop handles
//! - `SimulatedFeed`, which advances stages on a timer

pub mod cursor;
pub mod feed;
pub mod simulator;

pub use cursor::StageCursor;
pub use feed::{StageWatch, TrackingFeed, TrackingHandle};
pub use simulator::{SimulatedFeed, DEFAULT_STAGE_INTERVAL, MIN_STAGE_INTERVAL};
