//! Session State Management
//!
//! This module owns the per-session state containers (cart, orders, live
//! trackers) and the shared application state that hands them out.

use dashmap::mapref::one::{Ref, RefMut};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

use crate::cart::Cart;
use crate::config::Config;
use crate::orders::{OrderBook, OrderError, OrderStatus};
use crate::tracking::{SimulatedFeed, TrackingFeed};

// =============================================================================
// Session
// =============================================================================

/// Aborts the tracking task it guards when dropped
#[derive(Debug)]
struct TrackerGuard(JoinHandle<()>);

impl Drop for TrackerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// One client's cart, order history and live trackers
#[derive(Debug, Default)]
pub struct Session {
    pub cart: Cart,
    pub orders: OrderBook,
    trackers: HashMap<String, TrackerGuard>,
}

impl Session {
    /// Whether a tracker for `order_id` is still running
    pub fn is_tracking(&self, order_id: &str) -> bool {
        self.trackers
            .get(order_id)
            .is_some_and(|guard| !guard.0.is_finished())
    }

    /// Tears down the tracker of `order_id`. Returns `false` if none was running.
    pub fn stop_tracking(&mut self, order_id: &str) -> bool {
        match self.trackers.remove(order_id) {
            Some(guard) => {
                let running = !guard.0.is_finished();
                tracing::debug!(order_id, running, "Tracking stopped");
                running
            }
            None => false,
        }
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Core application state containing every session and the tracking feed
pub struct AppState {
    /// In-memory sessions, keyed by session id.
    /// DashMap allows concurrent access without external Mutexes.
    pub sessions: DashMap<String, Session>,

    pub config: Config,

    feed: Arc<dyn TrackingFeed>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates an AppState with default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Uses the simulated feed, ticking at `config.stage_interval`
    pub fn with_config(config: Config) -> Self {
        let feed = Arc::new(SimulatedFeed::new(config.stage_interval));
        Self::with_feed(config, feed)
    }

    pub fn with_feed(config: Config, feed: Arc<dyn TrackingFeed>) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
            feed,
        }
    }

    /// Returns the session, creating an empty one on first use.
    ///
    /// Only for operations that store something in the session. The returned
    /// guard locks the session; never hold it across an `.await`.
    pub fn session(&self, session_id: &str) -> RefMut<'_, String, Session> {
        self.sessions.entry(session_id.to_string()).or_default()
    }

    /// Read access to an existing session. Never creates one.
    pub fn find_session(&self, session_id: &str) -> Option<Ref<'_, String, Session>> {
        self.sessions.get(session_id)
    }

    /// Write access to an existing session. Never creates one.
    pub fn find_session_mut(&self, session_id: &str) -> Option<RefMut<'_, String, Session>> {
        self.sessions.get_mut(session_id)
    }

    /// Drops the session and, with it, every tracker it owns.
    pub fn end_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id, "Session ended");
        }
        removed
    }

    /// Starts following `order_id` with the tracking feed, applying every
    /// stage it publishes to the session's order book.
    ///
    /// Replaces any tracker already running for the order and forgets the
    /// ones that have finished. Returns the status the order is in when
    /// tracking starts.
    pub fn start_tracking(
        self: &Arc<Self>,
        session_id: &str,
        order_id: &str,
    ) -> Result<OrderStatus, OrderError> {
        let mut session = self
            .find_session_mut(session_id)
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;
        let order = session.orders.get_order_by_id(order_id)?;
        let status = order.status();
        let mut handle = self.feed.track(order);

        let state = Arc::downgrade(self);
        let (sid, oid) = (session_id.to_string(), order_id.to_string());
        let task = tokio::spawn(async move {
            while let Some(stage) = handle.changed().await {
                if !apply_stage(&state, &sid, &oid, stage) {
                    break;
                }
            }
            tracing::debug!(order_id = %oid, "Tracking feed finished");
        });

        tracing::info!(session_id, order_id, %status, "Tracking started");
        session.trackers.retain(|_, guard| !guard.0.is_finished());
        session
            .trackers
            .insert(order_id.to_string(), TrackerGuard(task));
        Ok(status)
    }

    pub fn stop_tracking(&self, session_id: &str, order_id: &str) -> bool {
        self.sessions
            .get_mut(session_id)
            .is_some_and(|mut session| session.stop_tracking(order_id))
    }
}

/// Pushes one tracked stage into the order book. `false` ends the tracker.
///
/// Stages the watch channel coalesced away are walked through, so a late
/// applier still moves the order one legal step at a time.
fn apply_stage(state: &Weak<AppState>, session_id: &str, order_id: &str, stage: OrderStatus) -> bool {
    let Some(state) = state.upgrade() else {
        return false;
    };
    let Some(mut session) = state.sessions.get_mut(session_id) else {
        return false;
    };

    match session.orders.advance_order_to(order_id, stage) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(order_id, error = %e, "Dropping tracked stage");
            false
        }
    }
}
