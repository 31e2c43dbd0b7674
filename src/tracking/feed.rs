//! Tracking feed interface.
//!
//! Callers only see a [`TrackingFeed`] handing out [`StageWatch`] handles, so
//! the timer-driven simulation can be swapped for a real courier feed.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::orders::models::{Order, OrderStatus};

/// Source of live delivery stages for an order.
pub trait TrackingFeed: Send + Sync {
    /// Starts following `order`. Must be called from within a Tokio runtime.
    fn track(&self, order: &Order) -> TrackingHandle;
}

/// Handle on a stream of stages.
///
/// The producing task lives exactly as long as the handle: dropping the handle
/// (or calling [`StageWatch::cancel`]) aborts it.
#[derive(Debug)]
pub struct StageWatch<S> {
    receiver: watch::Receiver<S>,
    task: Option<JoinHandle<()>>,
}

/// Stage handle for an order's delivery status
pub type TrackingHandle = StageWatch<OrderStatus>;

impl<S: Clone> StageWatch<S> {
    pub fn new(receiver: watch::Receiver<S>, task: JoinHandle<()>) -> Self {
        Self {
            receiver,
            task: Some(task),
        }
    }

    /// A handle that never changes: the feed has nothing left to report.
    pub fn finished(stage: S) -> Self {
        let (_, receiver) = watch::channel(stage);
        Self {
            receiver,
            task: None,
        }
    }

    /// Latest published stage
    pub fn current(&self) -> S {
        self.receiver.borrow().clone()
    }

    /// Extra observer on the same stages. It does not keep the producer alive.
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.receiver.clone()
    }

    /// Waits for the next stage. `None` once the feed has ended.
    ///
    /// Yields the latest stage only: a caller that falls behind skips the
    /// stages published in between.
    pub async fn changed(&mut self) -> Option<S> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Whether the producing task is gone
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl<S> Drop for StageWatch<S> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
