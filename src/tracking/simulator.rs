//! Timer-driven stand-in for live delivery tracking.
//!
//! Nothing here talks to a courier: stages advance on a fixed interval so the
//! client has something to display.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant};

use super::cursor::StageCursor;
use super::feed::{StageWatch, TrackingFeed, TrackingHandle};
use crate::orders::models::{Order, OrderStatus};

/// Default time between two stages
pub const DEFAULT_STAGE_INTERVAL: Duration = Duration::from_secs(10);

/// Shortest accepted time between two stages; a zero period would make
/// `tokio::time::interval_at` panic.
pub const MIN_STAGE_INTERVAL: Duration = Duration::from_millis(1);

/// Advances an order one stage per `interval`, from its current status up to
/// `delivered`.
#[derive(Debug, Clone)]
pub struct SimulatedFeed {
    interval: Duration,
}

impl Default for SimulatedFeed {
    fn default() -> Self {
        Self::new(DEFAULT_STAGE_INTERVAL)
    }
}

impl SimulatedFeed {
    /// `interval` is raised to [`MIN_STAGE_INTERVAL`] if shorter.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_STAGE_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl TrackingFeed for SimulatedFeed {
    fn track(&self, order: &Order) -> TrackingHandle {
        let status = order.status();
        match status.stage_index() {
            Some(start) if !status.is_terminal() => {
                tracing::debug!(
                    order_id = %order.id(),
                    from = %status,
                    interval = ?self.interval,
                    "Simulated tracking started"
                );
                spawn_progression(OrderStatus::PROGRESSION.to_vec(), start, self.interval)
                    .unwrap_or_else(|| StageWatch::finished(status))
            }
            _ => StageWatch::finished(status),
        }
    }
}

/// Walks `stages` from `start`, publishing one stage every `period`.
///
/// The task ends on the last stage or as soon as nobody is listening.
/// Returns `None` for an empty stage list. `period` is raised to
/// [`MIN_STAGE_INTERVAL`] if shorter.
pub fn spawn_progression<S>(stages: Vec<S>, start: usize, period: Duration) -> Option<StageWatch<S>>
where
    S: Clone + Send + Sync + 'static,
{
    let period = period.max(MIN_STAGE_INTERVAL);
    let mut cursor = StageCursor::new(stages.len(), start);
    let initial = stages.get(cursor.index()).cloned()?;

    let (sender, receiver) = watch::channel(initial);
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);

        while !cursor.is_terminal() {
            ticker.tick().await;
            cursor.advance();

            let Some(stage) = stages.get(cursor.index()).cloned() else {
                break;
            };
            if sender.send(stage).is_err() {
                break;
            }
        }
    });

    Some(StageWatch::new(receiver, task))
}
