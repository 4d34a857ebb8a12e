//! Refresh trigger coalescing
//!
//! Three trigger sources feed one orchestration loop: operator requests, a
//! fixed periodic timer, and delayed post-action refreshes. Range changes ride
//! the same channel but only re-derive the time-series view. The loop awaits
//! each cycle before taking the next trigger, so cycles never interleave;
//! triggers that arrive mid-cycle queue in the channel and start fresh cycles
//! afterwards, each with its own sequence token.

use crate::aggregate::TimeRange;
use crate::controller::DashboardController;
use crate::render::Renderer;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

/// A request for the scheduler to act
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Operator asked for a refresh
    Manual,
    /// A successful admin action settled; re-read server state
    PostAction,
    /// Operator selected a different chart window
    RangeChanged(TimeRange),
}

/// Cloneable handle for submitting triggers to a running scheduler
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    trigger_tx: mpsc::Sender<RefreshTrigger>,
}

impl RefreshHandle {
    /// Request an immediate full refresh
    pub fn request_refresh(&self) {
        self.submit(RefreshTrigger::Manual);
    }

    /// Request a full refresh after `delay`.
    ///
    /// Used after successful admin actions: the short delay gives server-side
    /// state time to settle before it is re-read.
    pub fn refresh_after(&self, delay: Duration) {
        let trigger_tx = self.trigger_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if trigger_tx.send(RefreshTrigger::PostAction).await.is_err() {
                debug!("scheduler gone; dropping post-action refresh");
            }
        });
    }

    /// Switch the chart window; only the time-series view is re-derived
    pub fn change_time_range(&self, range: TimeRange) {
        self.submit(RefreshTrigger::RangeChanged(range));
    }

    fn submit(&self, trigger: RefreshTrigger) {
        if let Err(err) = self.trigger_tx.try_send(trigger) {
            warn!(error = %err, "refresh trigger dropped");
        }
    }
}

/// Drives the controller from timer ticks and submitted triggers
#[derive(Debug)]
pub struct RefreshScheduler {
    trigger_rx: mpsc::Receiver<RefreshTrigger>,
    shutdown_tx: broadcast::Sender<()>,
    interval: Duration,
}

impl RefreshScheduler {
    /// Create a scheduler with the given periodic interval, plus a handle for
    /// submitting triggers to it
    #[must_use]
    pub fn new(interval: Duration) -> (Self, RefreshHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(32);
        let (shutdown_tx, _) = broadcast::channel(1);
        (
            Self {
                trigger_rx,
                shutdown_tx,
                interval,
            },
            RefreshHandle { trigger_tx },
        )
    }

    /// Sender half of the shutdown signal; sending stops [`Self::run`]
    #[must_use]
    pub fn shutdown_sender(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Run the scheduling loop until shutdown.
    ///
    /// Performs one refresh immediately (initial page load), then services the
    /// periodic timer and the trigger channel. Returns when the shutdown
    /// signal fires or every trigger handle is dropped.
    pub async fn run<R: Renderer>(mut self, controller: &mut DashboardController<R>) {
        controller.refresh().await;

        let mut ticker =
            tokio::time::interval_at(tokio::time::Instant::now() + self.interval, self.interval);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!("periodic refresh");
                    controller.refresh().await;
                }
                trigger = self.trigger_rx.recv() => {
                    match trigger {
                        Some(RefreshTrigger::Manual) => {
                            debug!("manual refresh");
                            controller.refresh().await;
                        }
                        Some(RefreshTrigger::PostAction) => {
                            debug!("post-action refresh");
                            controller.refresh().await;
                        }
                        Some(RefreshTrigger::RangeChanged(range)) => {
                            debug!(range = %range, "time range changed");
                            controller.change_time_range(range).await;
                        }
                        None => {
                            debug!("all trigger handles dropped");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("refresh scheduler shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
impl RefreshScheduler {
    /// Receive the next queued trigger without running the loop (test helper)
    pub(crate) async fn next_trigger(&mut self) -> Option<RefreshTrigger> {
        self.trigger_rx.recv().await
    }
}
