//! Background expiry sweeps
//!
//! Expired entries that are never read again would otherwise stay around
//! until the process exits (volatile) or forever (persistent). The sweeper
//! runs both tiers' `sweep_expired` on their own intervals until shut down.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::hybrid::HybridCache;

/// How often each tier is swept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepIntervals {
    pub volatile: Duration,
    pub persistent: Duration,
}

impl Default for SweepIntervals {
    fn default() -> Self {
        Self {
            volatile: Duration::from_secs(2 * 60),
            persistent: Duration::from_secs(5 * 60),
        }
    }
}

/// Handle to the running sweep task.
///
/// Dropping the handle aborts the task; [`Sweeper::shutdown`] stops it
/// cleanly and waits for it to finish.
pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn the sweep task on the current tokio runtime
    pub fn start(cache: Arc<HybridCache>, intervals: SweepIntervals) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(sweep_task(cache, intervals, shutdown_rx));
        Self {
            shutdown_tx,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the task to stop and wait for it
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            log::warn!("Cache sweeper ended abnormally: {}", e);
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

async fn sweep_task(
    cache: Arc<HybridCache>,
    intervals: SweepIntervals,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // The persistent tier already swept once when it was opened
    let now = Instant::now();
    let mut volatile_tick = interval_at(now + intervals.volatile, intervals.volatile);
    volatile_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut persistent_tick = interval_at(now + intervals.persistent, intervals.persistent);
    persistent_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    log::info!(
        "Cache sweeper started (volatile every {}s, persistent every {}s)",
        intervals.volatile.as_secs(),
        intervals.persistent.as_secs()
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    log::info!("Cache sweeper shutting down");
                    break;
                }
            }

            _ = volatile_tick.tick() => {
                let removed = cache.volatile().sweep_expired();
                if removed > 0 {
                    log::debug!("Swept {} expired volatile entries", removed);
                }
            }

            _ = persistent_tick.tick() => {
                let removed = cache.persistent().sweep_expired();
                if removed > 0 {
                    log::debug!("Swept {} expired persistent entries", removed);
                }
            }
        }
    }
}

impl HybridCache {
    /// Start periodic sweeping for a shared cache
    pub fn start_sweeper(self: &Arc<Self>, intervals: SweepIntervals) -> Sweeper {
        Sweeper::start(Arc::clone(self), intervals)
    }
}
