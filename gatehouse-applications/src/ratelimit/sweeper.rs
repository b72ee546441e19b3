//! Periodic maintenance sweeper
//!
//! One background task evicts idle rate-limit buckets and expired sessions.
//! It is started explicitly and stopped through the returned handle.

use super::BucketStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Something the sweeper cleans up on every tick
pub trait Sweep: Send + Sync {
    fn name(&self) -> &'static str;

    /// Remove stale entries, returning how many were removed
    fn sweep(&self) -> usize;
}

/// Evicts buckets idle beyond the retention window
pub struct IdleBucketSweep {
    store: Arc<BucketStore>,
    retention: Duration,
}

impl IdleBucketSweep {
    pub fn new(store: Arc<BucketStore>, retention: Duration) -> Self {
        Self { store, retention }
    }
}

impl Sweep for IdleBucketSweep {
    fn name(&self) -> &'static str {
        "rate_limit_buckets"
    }

    fn sweep(&self) -> usize {
        self.store.evict_idle(self.retention)
    }
}

pub struct MaintenanceSweeper {
    interval: Duration,
    targets: Vec<Arc<dyn Sweep>>,
}

impl MaintenanceSweeper {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: Arc<dyn Sweep>) -> Self {
        self.targets.push(target);
        self
    }

    /// Sweep every target once
    pub fn run_once(&self) -> usize {
        run_targets(&self.targets)
    }

    /// Start the background task; must be called inside a tokio runtime
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let MaintenanceSweeper { interval, targets } = self;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval_secs = interval.as_secs(), "Maintenance sweeper started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        run_targets(&targets);
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("Maintenance sweeper stopped");
        });

        SweeperHandle { shutdown_tx, task }
    }
}

fn run_targets(targets: &[Arc<dyn Sweep>]) -> usize {
    targets
        .iter()
        .map(|target| {
            let removed = target.sweep();
            if removed > 0 {
                info!(sweep = target.name(), removed, "Sweep removed stale entries");
            } else {
                debug!(sweep = target.name(), "Sweep found nothing to remove");
            }
            removed
        })
        .sum()
}

/// Shutdown handle for a running sweeper
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal shutdown and wait for the task to exit
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Maintenance sweeper task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
