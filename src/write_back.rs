//! Fire-and-forget persistence of progress snapshots
//!
//! The tracker hands every new snapshot to a `WriteBack` sender and moves on.
//! A single worker task drains the queue in order and talks to the store.
//!
//! ```text
//! ProgressTracker ──(unbounded mpsc)──► worker task ──► ProgressStore
//!                                          │
//!                                          └─ retries, logs failures
//! ```
//!
//! A failed write never reaches the tracker: the in-memory state stays
//! authoritative and the failure is logged and counted.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::activity::Activity;
use crate::config::WriteBackConfig;
use crate::error::ProgressError;
use crate::state::{ProgressState, UserId};
use crate::store::ProgressStore;

enum Job {
    Save { user_id: UserId, state: ProgressState },
    Activity { user_id: UserId, activity: Activity },
}

/// Counters reported when the worker stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteBackStats {
    pub saved: u64,
    pub activities: u64,
    /// Jobs dropped after exhausting retries
    pub failures: u64,
}

/// Sending half, owned by a tracker
#[derive(Clone)]
pub struct WriteBack {
    tx: mpsc::UnboundedSender<Job>,
}

/// Worker handle, awaited at session end
pub struct WriteBackHandle {
    task: JoinHandle<WriteBackStats>,
}

impl WriteBack {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(
        store: Arc<dyn ProgressStore>,
        config: WriteBackConfig,
    ) -> (WriteBack, WriteBackHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(worker_task(store, config, rx));
        (WriteBack { tx }, WriteBackHandle { task })
    }

    pub fn save(&self, user_id: &UserId, state: ProgressState) {
        self.submit(Job::Save {
            user_id: user_id.clone(),
            state,
        });
    }

    pub fn record_activity(&self, user_id: &UserId, activity: Activity) {
        self.submit(Job::Activity {
            user_id: user_id.clone(),
            activity,
        });
    }

    fn submit(&self, job: Job) {
        if self.tx.send(job).is_err() {
            warn!("Write-back worker has stopped, progress update not persisted");
        }
    }
}

impl WriteBackHandle {
    /// Wait for the worker to drain its queue.
    ///
    /// The worker exits once every `WriteBack` clone has been dropped.
    pub async fn finish(self) -> WriteBackStats {
        match self.task.await {
            Ok(stats) => stats,
            Err(e) => {
                error!(error = %e, "Write-back worker panicked");
                WriteBackStats::default()
            }
        }
    }
}

async fn worker_task(
    store: Arc<dyn ProgressStore>,
    config: WriteBackConfig,
    mut rx: mpsc::UnboundedReceiver<Job>,
) -> WriteBackStats {
    let mut stats = WriteBackStats::default();
    debug!("Write-back worker started");

    while let Some(job) = rx.recv().await {
        let mut batch = vec![job];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        for job in coalesce(batch) {
            match job {
                Job::Save { user_id, state } => {
                    let result = with_retries(&config, "save", || store.save(&user_id, &state)).await;
                    match result {
                        Ok(()) => stats.saved += 1,
                        Err(e) => {
                            stats.failures += 1;
                            error!(
                                user_id = %user_id,
                                xp = state.xp(),
                                error = %e,
                                "Failed to persist progress, keeping in-memory state"
                            );
                        }
                    }
                }
                Job::Activity { user_id, activity } => {
                    let result = with_retries(&config, "record_activity", || {
                        store.record_activity(&user_id, &activity)
                    })
                    .await;
                    match result {
                        Ok(()) => stats.activities += 1,
                        Err(e) => {
                            stats.failures += 1;
                            error!(
                                user_id = %user_id,
                                kind = ?activity.kind,
                                error = %e,
                                "Failed to record activity"
                            );
                        }
                    }
                }
            }
        }
    }

    info!(
        saved = stats.saved,
        activities = stats.activities,
        failures = stats.failures,
        "Write-back worker stopped"
    );
    stats
}

/// Drop a save when a later save for the same user directly follows it.
/// Activities are never merged and keep their position.
fn coalesce(batch: Vec<Job>) -> Vec<Job> {
    let mut out: Vec<Job> = Vec::with_capacity(batch.len());
    for job in batch {
        if let (Job::Save { user_id: next, .. }, Some(Job::Save { user_id: prev, .. })) =
            (&job, out.last())
        {
            if next == prev {
                out.pop();
            }
        }
        out.push(job);
    }
    out
}

async fn with_retries<F, Fut>(
    config: &WriteBackConfig,
    operation: &str,
    mut call: F,
) -> Result<(), ProgressError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), ProgressError>>,
{
    let mut attempt = 0u32;
    loop {
        match call().await {
            Ok(()) => return Ok(()),
            Err(e) if attempt < config.max_retries => {
                attempt += 1;
                warn!(
                    operation,
                    attempt,
                    max_retries = config.max_retries,
                    error = %e,
                    "Store call failed, retrying"
                );
                let backoff = config.retry_backoff_ms.saturating_mul(attempt as u64);
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }
            Err(e) => return Err(e),
        }
    }
}
