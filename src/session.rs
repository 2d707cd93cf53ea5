//! Learner session scope
//!
//! A session owns one learner's tracker from start (state loaded from the
//! store) to end (pending writes drained). There is no global tracker: each
//! consumer receives the session, or a borrow of its tracker, explicitly.

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::WriteBackConfig;
use crate::curriculum::Curriculum;
use crate::error::ProgressError;
use crate::state::{ProgressState, UserId};
use crate::store::ProgressStore;
use crate::tracker::ProgressTracker;
use crate::write_back::{WriteBack, WriteBackHandle, WriteBackStats};

/// Outcome of a finished session
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub state: ProgressState,
    pub write_back: WriteBackStats,
}

pub struct LearnerSession {
    tracker: ProgressTracker,
    write_back: WriteBackHandle,
}

impl LearnerSession {
    /// Start a session. A missing record starts fresh; a load error is
    /// returned and no session starts.
    pub async fn start(
        user_id: UserId,
        curriculum: Arc<Curriculum>,
        store: Arc<dyn ProgressStore>,
        config: WriteBackConfig,
    ) -> Result<Self, ProgressError> {
        let loaded = store.load(&user_id).await.map_err(|e| {
            warn!(user_id = %user_id, error = %e, "Failed to load progress");
            e
        })?;

        let tracker = match loaded {
            Some(state) => {
                info!(user_id = %user_id, xp = state.xp(), "Resuming stored progress");
                ProgressTracker::restore(user_id, curriculum, state)
            }
            None => {
                info!(user_id = %user_id, "No stored progress, starting at first level");
                ProgressTracker::new(user_id, curriculum)
            }
        };

        let (sender, handle) = WriteBack::spawn(store, config);
        Ok(Self {
            tracker: tracker.with_write_back(sender),
            write_back: handle,
        })
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ProgressTracker {
        &mut self.tracker
    }

    /// End the session, waiting for queued writes to finish
    pub async fn end(self) -> SessionReport {
        let Self { tracker, write_back } = self;
        let user_id = tracker.user_id().clone();
        let state = tracker.snapshot();
        drop(tracker);

        let stats = write_back.finish().await;
        info!(
            user_id = %user_id,
            xp = state.xp(),
            completed = state.completed_levels().len(),
            failures = stats.failures,
            "Session ended"
        );
        SessionReport {
            state,
            write_back: stats,
        }
    }
}
