//! Per-session progress tracker
//!
//! The tracker is the single in-memory authority for a learner's
//! `ProgressState`. Lesson widgets report engagement through its mutation
//! operations, navigation reads it to gate levels.
//!
//! ## Mutation contract
//!
//! - Invalid input (non-positive XP, unknown level) is a no-op, never an error
//! - A call that changes the state notifies subscribers synchronously, in
//!   call order, then queues the snapshot for write-back
//! - A call that changes nothing neither notifies nor persists
//! - `complete_level` does not check prerequisites; use
//!   [`crate::navigation::try_complete`] for gated completion

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::activity::{Activity, lesson_route};
use crate::curriculum::{Curriculum, LevelId};
use crate::observer::{ObserverSet, SubscriptionId};
use crate::state::{ProgressState, ProgressSummary, UserId};
use crate::write_back::WriteBack;

pub struct ProgressTracker {
    user_id: UserId,
    curriculum: Arc<Curriculum>,
    state: ProgressState,
    observers: ObserverSet,
    write_back: Option<WriteBack>,
}

impl ProgressTracker {
    /// Tracker with a fresh default state
    pub fn new(user_id: UserId, curriculum: Arc<Curriculum>) -> Self {
        let state = ProgressState::new(&curriculum);
        Self {
            user_id,
            curriculum,
            state,
            observers: ObserverSet::default(),
            write_back: None,
        }
    }

    /// Tracker resuming a persisted state, sanitized against the curriculum
    pub fn restore(user_id: UserId, curriculum: Arc<Curriculum>, state: ProgressState) -> Self {
        let state = state.sanitize(&curriculum);
        Self {
            user_id,
            curriculum,
            state,
            observers: ObserverSet::default(),
            write_back: None,
        }
    }

    /// Propagate every change to the given write-back queue
    pub fn with_write_back(mut self, write_back: WriteBack) -> Self {
        self.write_back = Some(write_back);
        self
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    /// Read-only view of the current state
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> ProgressState {
        self.state.clone()
    }

    pub fn summary(&self) -> ProgressSummary {
        ProgressSummary::build(&self.state, &self.curriculum)
    }

    /// Add XP. Non-positive amounts are ignored.
    pub fn award_xp(&mut self, amount: i64) -> bool {
        if amount <= 0 {
            debug!(user_id = %self.user_id, amount, "Ignoring non-positive XP award");
            return false;
        }

        self.state.add_xp(amount as u64);
        debug!(user_id = %self.user_id, amount, xp = self.state.xp(), "Awarded XP");
        self.commit(None);
        true
    }

    /// Mark a level completed. Idempotent; unknown levels are ignored.
    pub fn complete_level(&mut self, level_id: &str) -> bool {
        let Some(level) = self.curriculum.get(level_id) else {
            warn!(user_id = %self.user_id, level = level_id, "Ignoring completion of unknown level");
            return false;
        };
        let id = level.id.clone();

        if !self.state.push_completed(id.clone()) {
            debug!(user_id = %self.user_id, level = %id, "Level already completed");
            return false;
        }

        let next = self
            .curriculum
            .next_after(id.as_str())
            .map(|l| l.id.clone())
            .unwrap_or_else(|| id.clone());
        self.state.advance_to(&self.curriculum, &next);

        info!(
            user_id = %self.user_id,
            level = %id,
            current_level = %self.state.current_level(),
            "Level completed"
        );
        self.commit(Some(Activity::level_complete(&id)));
        true
    }

    /// True when every prerequisite of the level is completed.
    /// Unknown levels are never unlocked.
    pub fn is_level_unlocked(&self, level_id: &str) -> bool {
        match self.curriculum.prerequisites(level_id) {
            Some(prerequisites) => prerequisites
                .iter()
                .all(|p| self.state.is_completed(p.as_str())),
            None => false,
        }
    }

    /// Prerequisites of a level that are not completed yet
    pub fn missing_prerequisites(&self, level_id: &str) -> Vec<LevelId> {
        self.curriculum
            .prerequisites(level_id)
            .map(|prerequisites| {
                prerequisites
                    .iter()
                    .filter(|p| !self.state.is_completed(p.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Record one fact-vs-myth answer
    pub fn record_myth_fact_result(&mut self, correct: bool) {
        self.state.record_myth_fact(correct);
        debug!(
            user_id = %self.user_id,
            correct,
            streak = self.state.streak(),
            "Recorded fact-vs-myth result"
        );
        self.commit(Some(Activity::fact_myth()));
    }

    /// Remember the last viewed lesson route
    pub fn set_last_visited(&mut self, route: &str) -> bool {
        if route.is_empty() || !self.state.set_route(route) {
            return false;
        }
        self.commit(Some(Activity::module_view(route)));
        true
    }

    /// Remember a level's lesson page as the last viewed route
    pub fn visit_level(&mut self, level_id: &str) -> bool {
        match self.curriculum.get(level_id) {
            Some(level) => {
                let route = lesson_route(&level.id);
                self.set_last_visited(&route)
            }
            None => false,
        }
    }

    /// Restart the course from the first level
    pub fn reset(&mut self) {
        self.state = ProgressState::new(&self.curriculum);
        info!(user_id = %self.user_id, "Progress reset");
        self.commit(None);
    }

    /// Register a callback invoked after every successful mutation
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ProgressState) + Send + 'static,
    {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    fn commit(&mut self, activity: Option<Activity>) {
        self.state.touch();
        self.observers.notify(&self.state);

        if let Some(write_back) = &self.write_back {
            write_back.save(&self.user_id, self.state.clone());
            if let Some(activity) = activity {
                write_back.record_activity(&self.user_id, activity);
            }
        }
    }
}
