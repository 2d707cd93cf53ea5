//! In-memory progress store

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::ProgressStore;
use crate::activity::Activity;
use crate::error::ProgressError;
use crate::state::{ProgressState, UserId};

/// Process-local store.
///
/// Can be switched unavailable to simulate a backend outage: while
/// unavailable every call fails with `ProgressError::Persistence`.
pub struct MemoryStore {
    progress: DashMap<UserId, ProgressState>,
    activity: DashMap<UserId, Vec<Activity>>,
    available: AtomicBool,
    save_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            progress: DashMap::new(),
            activity: DashMap::new(),
            available: AtomicBool::new(true),
            save_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Total `save` attempts, including failed ones
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::Relaxed)
    }

    pub fn stored(&self, user_id: &UserId) -> Option<ProgressState> {
        self.progress.get(user_id).map(|entry| entry.clone())
    }

    fn check_available(&self) -> Result<(), ProgressError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(ProgressError::Persistence("store unavailable".to_string()))
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<ProgressState>, ProgressError> {
        self.check_available()?;
        Ok(self.stored(user_id))
    }

    async fn save(&self, user_id: &UserId, state: &ProgressState) -> Result<(), ProgressError> {
        self.save_calls.fetch_add(1, Ordering::Relaxed);
        self.check_available()?;
        self.progress.insert(user_id.clone(), state.clone());
        Ok(())
    }

    async fn record_activity(
        &self,
        user_id: &UserId,
        activity: &Activity,
    ) -> Result<(), ProgressError> {
        self.check_available()?;
        self.activity
            .entry(user_id.clone())
            .or_default()
            .push(activity.clone());
        Ok(())
    }

    async fn recent_activity(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Activity>, ProgressError> {
        self.check_available()?;
        Ok(self
            .activity
            .get(user_id)
            .map(|entries| entries.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
