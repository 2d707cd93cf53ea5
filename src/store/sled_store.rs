//! Embedded progress database
//!
//! Two sled trees:
//! - `progress`: user id -> MessagePack `ProgressState`
//! - `activity`: `len(user id) user id sequence` -> MessagePack `Activity`
//!
//! Activity keys start with the user id behind a big-endian `u32` length,
//! so no user's prefix is a prefix of another's. The trailing big-endian
//! sequence number from `Db::generate_id` keeps a prefix scan in insertion
//! order.

use async_trait::async_trait;
use sled::{Db, Tree};
use std::path::Path;
use tracing::{debug, info};

use super::ProgressStore;
use crate::activity::Activity;
use crate::error::ProgressError;
use crate::state::{ProgressState, UserId};

const PROGRESS_TREE: &str = "progress";
const ACTIVITY_TREE: &str = "activity";

pub struct SledStore {
    db: Db,
    progress: Tree,
    activity: Tree,
}

impl SledStore {
    /// Open or create the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ProgressError> {
        let db = sled::open(path.as_ref())?;
        let progress = db.open_tree(PROGRESS_TREE)?;
        let activity = db.open_tree(ACTIVITY_TREE)?;
        info!(path = %path.as_ref().display(), "Opened progress database");
        Ok(Self {
            db,
            progress,
            activity,
        })
    }

    /// Number of users with stored progress
    pub fn user_count(&self) -> usize {
        self.progress.len()
    }

    fn activity_prefix(user_id: &UserId) -> Vec<u8> {
        let id = user_id.as_str().as_bytes();
        let mut prefix = Vec::with_capacity(4 + id.len() + 8);
        prefix.extend_from_slice(&(id.len() as u32).to_be_bytes());
        prefix.extend_from_slice(id);
        prefix
    }
}

#[async_trait]
impl ProgressStore for SledStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<ProgressState>, ProgressError> {
        match self.progress.get(user_id.as_str().as_bytes())? {
            Some(value) => {
                let state = rmp_serde::from_slice(&value).map_err(|e| {
                    ProgressError::Serialization(format!("Deserialization error: {}", e))
                })?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, user_id: &UserId, state: &ProgressState) -> Result<(), ProgressError> {
        let value = rmp_serde::to_vec(state)
            .map_err(|e| ProgressError::Serialization(format!("Serialization error: {}", e)))?;
        self.progress.insert(user_id.as_str().as_bytes(), value)?;
        self.db.flush_async().await?;
        debug!(user_id = %user_id, xp = state.xp(), "Saved progress");
        Ok(())
    }

    async fn record_activity(
        &self,
        user_id: &UserId,
        activity: &Activity,
    ) -> Result<(), ProgressError> {
        let mut key = Self::activity_prefix(user_id);
        key.extend_from_slice(&self.db.generate_id()?.to_be_bytes());

        let value = rmp_serde::to_vec(activity)
            .map_err(|e| ProgressError::Serialization(format!("Serialization error: {}", e)))?;
        self.activity.insert(key, value)?;
        debug!(user_id = %user_id, kind = ?activity.kind, "Recorded activity");
        Ok(())
    }

    async fn recent_activity(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Activity>, ProgressError> {
        let mut result = Vec::new();
        for item in self.activity.scan_prefix(Self::activity_prefix(user_id)).rev() {
            if result.len() >= limit {
                break;
            }
            let (_, value) = item?;
            let activity: Activity = rmp_serde::from_slice(&value).map_err(|e| {
                ProgressError::Serialization(format!("Deserialization error: {}", e))
            })?;
            result.push(activity);
        }
        Ok(result)
    }
}
