//! Persistence boundary for learner progress
//!
//! The tracker never calls a store directly: snapshots reach it through the
//! write-back worker, and sessions read from it once at startup.
//!
//! - `SledStore` - embedded database under the storage directory
//! - `MemoryStore` - process-local map, used in tests and ephemeral runs

pub mod memory;
pub mod sled_store;

use async_trait::async_trait;

use crate::activity::Activity;
use crate::error::ProgressError;
use crate::state::{ProgressState, UserId};

pub use memory::MemoryStore;
pub use sled_store::SledStore;

/// Key-value store for progress keyed by user identity
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load persisted progress, `None` if the user has none yet
    async fn load(&self, user_id: &UserId) -> Result<Option<ProgressState>, ProgressError>;

    /// Overwrite the user's progress
    async fn save(&self, user_id: &UserId, state: &ProgressState) -> Result<(), ProgressError>;

    /// Append an entry to the user's activity log
    async fn record_activity(
        &self,
        user_id: &UserId,
        activity: &Activity,
    ) -> Result<(), ProgressError>;

    /// Most recent activity entries, newest first
    async fn recent_activity(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Activity>, ProgressError>;
}
