//! Civic Progress - learning progress tracking for civic-education lessons
//!
//! Tracks per-learner advancement through a fixed sequence of lesson levels:
//! experience points earned from interactive widgets, completed levels, and
//! the unlock order between them.
//!
//! ## Architecture
//!
//! ```text
//! lesson widgets ──► ProgressTracker ◄── navigation (unlock gating)
//!                        │    │
//!          subscribers ◄─┘    └─► WriteBack ──► ProgressStore (sled / memory)
//! ```
//!
//! - **ProgressTracker**: single in-memory authority for one learner's state
//! - **Curriculum**: static level table with prerequisites
//! - **LearnerSession**: scope that loads state at start and drains writes at end
//! - **WriteBack**: asynchronous, best-effort persistence; failures never roll
//!   back in-memory state
//!
//! ## Storage Layout
//!
//! ```text
//! ~/.local/share/civic-progress/
//! ├── progress.sled/         # Progress and activity trees
//! └── config.toml            # Configuration
//! ```

pub mod activity;
pub mod api;
pub mod config;
pub mod curriculum;
pub mod error;
pub mod lessons;
pub mod navigation;
pub mod observer;
pub mod session;
pub mod state;
pub mod store;
pub mod tracker;
pub mod write_back;

// Re-exports
pub use activity::{Activity, ActivityKind};
pub use api::{ProgressRequest, ProgressResponse};
pub use config::{Config, WriteBackConfig};
pub use curriculum::{Curriculum, LevelId, LevelSpec};
pub use error::ProgressError;
pub use lessons::{Engagement, Rewards};
pub use navigation::{LevelNav, LevelStatus};
pub use observer::SubscriptionId;
pub use session::{LearnerSession, SessionReport};
pub use state::{MythFactStats, ProgressState, ProgressSummary, UserId};
pub use store::{MemoryStore, ProgressStore, SledStore};
pub use tracker::ProgressTracker;
pub use write_back::{WriteBack, WriteBackHandle, WriteBackStats};
