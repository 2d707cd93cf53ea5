//! Level gating and journey navigation
//!
//! The tracker records completions without checking prerequisites; callers
//! that need the unlock order enforced (lesson pages, the API) go through
//! here.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::curriculum::{Curriculum, LevelId};
use crate::error::ProgressError;
use crate::tracker::ProgressTracker;

/// Status of a level on the journey path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStatus {
    Completed,
    Current,
    Unlocked,
    Locked,
}

/// Previous/next links around a level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelNav {
    pub prev: Option<LevelId>,
    pub next: Option<LevelId>,
}

pub fn level_status(tracker: &ProgressTracker, level_id: &str) -> Option<LevelStatus> {
    if !tracker.curriculum().contains(level_id) {
        return None;
    }

    let state = tracker.state();
    let status = if state.is_completed(level_id) {
        LevelStatus::Completed
    } else if state.current_level().as_str() == level_id {
        LevelStatus::Current
    } else if tracker.is_level_unlocked(level_id) {
        LevelStatus::Unlocked
    } else {
        LevelStatus::Locked
    };
    Some(status)
}

/// Status of every level in curriculum order
pub fn journey(tracker: &ProgressTracker) -> Vec<(LevelId, LevelStatus)> {
    tracker
        .curriculum()
        .iter()
        .filter_map(|level| {
            level_status(tracker, level.id.as_str()).map(|status| (level.id.clone(), status))
        })
        .collect()
}

/// Check that a level exists and is unlocked
pub fn access(tracker: &ProgressTracker, level_id: &str) -> Result<(), ProgressError> {
    if !tracker.curriculum().contains(level_id) {
        return Err(ProgressError::UnknownLevel(level_id.to_string()));
    }

    let missing = tracker.missing_prerequisites(level_id);
    if !missing.is_empty() {
        return Err(ProgressError::LevelLocked {
            level: level_id.to_string(),
            missing: missing.into_iter().map(|l| l.to_string()).collect(),
        });
    }

    Ok(())
}

/// Complete a level only if it is unlocked.
///
/// Returns `Ok(false)` when the level was already completed.
pub fn try_complete(tracker: &mut ProgressTracker, level_id: &str) -> Result<bool, ProgressError> {
    access(tracker, level_id)?;
    Ok(tracker.complete_level(level_id))
}

/// Open a level's lesson, recording it as the last visited route
pub fn enter_level(tracker: &mut ProgressTracker, level_id: &str) -> Result<(), ProgressError> {
    access(tracker, level_id)?;
    tracker.visit_level(level_id);
    debug!(user_id = %tracker.user_id(), level = level_id, "Entered level");
    Ok(())
}

pub fn neighbours(curriculum: &Curriculum, level_id: &str) -> Option<LevelNav> {
    curriculum.position(level_id)?;
    Some(LevelNav {
        prev: curriculum.previous_before(level_id).map(|l| l.id.clone()),
        next: curriculum.next_after(level_id).map(|l| l.id.clone()),
    })
}
