//! Progress state and its derived read model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::warn;

use crate::curriculum::{Curriculum, LevelId};

/// XP needed per display tier
pub const XP_PER_TIER: u64 = 100;

/// Identity of a learner
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fact-vs-myth game counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MythFactStats {
    pub correct: u32,
    pub total: u32,
}

/// Per-learner advancement state.
///
/// Fields are private: only [`crate::ProgressTracker`] mutates a state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    current_level: LevelId,
    xp: u64,
    completed_levels: Vec<LevelId>,
    #[serde(default)]
    streak: u32,
    #[serde(default)]
    last_visited_route: Option<String>,
    #[serde(default)]
    myth_fact: MythFactStats,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl ProgressState {
    /// Fresh state positioned on the curriculum's first level
    pub fn new(curriculum: &Curriculum) -> Self {
        Self {
            current_level: curriculum.first().id.clone(),
            xp: 0,
            completed_levels: Vec::new(),
            streak: 0,
            last_visited_route: None,
            myth_fact: MythFactStats::default(),
            updated_at: None,
        }
    }

    pub fn current_level(&self) -> &LevelId {
        &self.current_level
    }

    pub fn xp(&self) -> u64 {
        self.xp
    }

    /// Completed levels in completion order
    pub fn completed_levels(&self) -> &[LevelId] {
        &self.completed_levels
    }

    pub fn is_completed(&self, id: &str) -> bool {
        self.completed_levels.iter().any(|l| l.as_str() == id)
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn last_visited_route(&self) -> Option<&str> {
        self.last_visited_route.as_deref()
    }

    pub fn myth_fact(&self) -> MythFactStats {
        self.myth_fact
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Display tier derived from XP, starting at 1
    pub fn tier(&self) -> u64 {
        self.xp / XP_PER_TIER + 1
    }

    pub(crate) fn add_xp(&mut self, amount: u64) {
        self.xp = self.xp.saturating_add(amount);
        self.streak = self.streak.saturating_add(1);
    }

    /// Returns false if the level was already completed
    pub(crate) fn push_completed(&mut self, id: LevelId) -> bool {
        if self.is_completed(id.as_str()) {
            return false;
        }
        self.completed_levels.push(id);
        true
    }

    pub(crate) fn advance_to(&mut self, curriculum: &Curriculum, id: &LevelId) {
        let target = curriculum.position(id.as_str());
        let current = curriculum.position(self.current_level.as_str());
        if let (Some(target), Some(current)) = (target, current) {
            if target > current {
                self.current_level = id.clone();
            }
        }
    }

    pub(crate) fn set_route(&mut self, route: &str) -> bool {
        if self.last_visited_route.as_deref() == Some(route) {
            return false;
        }
        self.last_visited_route = Some(route.to_string());
        true
    }

    pub(crate) fn record_myth_fact(&mut self, correct: bool) {
        self.myth_fact.total = self.myth_fact.total.saturating_add(1);
        if correct {
            self.myth_fact.correct = self.myth_fact.correct.saturating_add(1);
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 0;
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Reconcile a persisted state with the curriculum in use.
    ///
    /// Unknown and duplicate completions are dropped. An unknown current
    /// level is replaced by the furthest level the completions imply.
    pub fn sanitize(mut self, curriculum: &Curriculum) -> Self {
        let mut seen = HashSet::new();
        let before = self.completed_levels.len();
        self.completed_levels
            .retain(|l| curriculum.contains(l.as_str()) && seen.insert(l.clone()));
        if self.completed_levels.len() != before {
            warn!(
                dropped = before - self.completed_levels.len(),
                "Dropped unknown or duplicate completed levels from stored progress"
            );
        }

        if !curriculum.contains(self.current_level.as_str()) {
            warn!(level = %self.current_level, "Stored current level is not in the curriculum");
            self.current_level = curriculum.first().id.clone();
            let completed = self.completed_levels.clone();
            for id in &completed {
                let next = curriculum
                    .next_after(id.as_str())
                    .map(|l| l.id.clone())
                    .unwrap_or_else(|| id.clone());
                self.advance_to(curriculum, &next);
            }
        }

        self
    }
}

/// Summary served to dashboards and API callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
    pub percentage: u32,
    pub xp: u64,
    pub streak: u32,
    pub tier: u64,
    pub current_level: LevelId,
    pub completed_levels: Vec<LevelId>,
    pub unlocked_levels: Vec<LevelId>,
    pub last_visited_route: Option<String>,
    pub myth_fact: MythFactStats,
}

impl ProgressSummary {
    pub(crate) fn build(state: &ProgressState, curriculum: &Curriculum) -> Self {
        let completed = state.completed_levels.len();
        let total = curriculum.len();
        let percentage = if total == 0 {
            0
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };

        let unlocked_levels = curriculum
            .iter()
            .filter(|level| level.prerequisites.iter().all(|p| state.is_completed(p.as_str())))
            .map(|level| level.id.clone())
            .collect();

        Self {
            completed,
            total,
            percentage,
            xp: state.xp,
            streak: state.streak,
            tier: state.tier(),
            current_level: state.current_level.clone(),
            completed_levels: state.completed_levels.clone(),
            unlocked_levels,
            last_visited_route: state.last_visited_route.clone(),
            myth_fact: state.myth_fact,
        }
    }
}
