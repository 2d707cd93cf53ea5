//! Static level catalog
//!
//! The curriculum is the fixed, totally ordered sequence of learning levels
//! together with each level's prerequisite set. It is supplied once at
//! startup and never mutated afterwards.
//!
//! ## File format
//!
//! ```toml
//! [[levels]]
//! id = "level-1"
//! title = "Election Basics"
//!
//! [[levels]]
//! id = "level-2"
//! title = "How Elections Work"
//! prerequisites = ["level-1"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::info;

use crate::error::ProgressError;

/// Identifier of a level, e.g. `level-3`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(String);

impl LevelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LevelId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for LevelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One entry of the curriculum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub id: LevelId,
    pub title: String,
    /// Levels that must be completed before this one unlocks
    #[serde(default)]
    pub prerequisites: Vec<LevelId>,
}

impl LevelSpec {
    pub fn new(id: &str, title: &str, prerequisites: &[&str]) -> Self {
        Self {
            id: LevelId::from(id),
            title: title.to_string(),
            prerequisites: prerequisites.iter().map(|p| LevelId::from(*p)).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurriculumFile {
    levels: Vec<LevelSpec>,
}

/// Ordered, validated level catalog
#[derive(Debug, Clone)]
pub struct Curriculum {
    levels: Vec<LevelSpec>,
    index: HashMap<LevelId, usize>,
}

impl Curriculum {
    /// Build a curriculum, rejecting empty tables, duplicate ids and
    /// prerequisites that don't name an earlier level.
    pub fn new(levels: Vec<LevelSpec>) -> Result<Self, ProgressError> {
        if levels.is_empty() {
            return Err(ProgressError::InvalidCurriculum(
                "curriculum has no levels".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(levels.len());
        for (position, level) in levels.iter().enumerate() {
            if level.id.as_str().is_empty() {
                return Err(ProgressError::InvalidCurriculum(format!(
                    "level at position {} has an empty id",
                    position
                )));
            }

            // Prerequisites may only point backwards, so the table is acyclic
            // and the first level is always open.
            for prereq in &level.prerequisites {
                if !index.contains_key(prereq) {
                    return Err(ProgressError::InvalidCurriculum(format!(
                        "level {} requires {}, which is not an earlier level",
                        level.id, prereq
                    )));
                }
            }

            if index.insert(level.id.clone(), position).is_some() {
                return Err(ProgressError::InvalidCurriculum(format!(
                    "duplicate level id {}",
                    level.id
                )));
            }
        }

        Ok(Self { levels, index })
    }

    /// The seven election-system levels, each gated on the one before it
    pub fn civic_default() -> Self {
        let levels = vec![
            LevelSpec::new("level-1", "Election Basics", &[]),
            LevelSpec::new("level-2", "How Elections Work", &["level-1"]),
            LevelSpec::new("level-3", "ONOE Explained", &["level-2"]),
            LevelSpec::new("level-4", "Pros & Cons", &["level-3"]),
            LevelSpec::new("level-5", "Reality Check", &["level-4"]),
            LevelSpec::new("level-6", "Simulation Mode", &["level-5"]),
            LevelSpec::new("level-7", "Knowledge Check", &["level-6"]),
        ];

        let mut index = HashMap::with_capacity(levels.len());
        for (position, level) in levels.iter().enumerate() {
            index.insert(level.id.clone(), position);
        }
        Self { levels, index }
    }

    /// Load a curriculum from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProgressError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let curriculum = Self::from_toml(&content)?;
        info!(
            path = %path.as_ref().display(),
            levels = curriculum.len(),
            "Loaded curriculum"
        );
        Ok(curriculum)
    }

    pub fn from_toml(content: &str) -> Result<Self, ProgressError> {
        let file: CurriculumFile = toml::from_str(content)?;
        Self::new(file.levels)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(&LevelId::from(id))
    }

    pub fn get(&self, id: &str) -> Option<&LevelSpec> {
        self.position(id).map(|i| &self.levels[i])
    }

    /// Position of a level in the sequence
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(&LevelId::from(id)).copied()
    }

    pub fn first(&self) -> &LevelSpec {
        &self.levels[0]
    }

    pub fn next_after(&self, id: &str) -> Option<&LevelSpec> {
        self.position(id).and_then(|i| self.levels.get(i + 1))
    }

    pub fn previous_before(&self, id: &str) -> Option<&LevelSpec> {
        self.position(id)
            .and_then(|i| i.checked_sub(1))
            .map(|i| &self.levels[i])
    }

    /// Prerequisites of a level, `None` if the level is unknown
    pub fn prerequisites(&self, id: &str) -> Option<&[LevelId]> {
        self.get(id).map(|l| l.prerequisites.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelSpec> {
        self.levels.iter()
    }
}
