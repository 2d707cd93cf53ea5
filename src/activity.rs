//! Learner activity log entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::curriculum::LevelId;

/// Route of the fact-vs-myth game
pub const FACT_CHECK_ROUTE: &str = "/fact-check";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    LevelComplete,
    ModuleView,
    FactMyth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub kind: ActivityKind,
    pub title: String,
    pub url: String,
    pub at: DateTime<Utc>,
}

impl Activity {
    fn new(kind: ActivityKind, title: String, url: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title,
            url,
            at: Utc::now(),
        }
    }

    pub fn level_complete(level: &LevelId) -> Self {
        Self::new(
            ActivityKind::LevelComplete,
            format!("Completed Level {}", level),
            lesson_route(level),
        )
    }

    pub fn module_view(route: &str) -> Self {
        Self::new(
            ActivityKind::ModuleView,
            "Viewed Learning Module".to_string(),
            route.to_string(),
        )
    }

    pub fn fact_myth() -> Self {
        Self::new(
            ActivityKind::FactMyth,
            "Played Fact vs Myth".to_string(),
            FACT_CHECK_ROUTE.to_string(),
        )
    }
}

/// Route of a level's lesson page
pub fn lesson_route(level: &LevelId) -> String {
    format!("/learn/{}", level)
}
