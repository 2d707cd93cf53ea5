//! Error types for civic-progress

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgressError {
    #[error("Unknown level: {0}")]
    UnknownLevel(String),

    #[error("Level {level} is locked, missing prerequisites: {missing:?}")]
    LevelLocked { level: String, missing: Vec<String> },

    #[error("XP amount must be positive, got {0}")]
    InvalidXp(i64),

    #[error("Invalid curriculum: {0}")]
    InvalidCurriculum(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}
