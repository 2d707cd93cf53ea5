//! Configuration for civic-progress

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lessons::Rewards;

/// Default storage directory
pub fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("civic-progress")
}

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage directory for the progress database
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Curriculum TOML file (built-in civic curriculum if unset)
    #[serde(default)]
    pub curriculum_path: Option<PathBuf>,

    /// Persistence write-back settings
    #[serde(default)]
    pub write_back: WriteBackConfig,

    /// XP awarded per lesson engagement
    #[serde(default)]
    pub rewards: Rewards,
}

/// Write-back retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteBackConfig {
    /// Retries after the first failed store call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff per attempt in milliseconds (linear)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    200
}

impl Default for WriteBackConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            curriculum_path: None,
            write_back: WriteBackConfig::default(),
            rewards: Rewards::default(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Get progress database path
    pub fn database_path(&self) -> PathBuf {
        self.storage_dir.join("progress.sled")
    }

    /// Get config file path
    pub fn config_path(&self) -> PathBuf {
        self.storage_dir.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
storage_dir = "/tmp/civic"

[write_back]
max_retries = 5

[rewards]
swipe = 2
"#,
        )
        .unwrap();

        assert_eq!(config.storage_dir, PathBuf::from("/tmp/civic"));
        assert_eq!(config.write_back.max_retries, 5);
        assert_eq!(config.write_back.retry_backoff_ms, 200);
        assert_eq!(config.rewards.swipe, 2);
        assert_eq!(config.rewards.level_complete, 50);
        assert!(config.curriculum_path.is_none());
        assert_eq!(config.database_path(), PathBuf::from("/tmp/civic/progress.sled"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.storage_dir = dir.path().to_path_buf();
        config.rewards.quiz_complete = 15;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.storage_dir, dir.path());
        assert_eq!(loaded.rewards.quiz_complete, 15);
    }
}
