//! Rewind buffer configuration, loaded from TOML.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error reading {file}: {source}")]
    Io {
        file: PathBuf,
        source: std::io::Error,
    },
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How many checkpoints to retain and how often the caller should take them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RewindConfig {
    /// Number of retained checkpoints. Clamped to at least 1.
    pub capacity: usize,
    /// Suggested spacing between periodic checkpoints. 0 disables them.
    pub interval_tics: u64,
}

impl Default for RewindConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            interval_tics: 35,
        }
    }
}

impl RewindConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: RewindConfig = toml::from_str(text)?;
        config.capacity = config.capacity.max(1);
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            file: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn is_checkpoint_tic(&self, tic: u64) -> bool {
        self.interval_tics != 0 && tic % self.interval_tics == 0
    }
}
