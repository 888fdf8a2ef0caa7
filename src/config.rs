//! Player configuration
//!
//! Read from an optional JSON file. `KEEPSAKE_STATE_DIR` overrides the
//! directory holding the flag file.

use crate::infrastructure::sequence_document::RevealDefaults;
use crate::lint::config::LintConfig;
use crate::sequencer::debug::DebugConfig;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STATE_DIR_ENV: &str = "KEEPSAKE_STATE_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Pacing for reveal blocks that do not set their own
    pub reveal: RevealDefaults,
    /// Directory of `flags.json`
    pub state_dir: PathBuf,
    pub debug: DebugConfig,
    pub lint: LintConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            reveal: RevealDefaults::default(),
            state_dir: PathBuf::from(".keepsake"),
            debug: DebugConfig::default(),
            lint: LintConfig::default(),
        }
    }
}

impl PlayerConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config = serde_json::from_str(json).context("invalid player config")?;
        Ok(config)
    }

    /// Load `path` if given, then apply environment overrides
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            Some(path) => {
                let json = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                Self::from_json(&json)?
            }
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = var(STATE_DIR_ENV).filter(|dir| !dir.is_empty()) {
            self.state_dir = PathBuf::from(dir);
        }
        self
    }
}
