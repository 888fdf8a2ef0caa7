//! Lint configuration

use serde::{Deserialize, Serialize};

/// Lint configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LintConfig {
    /// Timer and reveal length checks
    pub timing: TimingConfig,
    /// Media start/stop pairing checks
    pub media: MediaConfig,
    /// Stage flow checks
    pub flow: FlowConfig,
}

/// Timing checks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub enabled: bool,
    /// Longest timer gate before a warning (milliseconds)
    pub max_timer_ms: u64,
    /// Longest revealed body before an info note (grapheme clusters)
    pub max_reveal_units: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_timer_ms: 10_000,
            max_reveal_units: 2_000,
        }
    }
}

/// Media checks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub enabled: bool,
    /// Warn when a stage stops a track nothing ever starts
    pub check_unmatched_stop: bool,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_unmatched_stop: true,
        }
    }
}

/// Flow checks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub enabled: bool,
    /// Note stages behind a credential gate that have nothing to show
    pub check_empty_after_credential: bool,
    /// Warn when `hasSeenIntro` is set to anything but "true"
    pub check_intro_flag: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_empty_after_credential: true,
            check_intro_flag: true,
        }
    }
}
