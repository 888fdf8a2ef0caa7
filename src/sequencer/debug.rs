//! Debug logging for sequencer execution
//!
//! The library logs through the `log` facade under one target per category.
//! Hosts that want the output on stderr (or in a file) call [`init`] once.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Mutex;

/// Debug log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// All internal state changes
    Trace,
    /// Development debugging information
    Debug,
    /// Important state changes
    Info,
    /// Potential issues
    Warn,
    /// Error situations
    Error,
}

impl LogLevel {
    fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// Debug log category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebugCategory {
    /// Sequencer lifecycle
    Engine,
    /// Stage transitions
    Flow,
    /// Timers, gestures, reveal progress and credentials
    Gates,
    /// Media playback
    Media,
    /// Flag persistence
    Storage,
}

impl DebugCategory {
    pub const ENGINE: &'static str = "keepsake::engine";
    pub const FLOW: &'static str = "keepsake::flow";
    pub const GATES: &'static str = "keepsake::gates";
    pub const MEDIA: &'static str = "keepsake::media";
    pub const STORAGE: &'static str = "keepsake::storage";

    /// Log target used for this category
    pub fn target(self) -> &'static str {
        match self {
            DebugCategory::Engine => Self::ENGINE,
            DebugCategory::Flow => Self::FLOW,
            DebugCategory::Gates => Self::GATES,
            DebugCategory::Media => Self::MEDIA,
            DebugCategory::Storage => Self::STORAGE,
        }
    }

    pub fn from_target(target: &str) -> Option<Self> {
        match target {
            Self::ENGINE => Some(DebugCategory::Engine),
            Self::FLOW => Some(DebugCategory::Flow),
            Self::GATES => Some(DebugCategory::Gates),
            Self::MEDIA => Some(DebugCategory::Media),
            Self::STORAGE => Some(DebugCategory::Storage),
            _ => None,
        }
    }
}

/// Debug configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Enable debug logging
    pub enabled: bool,
    /// Minimum log level
    pub level: LogLevel,
    /// Output destination
    pub output: DebugOutput,
    /// Enabled categories
    pub categories: HashSet<DebugCategory>,
}

impl Default for DebugConfig {
    fn default() -> Self {
        let mut categories = HashSet::new();
        categories.insert(DebugCategory::Engine);
        categories.insert(DebugCategory::Flow);
        categories.insert(DebugCategory::Media);

        Self {
            enabled: std::env::var("KEEPSAKE_DEBUG").is_ok(),
            level: LogLevel::Debug,
            output: DebugOutput::Stderr,
            categories,
        }
    }
}

impl DebugConfig {
    /// Everything at trace level, on stderr
    pub fn verbose() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Trace,
            output: DebugOutput::Stderr,
            categories: [
                DebugCategory::Engine,
                DebugCategory::Flow,
                DebugCategory::Gates,
                DebugCategory::Media,
                DebugCategory::Storage,
            ]
            .into_iter()
            .collect(),
        }
    }

    /// Whether a record with this level and target would be written.
    /// Targets outside the crate's categories are only shown at warn or above.
    pub fn allows(&self, level: log::Level, target: &str) -> bool {
        if !self.enabled || level > self.level.filter() {
            return false;
        }
        match DebugCategory::from_target(target) {
            Some(category) => self.categories.contains(&category),
            None => level <= log::Level::Warn,
        }
    }
}

/// Debug output destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DebugOutput {
    /// Output to stderr
    Stderr,
    /// Append to a file
    File(String),
}

/// `log::Log` implementation honouring a [`DebugConfig`]
pub struct DebugLogger {
    config: DebugConfig,
    file: Option<Mutex<File>>,
}

impl DebugLogger {
    pub fn new(config: DebugConfig) -> std::io::Result<Self> {
        let file = match &config.output {
            DebugOutput::Stderr => None,
            DebugOutput::File(path) => Some(Mutex::new(
                OpenOptions::new().create(true).append(true).open(path)?,
            )),
        };
        Ok(Self { config, file })
    }

    fn format(record: &log::Record<'_>) -> String {
        let category = DebugCategory::from_target(record.target())
            .map(|c| format!("{c:?}"))
            .unwrap_or_else(|| record.target().to_string());
        format!("[{}] {:10} {}", record.level(), category, record.args())
    }
}

impl log::Log for DebugLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.config.allows(metadata.level(), metadata.target())
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = Self::format(record);
        match &self.file {
            Some(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = writeln!(file, "{line}");
                }
            }
            None => eprintln!("{line}"),
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file
            && let Ok(mut file) = file.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Install the debug logger as the global logger.
///
/// Does nothing when debugging is disabled. Fails if another logger was
/// installed first.
pub fn init(config: DebugConfig) -> anyhow::Result<()> {
    if !config.enabled {
        return Ok(());
    }
    let max_level = config.level.filter();
    let logger = DebugLogger::new(config)?;
    log::set_logger(Box::leak(Box::new(logger)))
        .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))?;
    log::set_max_level(max_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_config_default() {
        let config = DebugConfig::default();
        assert!(!config.enabled || std::env::var("KEEPSAKE_DEBUG").is_ok());
        assert!(config.categories.contains(&DebugCategory::Flow));
        assert!(!config.categories.contains(&DebugCategory::Gates));
    }

    #[test]
    fn disabled_config_allows_nothing() {
        let mut config = DebugConfig::verbose();
        config.enabled = false;
        assert!(!config.allows(log::Level::Error, DebugCategory::FLOW));
    }

    #[test]
    fn filters_by_level_and_category() {
        let mut config = DebugConfig::verbose();
        config.level = LogLevel::Debug;
        config.categories.remove(&DebugCategory::Gates);

        assert!(config.allows(log::Level::Debug, DebugCategory::FLOW));
        assert!(!config.allows(log::Level::Trace, DebugCategory::FLOW));
        assert!(!config.allows(log::Level::Debug, DebugCategory::GATES));
        assert!(config.allows(log::Level::Warn, "some_dependency"));
        assert!(!config.allows(log::Level::Info, "some_dependency"));
    }

    #[test]
    fn targets_round_trip_to_categories() {
        for category in [
            DebugCategory::Engine,
            DebugCategory::Flow,
            DebugCategory::Gates,
            DebugCategory::Media,
            DebugCategory::Storage,
        ] {
            assert_eq!(DebugCategory::from_target(category.target()), Some(category));
        }
    }

    #[test]
    fn file_output_appends_records() {
        use log::Log;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        let mut config = DebugConfig::verbose();
        config.output = DebugOutput::File(path.to_string_lossy().to_string());

        let logger = DebugLogger::new(config).unwrap();
        logger.log(
            &log::Record::builder()
                .level(log::Level::Debug)
                .target(DebugCategory::FLOW)
                .args(format_args!("entered stage 1"))
                .build(),
        );
        logger.flush();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("entered stage 1"));
        assert!(written.contains("Flow"));
    }
}
