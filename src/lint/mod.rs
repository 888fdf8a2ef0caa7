//! Lint module for sequence quality checking
//!
//! This module reports problems a sequence can have even though it passes
//! validation:
//! - Timer gates and reveal bodies long enough to feel stuck
//! - Tracks stopped without ever being started
//! - Empty stages behind a credential gate, odd intro flag values

use crate::domain::entities::Sequence;
use serde::{Deserialize, Serialize};

pub mod checks;
pub mod config;

/// Lint severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LintLevel {
    /// Error: must be fixed
    Error,
    /// Warning: should be reviewed
    Warning,
    /// Info: for your information
    Info,
}

/// A lint issue found in the sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintIssue {
    pub level: LintLevel,
    pub message: String,
    /// Stage the issue belongs to
    pub stage: usize,
    pub category: String,
}

impl LintIssue {
    pub fn new(level: LintLevel, stage: usize, category: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            stage,
            category: category.to_string(),
        }
    }
}

/// Result of linting a sequence
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LintResult {
    pub issues: Vec<LintIssue>,
    pub error_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
}

impl LintResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, issue: LintIssue) {
        match issue.level {
            LintLevel::Error => self.error_count += 1,
            LintLevel::Warning => self.warning_count += 1,
            LintLevel::Info => self.info_count += 1,
        }
        self.issues.push(issue);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Lint a sequence with default configuration
pub fn lint(sequence: &Sequence) -> LintResult {
    lint_with_config(sequence, &config::LintConfig::default())
}

/// Lint a sequence with custom configuration
pub fn lint_with_config(sequence: &Sequence, config: &config::LintConfig) -> LintResult {
    let mut result = LintResult::new();

    if config.timing.enabled {
        checks::timing::check(sequence, &mut result, config);
    }

    if config.media.enabled {
        checks::media::check(sequence, &mut result, config);
    }

    if config.flow.enabled {
        checks::flow::check(sequence, &mut result, config);
    }

    result
}
