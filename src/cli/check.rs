//! `check` command: load a sequence and report lint issues

use crate::config::PlayerConfig;
use crate::infrastructure::load_sequence;
use crate::lint::{LintLevel, LintResult, lint_with_config};
use std::path::Path;

/// Validate and lint a sequence document. Returns false when errors were found.
pub async fn run_check(path: &Path, config: &PlayerConfig) -> anyhow::Result<bool> {
    let loaded = load_sequence(path, &config.reveal).await?;
    let sequence = &loaded.sequence;
    let result = lint_with_config(sequence, &config.lint);

    println!("{}: '{}', {} stages", path.display(), sequence.name(), sequence.stage_count());
    if let Some(keepsakes) = &loaded.keepsakes {
        println!("  {} keepsakes", keepsakes.len());
    }
    print_result(&result);

    Ok(!result.has_errors())
}

fn print_result(result: &LintResult) {
    for issue in &result.issues {
        println!(
            "  {} stage {} [{}] {}",
            level_label(issue.level),
            issue.stage,
            issue.category,
            issue.message
        );
    }

    if result.is_clean() {
        println!("  no issues");
    } else {
        println!(
            "  {} errors, {} warnings, {} notes",
            result.error_count, result.warning_count, result.info_count
        );
    }
}

fn level_label(level: LintLevel) -> &'static str {
    match level {
        LintLevel::Error => "error:",
        LintLevel::Warning => "warning:",
        LintLevel::Info => "note:",
    }
}
