//! Flow checks: empty stages behind credential gates, intro flag values

use crate::domain::entities::{Sequence, Stage};
use crate::domain::value_objects::{ExitTrigger, FlagKey, SideEffect};
use crate::lint::config::LintConfig;
use crate::lint::{LintIssue, LintLevel, LintResult};

/// Check stage flow issues
pub fn check(sequence: &Sequence, result: &mut LintResult, config: &LintConfig) {
    if config.flow.check_empty_after_credential {
        check_empty_after_credential(sequence, result);
    }

    if config.flow.check_intro_flag {
        check_intro_flag(sequence, result);
    }
}

fn check_empty_after_credential(sequence: &Sequence, result: &mut LintResult) {
    let Some(gate) = sequence
        .stages()
        .iter()
        .position(|stage| matches!(stage.exit_trigger(), ExitTrigger::CredentialMatch { .. }))
    else {
        return;
    };

    for stage in &sequence.stages()[gate + 1..] {
        if is_empty(stage) {
            result.add_issue(LintIssue::new(
                LintLevel::Info,
                stage.index(),
                "flow",
                format!(
                    "Stage {} is behind the credential gate of stage {} but shows nothing",
                    stage.index(),
                    gate
                ),
            ));
        }
    }
}

fn is_empty(stage: &Stage) -> bool {
    let content = stage.content();
    content.title.trim().is_empty() && content.body.trim().is_empty() && content.media.is_none()
}

fn check_intro_flag(sequence: &Sequence, result: &mut LintResult) {
    let intro = FlagKey::has_seen_intro();
    for stage in sequence.stages() {
        let hooks = stage.hooks();
        for effect in hooks
            .on_enter
            .iter()
            .chain(&hooks.on_exit)
            .chain(&hooks.on_reveal_complete)
        {
            if let SideEffect::SetFlag { key, value } = effect
                && *key == intro
                && value != "true"
            {
                result.add_issue(LintIssue::new(
                    LintLevel::Warning,
                    stage.index(),
                    "flow",
                    format!("'{}' set to '{}', visits route to the intro unless it is 'true'", key, value),
                ));
            }
        }
    }
}
