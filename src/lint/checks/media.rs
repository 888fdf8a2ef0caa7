//! Media checks: tracks stopped without being started

use crate::domain::entities::{Sequence, Stage};
use crate::domain::value_objects::{ResourceId, SideEffect};
use crate::lint::config::LintConfig;
use crate::lint::{LintIssue, LintLevel, LintResult};
use std::collections::BTreeSet;

/// Check that every stopped track is started somewhere
pub fn check(sequence: &Sequence, result: &mut LintResult, config: &LintConfig) {
    if !config.media.check_unmatched_stop {
        return;
    }

    let started: BTreeSet<&ResourceId> = sequence
        .stages()
        .iter()
        .flat_map(effects)
        .filter_map(|effect| match effect {
            SideEffect::PlayMedia { resource, .. } => Some(resource),
            _ => None,
        })
        .collect();

    for stage in sequence.stages() {
        for effect in effects(stage) {
            if let SideEffect::StopMedia { resource } = effect
                && !started.contains(resource)
            {
                result.add_issue(LintIssue::new(
                    LintLevel::Warning,
                    stage.index(),
                    "media",
                    format!("'{}' is stopped but never started", resource),
                ));
            }
        }
    }
}

fn effects(stage: &Stage) -> impl Iterator<Item = &SideEffect> {
    let hooks = stage.hooks();
    hooks
        .on_enter
        .iter()
        .chain(&hooks.on_exit)
        .chain(&hooks.on_reveal_complete)
}
