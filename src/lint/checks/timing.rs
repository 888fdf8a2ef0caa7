//! Timing checks: long timer gates and long reveals

use crate::domain::entities::Sequence;
use crate::domain::value_objects::ExitTrigger;
use crate::lint::config::LintConfig;
use crate::lint::{LintIssue, LintLevel, LintResult};
use crate::sequencer::reveal::unit_count;

/// Check timer lengths and reveal body lengths
pub fn check(sequence: &Sequence, result: &mut LintResult, config: &LintConfig) {
    for stage in sequence.stages() {
        if let ExitTrigger::Timer { millis } = stage.exit_trigger()
            && *millis > config.timing.max_timer_ms
        {
            result.add_issue(LintIssue::new(
                LintLevel::Warning,
                stage.index(),
                "timing",
                format!(
                    "Timer of {:.1}s exceeds threshold {:.1}s",
                    *millis as f64 / 1000.0,
                    config.timing.max_timer_ms as f64 / 1000.0
                ),
            ));
        }

        if let Some(reveal) = stage.reveal() {
            let units = unit_count(&stage.content().body);
            if units > config.timing.max_reveal_units {
                let seconds = units as f64 * reveal.cadence_ms as f64 / 1000.0;
                result.add_issue(LintIssue::new(
                    LintLevel::Info,
                    stage.index(),
                    "timing",
                    format!(
                        "Reveal of {} characters takes {:.1}s (recommended maximum {})",
                        units, seconds, config.timing.max_reveal_units
                    ),
                ));
            }
        }
    }
}
