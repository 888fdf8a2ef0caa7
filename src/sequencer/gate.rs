//! Gate bookkeeping for the visit of the current stage

use crate::domain::value_objects::{Epoch, ExitTrigger};

/// Accumulated trigger state of one stage visit.
///
/// A new visit (with a new epoch) starts every time a stage is entered.
#[derive(Debug, Clone, PartialEq)]
pub struct StageVisit {
    index: usize,
    epoch: Epoch,
    timer_elapsed: bool,
    gesture_seen: bool,
    credential_matched: bool,
    typed_progress: usize,
    reveal_total: usize,
}

impl StageVisit {
    pub fn new(index: usize, epoch: Epoch, reveal_total: usize) -> Self {
        Self {
            index,
            epoch,
            timer_elapsed: false,
            gesture_seen: false,
            credential_matched: false,
            typed_progress: 0,
            reveal_total,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn typed_progress(&self) -> usize {
        self.typed_progress
    }

    pub fn reveal_total(&self) -> usize {
        self.reveal_total
    }

    pub fn mark_timer_elapsed(&mut self) {
        self.timer_elapsed = true;
    }

    pub fn mark_gesture(&mut self) {
        self.gesture_seen = true;
    }

    pub fn mark_credential_matched(&mut self) {
        self.credential_matched = true;
    }

    /// Move reveal progress forward. Lower counts are ignored and counts past
    /// the end are clamped. Returns true when this call completed the reveal.
    pub fn record_progress(&mut self, count: usize) -> bool {
        let count = count.min(self.reveal_total);
        if count <= self.typed_progress {
            return false;
        }
        self.typed_progress = count;
        self.typed_progress == self.reveal_total
    }

    /// Mark the whole text as already revealed, without a completion
    pub fn fill_progress(&mut self) {
        self.typed_progress = self.reveal_total;
    }

    pub fn is_reveal_complete(&self) -> bool {
        self.typed_progress == self.reveal_total
    }

    /// Evaluate `trigger` against what this visit has seen. Only the declared
    /// trigger kind is consulted.
    pub fn satisfies(&self, trigger: &ExitTrigger) -> bool {
        match trigger {
            ExitTrigger::Timer { .. } => self.timer_elapsed,
            ExitTrigger::UserGesture => self.gesture_seen,
            ExitTrigger::TextRevealComplete => self.is_reveal_complete(),
            ExitTrigger::CredentialMatch { .. } => self.credential_matched,
            ExitTrigger::Always => true,
        }
    }
}
