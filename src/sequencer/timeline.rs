//! Virtual clock for stage timers
//!
//! Timers are armed on stage entry and tagged with the epoch of that entry.
//! The sequencer cancels them when the stage is left; a token that still
//! reaches the sequencer afterwards is recognised as stale by its epoch.

use crate::domain::value_objects::Epoch;
use std::time::Duration;

/// Handle of one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken {
    pub stage: usize,
    pub epoch: Epoch,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
struct PendingTimer {
    token: TimerToken,
    due_at: Duration,
}

/// Pending timers ordered by due time
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    now: Duration,
    pending: Vec<PendingTimer>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the timeline was created
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule(&mut self, token: TimerToken) {
        let due_at = self.now + token.duration;
        let position = self
            .pending
            .iter()
            .position(|p| p.due_at > due_at)
            .unwrap_or(self.pending.len());
        self.pending.insert(position, PendingTimer { token, due_at });
    }

    /// Drop every timer armed in `epoch`. Returns how many were removed.
    pub fn cancel_epoch(&mut self, epoch: Epoch) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| p.token.epoch != epoch);
        before - self.pending.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let removed = self.pending.len();
        self.pending.clear();
        removed
    }

    /// Move the clock forward and return the tokens that became due, in order
    pub fn advance(&mut self, elapsed: Duration) -> Vec<TimerToken> {
        self.now += elapsed;
        let due = self
            .pending
            .iter()
            .take_while(|p| p.due_at <= self.now)
            .count();
        self.pending.drain(..due).map(|p| p.token).collect()
    }

    /// Time left until the next timer fires
    pub fn next_due_in(&self) -> Option<Duration> {
        self.pending
            .first()
            .map(|p| p.due_at.saturating_sub(self.now))
    }

    pub fn pending(&self) -> impl Iterator<Item = &TimerToken> {
        self.pending.iter().map(|p| &p.token)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
