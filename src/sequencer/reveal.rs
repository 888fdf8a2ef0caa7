//! Typewriter text reveal
//!
//! The body is split into extended grapheme clusters and revealed one
//! cluster per cadence tick. While revealing, an audio cue is due every
//! `max(floor, cadence * factor)` so fast cadences do not stack cues.

use crate::domain::entities::{CueConfig, RevealConfig};
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;

/// Units revealed and cues due during one clock advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RevealTick {
    /// Total units revealed so far
    pub revealed: usize,
    /// Cues that became due during this advance
    pub cues: usize,
    /// Whether this advance revealed the last unit
    pub completed: bool,
}

/// Number of reveal units in `text`
pub fn unit_count(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Interval between two audio cues for a reveal running at `cadence`.
/// Never shorter than one millisecond.
pub fn cue_interval(cadence: Duration, cue: &CueConfig) -> Duration {
    let interval = cue.interval_ms(cadence.as_millis() as u64);
    Duration::from_millis(interval.max(1))
}

/// Drives the reveal of one body text. Restarting means building a new one.
#[derive(Debug, Clone)]
pub struct TextReveal {
    units: Vec<String>,
    cadence: Duration,
    cue_interval: Option<Duration>,
    revealed: usize,
    elapsed: Duration,
    cue_elapsed: Duration,
}

impl TextReveal {
    pub fn new(text: &str, config: &RevealConfig) -> Self {
        let cadence = config.cadence();
        Self {
            units: text.graphemes(true).map(str::to_string).collect(),
            cadence,
            cue_interval: config.cue.as_ref().map(|cue| cue_interval(cadence, cue)),
            revealed: 0,
            elapsed: Duration::ZERO,
            cue_elapsed: Duration::ZERO,
        }
    }

    pub fn total(&self) -> usize {
        self.units.len()
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn is_complete(&self) -> bool {
        self.revealed >= self.units.len()
    }

    /// The part of the text visible so far
    pub fn visible_text(&self) -> String {
        self.units[..self.revealed].concat()
    }

    /// Units revealed since `from`, for hosts printing incrementally
    pub fn revealed_since(&self, from: usize) -> String {
        let from = from.min(self.revealed);
        self.units[from..self.revealed].concat()
    }

    /// Time until the next unit appears, `None` once complete
    pub fn next_unit_in(&self) -> Option<Duration> {
        if self.is_complete() {
            return None;
        }
        Some(self.cadence.saturating_sub(self.elapsed))
    }

    /// Advance the reveal clock
    pub fn advance(&mut self, elapsed: Duration) -> RevealTick {
        if self.is_complete() {
            return RevealTick {
                revealed: self.revealed,
                cues: 0,
                completed: false,
            };
        }

        let mut cues = 0;
        if let Some(interval) = self.cue_interval {
            self.cue_elapsed += elapsed;
            while self.cue_elapsed >= interval {
                self.cue_elapsed -= interval;
                cues += 1;
            }
        }

        self.elapsed += elapsed;
        while self.elapsed >= self.cadence && !self.is_complete() {
            self.elapsed -= self.cadence;
            self.revealed += 1;
        }

        RevealTick {
            revealed: self.revealed,
            cues,
            completed: self.is_complete(),
        }
    }
}
