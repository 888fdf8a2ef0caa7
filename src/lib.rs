//! # keepsake
//!
//! A Rust library for timed and gated multi-stage presentations: greeting
//! pages, guided reveals and small interactive stories where each stage
//! opens after a timer, a click, a finished typewriter reveal or a secret.
//!
//! The [`Sequencer`] owns stage navigation and talks to the outside world
//! through two traits: a [`MediaPlayer`](domain::repositories::MediaPlayer)
//! for audio and a [`FlagStore`](domain::repositories::FlagStore) for visit
//! flags.
//!
//! ## Quick Start
//!
//! ```rust
//! use keepsake::domain::entities::{Sequence, Stage, StageContent};
//! use keepsake::domain::repositories::FlagMap;
//! use keepsake::domain::value_objects::{ExitTrigger, SideEffect};
//! use keepsake::infrastructure::RecordingMediaPlayer;
//! use keepsake::{Advance, Sequencer};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let sequence = Sequence::new(
//!     "intro",
//!     vec![
//!         Stage::new(StageContent::new("Hello", ""), ExitTrigger::timer(Duration::from_secs(2)))
//!             .on_enter(SideEffect::play_looped("music")),
//!         Stage::new(StageContent::new("Ready?", "Click to open"), ExitTrigger::UserGesture)
//!             .on_exit(SideEffect::set_flag("hasSeenIntro", "true")),
//!     ],
//! )?;
//!
//! let mut sequencer = Sequencer::new(sequence, RecordingMediaPlayer::new(), FlagMap::new());
//! sequencer.start()?;
//!
//! // the first stage opens once its timer has elapsed
//! sequencer.advance_clock(Duration::from_secs(2));
//! sequencer.advance()?;
//!
//! sequencer.report_gesture_trigger();
//! assert_eq!(sequencer.advance()?, Advance::Completed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Sequence Documents
//!
//! ```rust
//! use keepsake::infrastructure::{RevealDefaults, SequenceDocument};
//!
//! # fn main() -> anyhow::Result<()> {
//! let json = r#"{
//!     "name": "secrets",
//!     "stages": [
//!         { "content": { "title": "Locked" }, "trigger": { "type": "credential_match", "secret": "0101" } },
//!         { "content": { "title": "Unlocked", "body": "hello" }, "trigger": { "type": "user_gesture" } }
//!     ]
//! }"#;
//! let loaded = SequenceDocument::from_json(json)?.into_sequence(&RevealDefaults::default())?;
//! assert_eq!(loaded.sequence.stage_count(), 2);
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod content;
pub mod domain;
pub mod infrastructure;
pub mod lint;
pub mod sequencer;
pub mod storage;

pub use application::{Route, VisitSession};
pub use content::{ContentCatalog, ContentProvider, Lookup};
pub use domain::errors::{DomainError, SequencerError};
pub use sequencer::{Advance, RevealProgress, Sequencer, SequencerEvent};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Sequence, Stage, StageContent};
    use crate::domain::repositories::FlagMap;
    use crate::domain::value_objects::{ExitTrigger, FlagKey, SideEffect};
    use crate::infrastructure::RecordingMediaPlayer;

    #[test]
    fn test_basic_sequence_and_routing() {
        let sequence = Sequence::new(
            "intro",
            vec![
                Stage::new(StageContent::new("Hi", ""), ExitTrigger::Always),
                Stage::new(StageContent::new("Bye", ""), ExitTrigger::UserGesture)
                    .on_exit(SideEffect::set_flag(FlagKey::has_seen_intro(), "true")),
            ],
        )
        .unwrap();

        let mut flags = FlagMap::new();
        assert_eq!(Route::for_flags(&flags), Route::Intro);
        {
            let mut sequencer = Sequencer::new(sequence, RecordingMediaPlayer::new(), &mut flags);
            sequencer.start().unwrap();
            assert_eq!(sequencer.advance().unwrap(), Advance::Moved { from: 0, to: 1 });
            assert!(sequencer.report_gesture_trigger());
            assert_eq!(sequencer.advance().unwrap(), Advance::Completed);
        }
        assert_eq!(Route::for_flags(&flags), Route::Main);
    }
}
