//! Media player adapters
//!
//! There is no audio backend in this crate. The terminal player announces
//! track changes as text, and the recording player keeps a call log for
//! tests and dry runs.

use crate::domain::repositories::{MediaPlayer, PlaybackError};
use crate::domain::value_objects::{PlaybackOptions, ResourceId};
use std::collections::{BTreeMap, BTreeSet};

/// One call received by a [`RecordingMediaPlayer`]
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    Play(ResourceId, PlaybackOptions),
    Rejected(ResourceId),
    Pause(ResourceId),
}

/// In-memory player recording every call it receives
#[derive(Debug, Clone, Default)]
pub struct RecordingMediaPlayer {
    playing: BTreeMap<ResourceId, PlaybackOptions>,
    unavailable: BTreeSet<ResourceId>,
    autoplay_blocked: bool,
    calls: Vec<MediaCall>,
}

impl RecordingMediaPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse every `play` until [`allow_playback`](Self::allow_playback),
    /// like a browser before the first user gesture
    pub fn with_autoplay_blocked() -> Self {
        Self {
            autoplay_blocked: true,
            ..Self::default()
        }
    }

    pub fn allow_playback(&mut self) {
        self.autoplay_blocked = false;
    }

    /// Make `resource` fail permanently
    pub fn mark_unavailable(&mut self, resource: impl Into<ResourceId>) {
        self.unavailable.insert(resource.into());
    }

    pub fn calls(&self) -> &[MediaCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of successful `play` calls for `resource`
    pub fn play_count(&self, resource: &str) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, MediaCall::Play(r, _) if r.as_str() == resource))
            .count()
    }

    pub fn playing(&self) -> impl Iterator<Item = &ResourceId> {
        self.playing.keys()
    }
}

impl MediaPlayer for RecordingMediaPlayer {
    fn play(&mut self, resource: &ResourceId, options: PlaybackOptions) -> Result<(), PlaybackError> {
        if self.unavailable.contains(resource) {
            self.calls.push(MediaCall::Rejected(resource.clone()));
            return Err(PlaybackError::Unavailable(resource.to_string()));
        }
        if self.autoplay_blocked {
            self.calls.push(MediaCall::Rejected(resource.clone()));
            return Err(PlaybackError::NotAllowed);
        }
        if self.playing.contains_key(resource) {
            return Ok(());
        }
        self.playing.insert(resource.clone(), options);
        self.calls.push(MediaCall::Play(resource.clone(), options));
        Ok(())
    }

    fn pause(&mut self, resource: &ResourceId) {
        if self.playing.remove(resource).is_some() {
            self.calls.push(MediaCall::Pause(resource.clone()));
        }
    }

    fn is_playing(&self, resource: &ResourceId) -> bool {
        self.playing.contains_key(resource)
    }
}

/// Announces track changes on stdout. Transient cues stay silent.
#[derive(Debug, Default)]
pub struct TerminalMediaPlayer {
    playing: BTreeSet<ResourceId>,
    quiet: BTreeSet<ResourceId>,
}

impl TerminalMediaPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Do not announce `resource` (e.g. a typewriter click)
    pub fn quiet(mut self, resource: impl Into<ResourceId>) -> Self {
        self.quiet.insert(resource.into());
        self
    }
}

impl MediaPlayer for TerminalMediaPlayer {
    fn play(&mut self, resource: &ResourceId, options: PlaybackOptions) -> Result<(), PlaybackError> {
        if !self.playing.insert(resource.clone()) {
            return Ok(());
        }
        if !self.quiet.contains(resource) {
            let looped = if options.looped { " (loop)" } else { "" };
            println!("♪ now playing: {resource}{looped}");
        }
        Ok(())
    }

    fn pause(&mut self, resource: &ResourceId) {
        if self.playing.remove(resource) && !self.quiet.contains(resource) {
            println!("♪ paused: {resource}");
        }
    }

    fn is_playing(&self, resource: &ResourceId) -> bool {
        self.playing.contains(resource)
    }
}
