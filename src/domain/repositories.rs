//! Collaborator traits - Media playback and flag persistence
//!
//! The sequencer talks to the outside world only through these traits.
//! Implementations live in the infrastructure layer.

use crate::domain::value_objects::{FlagKey, PlaybackOptions, ResourceId};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// All durable flags, keyed by name
pub type FlagMap = BTreeMap<FlagKey, String>;

/// Plays, pauses and reports on audio or video tracks.
///
/// Starting a track that is already playing must be a no-op, since a stage
/// re-entered through `retreat` runs its entry effects again.
pub trait MediaPlayer {
    /// Start `resource`. The host may refuse playback (autoplay policy before
    /// any user gesture); that refusal is returned, never panicked on.
    fn play(&mut self, resource: &ResourceId, options: PlaybackOptions) -> Result<(), PlaybackError>;

    fn pause(&mut self, resource: &ResourceId);

    fn is_playing(&self, resource: &ResourceId) -> bool;
}

impl<T: MediaPlayer + ?Sized> MediaPlayer for &mut T {
    fn play(&mut self, resource: &ResourceId, options: PlaybackOptions) -> Result<(), PlaybackError> {
        (**self).play(resource, options)
    }

    fn pause(&mut self, resource: &ResourceId) {
        (**self).pause(resource)
    }

    fn is_playing(&self, resource: &ResourceId) -> bool {
        (**self).is_playing(resource)
    }
}

impl<T: MediaPlayer + ?Sized> MediaPlayer for Box<T> {
    fn play(&mut self, resource: &ResourceId, options: PlaybackOptions) -> Result<(), PlaybackError> {
        (**self).play(resource, options)
    }

    fn pause(&mut self, resource: &ResourceId) {
        (**self).pause(resource)
    }

    fn is_playing(&self, resource: &ResourceId) -> bool {
        (**self).is_playing(resource)
    }
}

/// Small synchronous key-value store for flags of the current visit
pub trait FlagStore {
    fn get(&self, key: &FlagKey) -> Option<String>;

    fn set(&mut self, key: FlagKey, value: String);
}

impl<T: FlagStore + ?Sized> FlagStore for &mut T {
    fn get(&self, key: &FlagKey) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: FlagKey, value: String) {
        (**self).set(key, value)
    }
}

impl FlagStore for FlagMap {
    fn get(&self, key: &FlagKey) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }

    fn set(&mut self, key: FlagKey, value: String) {
        self.insert(key, value);
    }
}

/// Durable storage backing the flags across visits
#[async_trait]
pub trait FlagRepository: Send + Sync {
    /// Load every stored flag. A store that was never written is empty, not
    /// an error.
    async fn load_flags(&self) -> Result<FlagMap, RepositoryError>;

    /// Replace the stored flags
    async fn save_flags(&self, flags: &FlagMap) -> Result<(), RepositoryError>;
}

/// Refusal reported by a media player
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    /// The host blocks playback until the visitor interacts with the page
    #[error("playback not allowed before user interaction")]
    NotAllowed,

    #[error("media resource unavailable: {0}")]
    Unavailable(String),
}

/// Flag persistence errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid flag data: {message}")]
    InvalidFormat { message: String },

    #[error("repository unavailable: {reason}")]
    Unavailable { reason: String },
}

impl RepositoryError {
    pub fn io(path: impl Into<String>, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }
}
