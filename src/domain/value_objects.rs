//! Domain value objects - Immutable objects that describe aspects of a sequence

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Macro to implement common traits for string wrapper types
macro_rules! impl_string_wrapper {
    ($type:ident) => {
        impl From<String> for $type {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $type {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Reference to an audio or video asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_string_wrapper!(ResourceId);

/// Key of a durable flag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagKey(String);

impl FlagKey {
    /// Flag remembering that the intro sequence was completed once
    pub const HAS_SEEN_INTRO: &'static str = "hasSeenIntro";

    pub fn new(key: String) -> Self {
        Self(key)
    }

    pub fn has_seen_intro() -> Self {
        Self::from(Self::HAS_SEEN_INTRO)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl_string_wrapper!(FlagKey);

/// Stage-local shared secret.
///
/// This is a narrative gate, not a credential store: the value is kept in
/// plain text and compared without hashing. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact match, inspecting every byte of the candidate regardless of
    /// where the first difference is.
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        let mut diff = expected.len() ^ candidate.len();
        for (i, byte) in candidate.iter().enumerate() {
            let other = expected.get(i).copied().unwrap_or(0);
            diff |= usize::from(byte ^ other);
        }
        diff == 0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(****)")
    }
}

/// Last navigation direction. Only chooses a transition animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Condition that must hold before a stage can be left
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExitTrigger {
    /// Satisfied once the stage has been shown for `millis`
    Timer { millis: u64 },
    /// Satisfied by a click, tap or keypress
    UserGesture,
    /// Satisfied when the whole body text has been revealed
    TextRevealComplete,
    /// Satisfied when the visitor enters the secret
    CredentialMatch { secret: Secret },
    /// Always satisfied
    Always,
}

impl ExitTrigger {
    pub fn timer(duration: Duration) -> Self {
        Self::Timer {
            millis: duration.as_millis() as u64,
        }
    }

    pub fn credential(secret: impl Into<String>) -> Self {
        Self::CredentialMatch {
            secret: Secret::new(secret),
        }
    }

    /// Short name used in logs and lint messages
    pub fn kind(&self) -> &'static str {
        match self {
            ExitTrigger::Timer { .. } => "timer",
            ExitTrigger::UserGesture => "user_gesture",
            ExitTrigger::TextRevealComplete => "text_reveal_complete",
            ExitTrigger::CredentialMatch { .. } => "credential_match",
            ExitTrigger::Always => "always",
        }
    }
}

/// Options passed to the media player when starting a track
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackOptions {
    /// Restart from the beginning when the track ends
    pub looped: bool,
    /// Offset into the track, in milliseconds
    pub start_offset_ms: u64,
}

impl PlaybackOptions {
    pub fn looped() -> Self {
        Self {
            looped: true,
            start_offset_ms: 0,
        }
    }

    pub fn once() -> Self {
        Self::default()
    }
}

/// Action run when a stage is entered, exited, or finishes revealing its text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SideEffect {
    PlayMedia {
        resource: ResourceId,
        #[serde(default)]
        options: PlaybackOptions,
    },
    StopMedia {
        resource: ResourceId,
    },
    SetFlag {
        key: FlagKey,
        value: String,
    },
    /// One-shot decorative effect, e.g. confetti
    Burst {
        effect: String,
        #[serde(default)]
        duration_ms: u64,
    },
}

impl SideEffect {
    pub fn play_looped(resource: impl Into<ResourceId>) -> Self {
        Self::PlayMedia {
            resource: resource.into(),
            options: PlaybackOptions::looped(),
        }
    }

    pub fn stop(resource: impl Into<ResourceId>) -> Self {
        Self::StopMedia {
            resource: resource.into(),
        }
    }

    pub fn set_flag(key: impl Into<FlagKey>, value: impl Into<String>) -> Self {
        Self::SetFlag {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn burst(effect: impl Into<String>, duration: Duration) -> Self {
        Self::Burst {
            effect: effect.into(),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// Generation counter of stage visits.
///
/// Every stage entry gets a fresh epoch; asynchronous callbacks carry the
/// epoch they were armed in and are discarded if it is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Epoch(u64);

impl Epoch {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
