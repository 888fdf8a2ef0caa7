//! Domain errors - Rejected operations and invalid sequences

use crate::domain::value_objects::ResourceId;
use thiserror::Error;

/// Rejection reasons returned by sequencer operations.
///
/// Every variant is recoverable: the sequencer is left exactly as it was
/// before the rejected call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SequencerError {
    #[error("sequencer already started")]
    AlreadyStarted,

    #[error("sequencer has not been started")]
    NotStarted,

    #[error("sequence already completed")]
    Completed,

    #[error("sequencer has been torn down")]
    TornDown,

    #[error("exit condition of stage {index} ({trigger}) is not satisfied")]
    ExitNotSatisfied { index: usize, trigger: &'static str },

    #[error("already at the first stage")]
    AtFirstStage,

    #[error("credential rejected")]
    CredentialRejected,

    #[error("stage {index} is not gated by a credential")]
    NoCredentialGate { index: usize },

    #[error("playback of '{resource}' rejected: {reason}")]
    MediaPlaybackRejected { resource: ResourceId, reason: String },

    #[error("timer from a previous stage visit ignored")]
    StaleTimerIgnored,
}

/// Errors raised while building a sequence
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("a sequence needs at least one stage")]
    EmptySequence,

    #[error("stage {index} has a credential gate with an empty secret")]
    EmptySecret { index: usize },

    #[error("stage {index} has a reveal config but its trigger is {trigger}")]
    RevealWithoutRevealTrigger { index: usize, trigger: &'static str },

    #[error("invalid reveal config on stage {index}: {reason}")]
    InvalidReveal { index: usize, reason: String },
}

impl DomainError {
    pub fn invalid_reveal(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidReveal {
            index,
            reason: reason.into(),
        }
    }
}
