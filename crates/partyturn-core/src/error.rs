//! Turn-engine error types.
//!
//! These errors never escape the engine's public turn operations: callers
//! log them and degrade. They are returned by the `try_*` building blocks so
//! the failure reason stays inspectable in tests.

use thiserror::Error;

use crate::participant::ParticipantId;

/// Contained failure of a turn-engine operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The activity pool is empty.
    #[error("no activities configured")]
    NoActivities,

    /// The roster has no current participant.
    #[error("no current participant")]
    NoCurrentParticipant,

    /// The participant is not (or no longer) in the roster.
    #[error("participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// A freeze was released without a matching push.
    #[error("freeze stack underflow")]
    FreezeUnderflow,

    /// The elimination pipeline is already running.
    #[error("elimination already in progress for {0}")]
    EliminationInProgress(ParticipantId),

    /// Rotation needs at least two active participants.
    #[error("too few participants to rotate: {0}")]
    TooFewParticipants(usize),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
