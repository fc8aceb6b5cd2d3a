//! Events reported by [`MatchController`](crate::MatchController).

use partyturn_core::participant::ParticipantId;
use partyturn_orchestrator::{ActivityKind, OrchestratorEvent};
use serde::Serialize;

/// Something that happened during a match tick, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    /// The roster was seated and the first turn began.
    RoundStarted {
        participants: usize,
        first: Option<ParticipantId>,
    },
    /// The turn passed to `participant`.
    TurnAdvanced { participant: ParticipantId },
    /// An activity started.
    ActivityDispatched {
        kind: ActivityKind,
        participant: Option<ParticipantId>,
    },
    /// An activity completed on its own.
    ActivityCompleted { kind: ActivityKind, advanced: bool },
    /// An activity was stopped from outside.
    ActivityAborted { kind: ActivityKind },
    /// The "next turn" countdown started.
    InterstitialStarted {
        next: Option<ParticipantId>,
        duration_secs: f64,
    },
    /// `participant` ran out of time and left the round.
    Eliminated {
        participant: ParticipantId,
        survivors: usize,
    },
    /// At most one participant remains.
    RoundOver { winner: Option<ParticipantId> },
    /// The activity pool is empty; the match stopped.
    AllActivitiesFinished,
}

impl From<OrchestratorEvent> for MatchEvent {
    fn from(event: OrchestratorEvent) -> Self {
        match event {
            OrchestratorEvent::Dispatched { kind, participant } => {
                Self::ActivityDispatched { kind, participant }
            }
            OrchestratorEvent::Completed { kind, advanced } => {
                Self::ActivityCompleted { kind, advanced }
            }
            OrchestratorEvent::Aborted { kind } => Self::ActivityAborted { kind },
            OrchestratorEvent::InterstitialStarted {
                next,
                duration_secs,
            } => Self::InterstitialStarted {
                next,
                duration_secs,
            },
            OrchestratorEvent::AllFinished => Self::AllActivitiesFinished,
        }
    }
}
