//! Active participant roster and turn rotation.

use partyturn_core::collaborators::{DEFAULT_ACTIVE_PARTICIPANTS, DifficultyProvider};
use partyturn_core::error::TurnError;
use partyturn_core::event::{Listeners, Subscription};
use partyturn_core::participant::ParticipantId;
use partyturn_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Broadcast whenever the turn passes to another participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnCycleEvent {
    /// The participant whose turn it now is.
    pub participant: ParticipantId,
}

/// Ordered set of participants still in the round, plus a rotation cursor.
///
/// The cursor indexes into the active sequence, not into participant ids. It
/// is valid whenever the sequence is non-empty.
#[derive(Debug, Default)]
pub struct ParticipantRoster {
    active: Vec<ParticipantId>,
    cursor: usize,
    initialized: bool,
    turn_listeners: Listeners<TurnCycleEvent>,
}

impl ParticipantRoster {
    /// Creates an empty roster. Call [`initialize`](Self::initialize) to seat
    /// participants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats participants `0..count` and picks a uniformly random first turn.
    pub fn initialize(&mut self, count: usize, rng: &mut dyn DeterministicRng) {
        if count < 2 {
            warn!(count, "roster initialized with fewer than two participants");
        }
        self.active = (0..count).map(ParticipantId).collect();
        self.cursor = rng.next_index(count);
        self.initialized = true;
        info!(count, first = ?self.current(), "roster initialized");
    }

    /// The participant whose turn it is, or `None` if nobody is seated.
    #[must_use]
    pub fn current(&self) -> Option<ParticipantId> {
        self.active.get(self.cursor).copied()
    }

    /// Passes the turn to the next active participant.
    ///
    /// Logs and does nothing when fewer than two participants remain.
    pub fn advance(&mut self) {
        if let Err(err) = self.try_advance() {
            warn!(error = %err, "advance ignored");
        }
    }

    /// Passes the turn to the next active participant.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::TooFewParticipants` if fewer than two remain.
    pub fn try_advance(&mut self) -> Result<ParticipantId, TurnError> {
        let len = self.active.len();
        if len <= 1 {
            return Err(TurnError::TooFewParticipants(len));
        }
        self.cursor = (self.cursor + 1) % len;
        let participant = self.active[self.cursor];
        debug!(participant = %participant, "turn advanced");
        self.turn_listeners.emit(&TurnCycleEvent { participant });
        Ok(participant)
    }

    /// Removes an eliminated participant and hands the turn on.
    ///
    /// Returns `false` (and logs) if `id` is not active.
    pub fn remove(&mut self, id: ParticipantId) -> bool {
        match self.try_remove(id) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "remove ignored");
                false
            }
        }
    }

    /// Removes `id` and advances exactly once.
    ///
    /// Removing the current participant hands the turn to the one seated
    /// after them. Removing anyone else leaves the current participant's
    /// relative position intact before the advance.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::ParticipantNotFound` if `id` is not active.
    pub fn try_remove(&mut self, id: ParticipantId) -> Result<(), TurnError> {
        let position = self
            .active
            .iter()
            .position(|p| *p == id)
            .ok_or(TurnError::ParticipantNotFound(id))?;
        self.active.remove(position);
        let len = self.active.len();

        if position < self.cursor {
            self.cursor -= 1;
        } else if position == self.cursor && len > 0 {
            // Step back one seat so the advance below lands on the successor.
            self.cursor = if position == 0 { len - 1 } else { position - 1 };
        }
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
        info!(participant = %id, remaining = len, "participant removed");

        self.advance();
        Ok(())
    }

    /// Number of participants still in the round.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Active participants in seating order.
    #[must_use]
    pub fn active_indices(&self) -> &[ParticipantId] {
        &self.active
    }

    /// Returns `true` if `id` is still in the round.
    #[must_use]
    pub fn contains(&self, id: ParticipantId) -> bool {
        self.active.contains(&id)
    }

    /// Returns `true` once [`initialize`](Self::initialize) has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The round is over once at most one participant remains.
    #[must_use]
    pub fn is_round_over(&self) -> bool {
        self.initialized && self.active.len() <= 1
    }

    /// The last participant standing, once the round is over.
    #[must_use]
    pub fn winner(&self) -> Option<ParticipantId> {
        if self.active.len() == 1 {
            self.active.first().copied()
        } else {
            None
        }
    }

    /// Registers a listener for [`TurnCycleEvent`]s.
    pub fn subscribe_turns(
        &mut self,
        listener: impl FnMut(&TurnCycleEvent) + Send + 'static,
    ) -> Subscription {
        self.turn_listeners.subscribe(listener)
    }

    /// Removes a listener registered with [`subscribe_turns`](Self::subscribe_turns).
    pub fn unsubscribe_turns(&mut self, subscription: Subscription) -> bool {
        self.turn_listeners.unsubscribe(subscription)
    }
}

impl DifficultyProvider for ParticipantRoster {
    fn active_participant_count(&self) -> usize {
        if self.initialized {
            self.active.len()
        } else {
            DEFAULT_ACTIVE_PARTICIPANTS
        }
    }
}
