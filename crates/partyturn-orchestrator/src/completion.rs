//! At-most-once completion signalling.
//!
//! The activity owns its [`CompletionSignal`]. The orchestrator arms it
//! before each start and holds a [`CompletionSubscription`] until it
//! detaches. Subscriptions are generation-tagged and consumed on detach, so
//! a completion from an earlier dispatch can never be delivered to a later
//! one.

/// Completion latch owned by an activity.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompletionSignal {
    armed: bool,
    fired: bool,
    delivered: bool,
    generation: u64,
    subscriber: Option<u64>,
}

/// The orchestrator's handle on one activity's completion.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a subscription must be detached to release the signal"]
pub struct CompletionSubscription {
    generation: u64,
}

impl CompletionSignal {
    /// Creates an unarmed signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the latch for a new start.
    pub fn arm(&mut self) {
        self.armed = true;
        self.fired = false;
        self.delivered = false;
    }

    /// Reports completion. Returns `false` if the signal was not armed or
    /// already fired since the last [`arm`](Self::arm).
    pub fn fire(&mut self) -> bool {
        if !self.armed || self.fired {
            return false;
        }
        self.fired = true;
        true
    }

    /// Returns `true` once fired for the current start.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.fired
    }

    /// Attaches a new subscriber, replacing any earlier one.
    pub fn subscribe(&mut self) -> CompletionSubscription {
        self.generation += 1;
        self.subscriber = Some(self.generation);
        CompletionSubscription {
            generation: self.generation,
        }
    }

    /// Detaches `subscription`. Returns `false` if it was already replaced.
    pub fn detach(&mut self, subscription: CompletionSubscription) -> bool {
        if self.subscriber == Some(subscription.generation) {
            self.subscriber = None;
            true
        } else {
            false
        }
    }

    /// Delivers a pending completion to `subscription`, at most once.
    pub fn take_completion(&mut self, subscription: &CompletionSubscription) -> bool {
        if self.subscriber != Some(subscription.generation) || !self.fired || self.delivered {
            return false;
        }
        self.delivered = true;
        true
    }
}
