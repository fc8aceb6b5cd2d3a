//! The elimination countdown state machine.
//!
//! `Idle -> Running -> Finishing -> Idle`, with an extra `Waiting` step when
//! `start` is called before the roster can name a current participant.

use std::collections::BTreeMap;
use std::fmt;

use partyturn_core::clock::Frame;
use partyturn_core::collaborators::{DifficultyProvider, EliminationSink, Silent, TimerPresenter};
use partyturn_core::error::TurnError;
use partyturn_core::participant::ParticipantId;
use partyturn_core::wait::{BoundedWait, WaitStatus};
use partyturn_roster::ParticipantRoster;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::EPSILON;
use crate::config::CountdownConfig;
use crate::freeze::FreezeStack;
use crate::state::CountdownState;

/// Observable scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerPhase {
    /// Not counting.
    Idle,
    /// Started, but the roster has not reported a current participant yet.
    Waiting,
    /// Counting down the current participant's allotment.
    Running,
    /// A participant ran out; the elimination hold is in progress.
    Finishing,
}

/// Produced by [`CountdownScheduler::tick`] when something happened that the
/// rest of the match must react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownSignal {
    /// `participant` left the round and every survivor received the
    /// elimination bonus. The scheduler is idle again.
    Eliminated(ParticipantId),
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Waiting(BoundedWait),
    Running,
    Finishing {
        eliminated: ParticipantId,
        held_secs: f64,
    },
}

/// Per-participant elimination countdown bound to the roster's current
/// participant.
pub struct CountdownScheduler {
    config: CountdownConfig,
    states: BTreeMap<ParticipantId, CountdownState>,
    freeze: FreezeStack,
    phase: Phase,
    bound: Option<ParticipantId>,
    tick_sound: bool,
    presenter: Box<dyn TimerPresenter>,
    sink: Box<dyn EliminationSink>,
}

impl CountdownScheduler {
    /// Creates an idle scheduler with silent collaborators.
    #[must_use]
    pub fn new(config: CountdownConfig) -> Self {
        Self {
            config,
            states: BTreeMap::new(),
            freeze: FreezeStack::new(),
            phase: Phase::Idle,
            bound: None,
            tick_sound: false,
            presenter: Box::new(Silent),
            sink: Box::new(Silent),
        }
    }

    /// Replaces the timer presenter.
    #[must_use]
    pub fn with_presenter(mut self, presenter: impl TimerPresenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    /// Replaces the elimination sink.
    #[must_use]
    pub fn with_elimination_sink(mut self, sink: impl EliminationSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// The tuning in effect.
    #[must_use]
    pub fn config(&self) -> &CountdownConfig {
        &self.config
    }

    /// Current state machine phase.
    #[must_use]
    pub fn phase(&self) -> SchedulerPhase {
        match self.phase {
            Phase::Idle => SchedulerPhase::Idle,
            Phase::Waiting(_) => SchedulerPhase::Waiting,
            Phase::Running => SchedulerPhase::Running,
            Phase::Finishing { .. } => SchedulerPhase::Finishing,
        }
    }

    /// Returns `true` during the elimination hold.
    #[must_use]
    pub fn is_finishing(&self) -> bool {
        matches!(self.phase, Phase::Finishing { .. })
    }

    /// The participant the countdown last ran for.
    #[must_use]
    pub fn bound_participant(&self) -> Option<ParticipantId> {
        self.bound
    }

    /// The countdown state of `participant`, if one has been created.
    #[must_use]
    pub fn state(&self, participant: ParticipantId) -> Option<&CountdownState> {
        self.states.get(&participant)
    }

    /// Seconds left for `participant`, if a countdown exists.
    #[must_use]
    pub fn remaining(&self, participant: ParticipantId) -> Option<f64> {
        self.state(participant).map(CountdownState::remaining)
    }

    /// Starts counting for the roster's current participant.
    ///
    /// Creates the participant's allotment on first use, sized by the number
    /// of active participants. If the roster has no current participant yet,
    /// waits for one for at most `participant_wait_secs` of real time.
    pub fn start(&mut self, roster: &ParticipantRoster) {
        if let Phase::Finishing { eliminated, .. } = self.phase {
            warn!(error = %TurnError::EliminationInProgress(eliminated), "countdown start ignored");
            return;
        }
        match roster.current() {
            Some(participant) => self.begin_running(participant, roster),
            None => {
                debug!("countdown waiting for a current participant");
                self.phase = Phase::Waiting(BoundedWait::new(self.config.participant_wait_secs));
            }
        }
    }

    /// Forces the scheduler idle, cancelling any wait or elimination hold.
    ///
    /// A cancelled hold releases the interaction lock; the participant is not
    /// eliminated.
    pub fn stop(&mut self) {
        if let Phase::Finishing { eliminated, .. } = self.phase {
            info!(participant = %eliminated, "elimination hold cancelled");
            self.presenter.set_interaction_locked(false);
        }
        self.set_tick_sound(false);
        self.phase = Phase::Idle;
    }

    /// Stops and forgets every allotment and freeze, ready for a new round.
    pub fn reset(&mut self) {
        self.stop();
        self.states.clear();
        self.freeze.clear();
        self.bound = None;
    }

    /// Advances the countdown by one host tick.
    ///
    /// Running decrements by logical time and only while unfrozen. The
    /// elimination hold and the participant wait use real time, so neither a
    /// freeze nor a global pause can stall them.
    pub fn tick(&mut self, frame: &Frame, roster: &mut ParticipantRoster) -> Option<CountdownSignal> {
        match &mut self.phase {
            Phase::Idle => None,
            Phase::Waiting(wait) => {
                let status = wait.step(frame.real_secs, || roster.current());
                let waited_secs = wait.waited_secs();
                match status {
                    WaitStatus::Ready(participant) => self.begin_running(participant, roster),
                    WaitStatus::Pending => {}
                    WaitStatus::TimedOut => {
                        warn!(
                            waited_secs,
                            error = %TurnError::NoCurrentParticipant,
                            "countdown not started"
                        );
                        self.phase = Phase::Idle;
                    }
                }
                None
            }
            Phase::Running => {
                self.tick_running(frame, roster);
                None
            }
            Phase::Finishing {
                eliminated,
                held_secs,
            } => {
                *held_secs += frame.real_secs.max(0.0);
                if *held_secs + EPSILON < self.config.elimination_hold_secs {
                    return None;
                }
                let eliminated = *eliminated;
                Some(self.finish_elimination(eliminated, roster))
            }
        }
    }

    // --- freeze ---

    /// Adds a freeze; the countdown stops decrementing until every freeze is
    /// released. Returns the new depth.
    pub fn push_freeze(&mut self, reason: &str) -> usize {
        let depth = self.freeze.push(reason);
        self.set_tick_sound(false);
        depth
    }

    /// Releases one freeze and returns the new depth.
    ///
    /// Releasing with nothing frozen is logged and ignored.
    pub fn pop_freeze(&mut self) -> usize {
        match self.freeze.pop() {
            Ok(depth) => depth,
            Err(err) => {
                warn!(error = %err, "pop_freeze ignored");
                0
            }
        }
    }

    /// Releases one freeze pushed while [`freeze_epoch`](Self::freeze_epoch)
    /// was `epoch`. Does nothing if `clear_freeze` ran since, because the
    /// freeze is already gone. Returns `true` if a freeze was popped.
    pub fn release_freeze(&mut self, epoch: u64) -> bool {
        if self.freeze.epoch() != epoch {
            debug!(epoch, current = self.freeze.epoch(), "freeze already cleared");
            return false;
        }
        self.pop_freeze();
        true
    }

    /// Releases every freeze and returns how many were held.
    pub fn clear_freeze(&mut self) -> usize {
        let released = self.freeze.clear();
        if released > 0 {
            info!(released, "freezes cleared");
        }
        released
    }

    /// Number of outstanding freezes.
    #[must_use]
    pub fn freeze_depth(&self) -> usize {
        self.freeze.depth()
    }

    /// Bumped by every `clear_freeze` and `reset`.
    #[must_use]
    pub fn freeze_epoch(&self) -> u64 {
        self.freeze.epoch()
    }

    // --- bonus time ---

    /// `0 < remaining <= bonus_window_fraction * initial_max` for
    /// `participant`.
    #[must_use]
    pub fn is_in_bonus_window(&self, participant: ParticipantId) -> bool {
        self.states
            .get(&participant)
            .is_some_and(|state| state.is_in_bonus_window(self.config.bonus_window_fraction))
    }

    /// Adds `seconds` to `remaining`, capped at `max`, but only inside the
    /// bonus window. `participant` defaults to the one the countdown is bound
    /// to. Returns `true` if time was granted.
    pub fn grant_bonus_if_in_window(
        &mut self,
        seconds: f64,
        participant: Option<ParticipantId>,
    ) -> bool {
        let Some(participant) = participant.or(self.bound) else {
            warn!(error = %TurnError::NoCurrentParticipant, "window bonus ignored");
            return false;
        };
        let fraction = self.config.bonus_window_fraction;
        match self.states.get_mut(&participant) {
            Some(state) if state.is_in_bonus_window(fraction) => {
                state.add_capped(seconds);
                debug!(participant = %participant, seconds, remaining = state.remaining(), "window bonus granted");
                true
            }
            Some(_) => false,
            None => {
                debug!(participant = %participant, "window bonus without countdown state");
                false
            }
        }
    }

    /// Adds `seconds` to both `max` and `remaining`, regardless of the bonus
    /// window. Returns `false` if `participant` has no countdown yet.
    pub fn grant_unconditional_bonus(&mut self, participant: ParticipantId, seconds: f64) -> bool {
        match self.states.get_mut(&participant) {
            Some(state) => {
                state.extend(seconds);
                info!(participant = %participant, seconds, max = state.max(), "capacity extended");
                true
            }
            None => {
                warn!(error = %TurnError::ParticipantNotFound(participant), "unconditional bonus ignored");
                false
            }
        }
    }

    // --- internals ---

    fn begin_running(&mut self, participant: ParticipantId, roster: &ParticipantRoster) {
        self.ensure_state(participant, roster.active_participant_count());
        self.bound = Some(participant);
        self.phase = Phase::Running;
        info!(participant = %participant, remaining = ?self.remaining(participant), "countdown running");
    }

    fn ensure_state(&mut self, participant: ParticipantId, active: usize) -> &mut CountdownState {
        let config = self.config;
        self.states.entry(participant).or_insert_with(|| {
            let duration = config.duration_for(active);
            debug!(participant = %participant, duration, active, "countdown created");
            CountdownState::new(duration)
        })
    }

    fn tick_running(&mut self, frame: &Frame, roster: &ParticipantRoster) {
        let Some(participant) = roster.current() else {
            trace!("no current participant to count down");
            return;
        };
        if self.bound != Some(participant) {
            debug!(participant = %participant, "countdown rebound");
            self.bound = Some(participant);
        }

        let frozen = self.freeze.is_frozen();
        let state = self.ensure_state(participant, roster.active_participant_count());
        if !frozen {
            state.decrement(frame.logical_secs);
        }
        let snapshot = *state;
        trace!(participant = %participant, remaining = snapshot.remaining(), frozen, "countdown tick");

        self.presenter
            .update(participant, snapshot.remaining(), snapshot.max());
        let warning = !frozen
            && !snapshot.is_expired()
            && snapshot.remaining() <= self.config.tick_warning_secs;
        self.set_tick_sound(warning);

        if !frozen && snapshot.is_expired() {
            if let Err(err) = self.begin_elimination(participant) {
                warn!(error = %err, "elimination not restarted");
            }
        }
    }

    /// Enters `Finishing`. Fails without side effects if already finishing.
    fn begin_elimination(&mut self, participant: ParticipantId) -> Result<(), TurnError> {
        if let Phase::Finishing { eliminated, .. } = self.phase {
            return Err(TurnError::EliminationInProgress(eliminated));
        }
        self.set_tick_sound(false);
        self.presenter.set_interaction_locked(true);
        self.presenter.show_elimination(participant);
        info!(
            participant = %participant,
            hold_secs = self.config.elimination_hold_secs,
            "participant ran out of time"
        );
        self.phase = Phase::Finishing {
            eliminated: participant,
            held_secs: 0.0,
        };
        Ok(())
    }

    fn finish_elimination(
        &mut self,
        eliminated: ParticipantId,
        roster: &mut ParticipantRoster,
    ) -> CountdownSignal {
        self.states.remove(&eliminated);
        roster.remove(eliminated);

        let bonus = self.config.elimination_bonus_secs;
        for survivor in roster.active_indices() {
            if let Some(state) = self.states.get_mut(survivor) {
                state.add_capped(bonus);
            }
        }

        self.sink.on_eliminated(eliminated);
        self.presenter.set_interaction_locked(false);
        self.phase = Phase::Idle;
        self.bound = None;
        info!(
            participant = %eliminated,
            survivors = roster.active_count(),
            bonus,
            "participant eliminated"
        );
        CountdownSignal::Eliminated(eliminated)
    }

    fn set_tick_sound(&mut self, playing: bool) {
        if self.tick_sound != playing {
            self.tick_sound = playing;
            self.presenter.set_tick_sound(playing);
        }
    }
}

impl fmt::Debug for CountdownScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountdownScheduler")
            .field("phase", &self.phase)
            .field("bound", &self.bound)
            .field("freeze", &self.freeze)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}
