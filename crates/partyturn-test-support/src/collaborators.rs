//! Recording collaborators — mock presentation and scoring sinks.
//!
//! Each recorder is `Clone` and shares its log between clones, so a test can
//! keep one handle while the engine owns the other.

use std::sync::{Arc, Mutex};

use partyturn_core::collaborators::{
    EliminationSink, InstructionDisplay, InstructionKind, InterstitialDisplay, TimerPresenter,
};
use partyturn_core::participant::ParticipantId;

/// A call made to an [`InstructionDisplay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionCall {
    /// `show(kind, participant)`
    Show(InstructionKind, Option<ParticipantId>),
    /// `hide()`
    Hide,
    /// `update_participant_icon(participant)`
    Icon(Option<ParticipantId>),
}

/// Records every instruction panel call.
#[derive(Debug, Clone, Default)]
pub struct RecordingInstructionDisplay {
    calls: Arc<Mutex<Vec<InstructionCall>>>,
}

impl RecordingInstructionDisplay {
    /// Returns a snapshot of all recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<InstructionCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl InstructionDisplay for RecordingInstructionDisplay {
    fn show(&mut self, kind: InstructionKind, participant: Option<ParticipantId>) {
        self.calls
            .lock()
            .unwrap()
            .push(InstructionCall::Show(kind, participant));
    }

    fn hide(&mut self) {
        self.calls.lock().unwrap().push(InstructionCall::Hide);
    }

    fn update_participant_icon(&mut self, participant: Option<ParticipantId>) {
        self.calls
            .lock()
            .unwrap()
            .push(InstructionCall::Icon(participant));
    }
}

/// A call made to an [`InterstitialDisplay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterstitialCall {
    /// `show_countdown(next, seconds_left)`
    Countdown(Option<ParticipantId>, u32),
    /// `hide()`
    Hide,
}

/// Records every interstitial call.
#[derive(Debug, Clone, Default)]
pub struct RecordingInterstitialDisplay {
    calls: Arc<Mutex<Vec<InterstitialCall>>>,
}

impl RecordingInterstitialDisplay {
    /// Returns a snapshot of all recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<InterstitialCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl InterstitialDisplay for RecordingInterstitialDisplay {
    fn show_countdown(&mut self, next: Option<ParticipantId>, seconds_left: u32) {
        self.calls
            .lock()
            .unwrap()
            .push(InterstitialCall::Countdown(next, seconds_left));
    }

    fn hide(&mut self) {
        self.calls.lock().unwrap().push(InterstitialCall::Hide);
    }
}

/// A side-effect call made to a [`TimerPresenter`]. Per-tick `update` calls
/// are counted separately to keep the log readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCall {
    /// `set_tick_sound(playing)`
    TickSound(bool),
    /// `set_interaction_locked(locked)`
    InteractionLocked(bool),
    /// `show_elimination(participant)`
    Elimination(ParticipantId),
}

/// Records timer side effects and counts display updates.
#[derive(Debug, Clone, Default)]
pub struct RecordingTimerPresenter {
    calls: Arc<Mutex<Vec<TimerCall>>>,
    updates: Arc<Mutex<usize>>,
}

impl RecordingTimerPresenter {
    /// Returns a snapshot of all recorded side-effect calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<TimerCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of `update` calls received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn update_count(&self) -> usize {
        *self.updates.lock().unwrap()
    }
}

impl TimerPresenter for RecordingTimerPresenter {
    fn update(&mut self, _participant: ParticipantId, _remaining_secs: f64, _max_secs: f64) {
        *self.updates.lock().unwrap() += 1;
    }

    fn set_tick_sound(&mut self, playing: bool) {
        self.calls.lock().unwrap().push(TimerCall::TickSound(playing));
    }

    fn set_interaction_locked(&mut self, locked: bool) {
        self.calls
            .lock()
            .unwrap()
            .push(TimerCall::InteractionLocked(locked));
    }

    fn show_elimination(&mut self, participant: ParticipantId) {
        self.calls
            .lock()
            .unwrap()
            .push(TimerCall::Elimination(participant));
    }
}

/// Records every elimination delivered to the scoring side.
#[derive(Debug, Clone, Default)]
pub struct RecordingEliminationSink {
    eliminated: Arc<Mutex<Vec<ParticipantId>>>,
}

impl RecordingEliminationSink {
    /// Returns the eliminated participants in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn eliminated(&self) -> Vec<ParticipantId> {
        self.eliminated.lock().unwrap().clone()
    }
}

impl EliminationSink for RecordingEliminationSink {
    fn on_eliminated(&mut self, participant: ParticipantId) {
        self.eliminated.lock().unwrap().push(participant);
    }
}
