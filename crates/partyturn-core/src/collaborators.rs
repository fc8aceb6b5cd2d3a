//! Interfaces to the systems the turn engine drives or consumes.
//!
//! Presentation, audio and scoring live outside the engine. The engine only
//! talks to them through these traits.

use serde::{Deserialize, Serialize};

use crate::participant::ParticipantId;

/// Participant count reported before the roster has been populated.
pub const DEFAULT_ACTIVE_PARTICIPANTS: usize = 4;

/// Abstract instruction shown before an activity, independent of which
/// concrete minigame produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionKind {
    /// First-round walkthrough.
    Tutorial,
    /// Tap the highlighted targets.
    Tap,
    /// Repeat the sequence that was shown.
    Repeat,
    /// Solve the puzzle on screen.
    Solve,
    /// React as soon as the cue appears.
    React,
    /// Keep something balanced or steady.
    Steady,
}

/// Shows the per-turn instruction panel.
pub trait InstructionDisplay: Send {
    /// Shows the instruction for `kind`, addressed to `participant`.
    ///
    /// `participant` is `None` when the roster could not report a current
    /// participant in time.
    fn show(&mut self, kind: InstructionKind, participant: Option<ParticipantId>);

    /// Hides the instruction panel.
    fn hide(&mut self);

    /// Updates the participant icon without changing the instruction.
    fn update_participant_icon(&mut self, participant: Option<ParticipantId>);
}

/// Shows the "next turn" countdown between activities.
pub trait InterstitialDisplay: Send {
    /// Shows or refreshes the countdown for the upcoming participant.
    fn show_countdown(&mut self, next: Option<ParticipantId>, seconds_left: u32);

    /// Removes the countdown.
    fn hide(&mut self);
}

/// Renders the elimination timer and its side effects.
pub trait TimerPresenter: Send {
    /// Called every running tick with the current participant's timer.
    fn update(&mut self, participant: ParticipantId, remaining_secs: f64, max_secs: f64);

    /// Starts or stops the periodic low-time tick sound.
    fn set_tick_sound(&mut self, playing: bool);

    /// Raises or releases the input lock held during an elimination.
    fn set_interaction_locked(&mut self, locked: bool);

    /// Presents the elimination of `participant`.
    fn show_elimination(&mut self, participant: ParticipantId);
}

/// Receives one call per elimination.
pub trait EliminationSink: Send {
    /// `participant` has run out of time and left the round.
    fn on_eliminated(&mut self, participant: ParticipantId);
}

/// Source of difficulty scaling inputs.
pub trait DifficultyProvider {
    /// Number of participants still in the round.
    ///
    /// Must return [`DEFAULT_ACTIVE_PARTICIPANTS`] when queried before the
    /// round has been set up.
    fn active_participant_count(&self) -> usize;
}

impl<T: InstructionDisplay + ?Sized> InstructionDisplay for Box<T> {
    fn show(&mut self, kind: InstructionKind, participant: Option<ParticipantId>) {
        (**self).show(kind, participant);
    }

    fn hide(&mut self) {
        (**self).hide();
    }

    fn update_participant_icon(&mut self, participant: Option<ParticipantId>) {
        (**self).update_participant_icon(participant);
    }
}

impl<T: InterstitialDisplay + ?Sized> InterstitialDisplay for Box<T> {
    fn show_countdown(&mut self, next: Option<ParticipantId>, seconds_left: u32) {
        (**self).show_countdown(next, seconds_left);
    }

    fn hide(&mut self) {
        (**self).hide();
    }
}

impl<T: TimerPresenter + ?Sized> TimerPresenter for Box<T> {
    fn update(&mut self, participant: ParticipantId, remaining_secs: f64, max_secs: f64) {
        (**self).update(participant, remaining_secs, max_secs);
    }

    fn set_tick_sound(&mut self, playing: bool) {
        (**self).set_tick_sound(playing);
    }

    fn set_interaction_locked(&mut self, locked: bool) {
        (**self).set_interaction_locked(locked);
    }

    fn show_elimination(&mut self, participant: ParticipantId) {
        (**self).show_elimination(participant);
    }
}

impl<T: EliminationSink + ?Sized> EliminationSink for Box<T> {
    fn on_eliminated(&mut self, participant: ParticipantId) {
        (**self).on_eliminated(participant);
    }
}

/// A collaborator that ignores every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl InstructionDisplay for Silent {
    fn show(&mut self, _kind: InstructionKind, _participant: Option<ParticipantId>) {}

    fn hide(&mut self) {}

    fn update_participant_icon(&mut self, _participant: Option<ParticipantId>) {}
}

impl InterstitialDisplay for Silent {
    fn show_countdown(&mut self, _next: Option<ParticipantId>, _seconds_left: u32) {}

    fn hide(&mut self) {}
}

impl TimerPresenter for Silent {
    fn update(&mut self, _participant: ParticipantId, _remaining_secs: f64, _max_secs: f64) {}

    fn set_tick_sound(&mut self, _playing: bool) {}

    fn set_interaction_locked(&mut self, _locked: bool) {}

    fn show_elimination(&mut self, _participant: ParticipantId) {}
}

impl EliminationSink for Silent {
    fn on_eliminated(&mut self, _participant: ParticipantId) {}
}
