//! Collaborators that render to the log instead of a screen.

use partyturn_core::collaborators::{
    EliminationSink, InstructionDisplay, InstructionKind, InterstitialDisplay, TimerPresenter,
};
use partyturn_core::participant::ParticipantId;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogInstructionDisplay;

impl InstructionDisplay for LogInstructionDisplay {
    fn show(&mut self, kind: InstructionKind, participant: Option<ParticipantId>) {
        info!(instruction = ?kind, participant = ?participant, "instructions shown");
    }

    fn hide(&mut self) {
        debug!("instructions hidden");
    }

    fn update_participant_icon(&mut self, participant: Option<ParticipantId>) {
        debug!(participant = ?participant, "participant icon updated");
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogInterstitialDisplay;

impl InterstitialDisplay for LogInterstitialDisplay {
    fn show_countdown(&mut self, next: Option<ParticipantId>, seconds_left: u32) {
        info!(next = ?next, seconds_left, "next turn in");
    }

    fn hide(&mut self) {
        debug!("interstitial hidden");
    }
}

/// Logs the timer once per whole second instead of once per tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTimerPresenter {
    shown: Option<(ParticipantId, u64)>,
}

impl TimerPresenter for LogTimerPresenter {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn update(&mut self, participant: ParticipantId, remaining_secs: f64, max_secs: f64) {
        let whole = remaining_secs.max(0.0).ceil() as u64;
        if self.shown != Some((participant, whole)) {
            self.shown = Some((participant, whole));
            debug!(participant = %participant, remaining = whole, max = max_secs, "timer");
        }
    }

    fn set_tick_sound(&mut self, playing: bool) {
        debug!(playing, "tick sound");
    }

    fn set_interaction_locked(&mut self, locked: bool) {
        debug!(locked, "interaction lock");
    }

    fn show_elimination(&mut self, participant: ParticipantId) {
        info!(participant = %participant, "out of time");
    }
}

/// Stands in for the scoring subsystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEliminationSink;

impl EliminationSink for LogEliminationSink {
    fn on_eliminated(&mut self, participant: ParticipantId) {
        info!(participant = %participant, "elimination scored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_presenter_tracks_whole_seconds() {
        let mut presenter = LogTimerPresenter::default();

        presenter.update(ParticipantId(0), 4.2, 15.0);
        assert_eq!(presenter.shown, Some((ParticipantId(0), 5)));

        presenter.update(ParticipantId(0), 4.01, 15.0);
        assert_eq!(presenter.shown, Some((ParticipantId(0), 5)));

        presenter.update(ParticipantId(1), -0.5, 15.0);
        assert_eq!(presenter.shown, Some((ParticipantId(1), 0)));
    }
}
