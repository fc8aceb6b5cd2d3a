//! The "next turn" countdown between activities.
//!
//! Measured on real time so a global pause cannot stall it. While it runs it
//! may hold one freeze on the elimination countdown; cancelling or
//! restarting it releases that freeze unless a clear already dropped it.

use partyturn_core::collaborators::InterstitialDisplay;
use partyturn_core::participant::ParticipantId;
use partyturn_countdown::{CountdownScheduler, EPSILON};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Interstitial timing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterstitialConfig {
    /// Length with three or more participants left, in seconds.
    pub duration_secs: f64,
    /// Length when exactly two participants remain, in seconds.
    pub two_remaining_secs: f64,
    /// Hold a countdown freeze for the interstitial's duration.
    pub hold_freeze: bool,
}

impl Default for InterstitialConfig {
    fn default() -> Self {
        Self {
            duration_secs: 3.0,
            two_remaining_secs: 2.0,
            hold_freeze: true,
        }
    }
}

impl InterstitialConfig {
    /// Interstitial length for `active` remaining participants.
    #[must_use]
    pub fn duration_for(&self, active: usize) -> f64 {
        if active == 2 {
            self.two_remaining_secs
        } else {
            self.duration_secs
        }
    }
}

/// Result of stepping the interstitial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterstitialStatus {
    /// Nothing is running.
    Idle,
    /// Still counting down.
    Counting,
    /// Finished this step; any freeze has been released.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Running {
    remaining_secs: f64,
    /// Freeze epoch at push time, if a freeze is held.
    freeze: Option<u64>,
    next: Option<ParticipantId>,
    shown: u32,
}

/// A cancellable real-time countdown.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Interstitial {
    running: Option<Running>,
}

impl Interstitial {
    /// Creates an idle interstitial.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while counting.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.running.is_some()
    }

    /// Seconds left, if counting.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<f64> {
        self.running.map(|running| running.remaining_secs)
    }

    /// Starts counting `duration_secs`, cancelling any interstitial already
    /// in flight first.
    pub fn start(
        &mut self,
        duration_secs: f64,
        hold_freeze: bool,
        next: Option<ParticipantId>,
        countdown: &mut CountdownScheduler,
        display: &mut dyn InterstitialDisplay,
    ) {
        self.cancel(countdown, display);
        let freeze = hold_freeze.then(|| {
            let epoch = countdown.freeze_epoch();
            countdown.push_freeze("interstitial");
            epoch
        });
        let shown = whole_seconds(duration_secs);
        display.show_countdown(next, shown);
        debug!(duration_secs, next = ?next, hold_freeze, "interstitial started");
        self.running = Some(Running {
            remaining_secs: duration_secs.max(0.0),
            freeze,
            next,
            shown,
        });
    }

    /// Advances by `real_secs`.
    pub fn step(
        &mut self,
        real_secs: f64,
        countdown: &mut CountdownScheduler,
        display: &mut dyn InterstitialDisplay,
    ) -> InterstitialStatus {
        let Some(running) = self.running.as_mut() else {
            return InterstitialStatus::Idle;
        };
        running.remaining_secs = (running.remaining_secs - real_secs.max(0.0)).max(0.0);
        if running.remaining_secs > EPSILON {
            let shown = whole_seconds(running.remaining_secs);
            if shown != running.shown {
                running.shown = shown;
                display.show_countdown(running.next, shown);
            }
            return InterstitialStatus::Counting;
        }
        self.release(countdown, display);
        debug!("interstitial finished");
        InterstitialStatus::Done
    }

    /// Stops counting immediately and releases any freeze held. Returns
    /// `true` if something was cancelled.
    pub fn cancel(
        &mut self,
        countdown: &mut CountdownScheduler,
        display: &mut dyn InterstitialDisplay,
    ) -> bool {
        if self.running.is_none() {
            return false;
        }
        self.release(countdown, display);
        debug!("interstitial cancelled");
        true
    }

    fn release(&mut self, countdown: &mut CountdownScheduler, display: &mut dyn InterstitialDisplay) {
        if let Some(running) = self.running.take() {
            if let Some(epoch) = running.freeze {
                countdown.release_freeze(epoch);
            }
            display.hide();
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_seconds(secs: f64) -> u32 {
    secs.max(0.0).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use partyturn_countdown::CountdownConfig;
    use partyturn_test_support::{InterstitialCall, RecordingInterstitialDisplay};

    fn scheduler() -> CountdownScheduler {
        CountdownScheduler::new(CountdownConfig::default())
    }

    #[test]
    fn test_duration_is_shorter_with_two_left() {
        let config = InterstitialConfig::default();
        assert!((config.duration_for(2) - 2.0).abs() < f64::EPSILON);
        assert!((config.duration_for(3) - 3.0).abs() < f64::EPSILON);
        assert!((config.duration_for(5) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_counts_down_whole_seconds_then_releases_freeze() {
        let mut countdown = scheduler();
        let mut display = RecordingInterstitialDisplay::default();
        let mut interstitial = Interstitial::new();
        let next = Some(ParticipantId(1));

        interstitial.start(3.0, true, next, &mut countdown, &mut display);
        assert_eq!(countdown.freeze_depth(), 1);

        let mut statuses = Vec::new();
        for _ in 0..6 {
            statuses.push(interstitial.step(0.6, &mut countdown, &mut display));
        }

        assert_eq!(
            statuses,
            vec![
                InterstitialStatus::Counting,
                InterstitialStatus::Counting,
                InterstitialStatus::Counting,
                InterstitialStatus::Counting,
                InterstitialStatus::Done,
                InterstitialStatus::Idle,
            ]
        );
        assert_eq!(countdown.freeze_depth(), 0);
        assert_eq!(
            display.calls(),
            vec![
                InterstitialCall::Countdown(next, 3),
                InterstitialCall::Countdown(next, 2),
                InterstitialCall::Countdown(next, 1),
                InterstitialCall::Hide,
            ]
        );
    }

    #[test]
    fn test_without_hold_no_freeze_is_taken() {
        let mut countdown = scheduler();
        let mut display = RecordingInterstitialDisplay::default();
        let mut interstitial = Interstitial::new();

        interstitial.start(1.0, false, None, &mut countdown, &mut display);
        assert_eq!(countdown.freeze_depth(), 0);
        assert_eq!(
            interstitial.step(1.0, &mut countdown, &mut display),
            InterstitialStatus::Done
        );
        assert_eq!(countdown.freeze_depth(), 0);
    }

    #[test]
    fn test_restart_while_counting_does_not_leak_freeze() {
        let mut countdown = scheduler();
        let mut display = RecordingInterstitialDisplay::default();
        let mut interstitial = Interstitial::new();

        interstitial.start(3.0, true, None, &mut countdown, &mut display);
        interstitial.step(1.0, &mut countdown, &mut display);
        interstitial.start(3.0, true, None, &mut countdown, &mut display);

        assert_eq!(countdown.freeze_depth(), 1);
        interstitial.step(3.0, &mut countdown, &mut display);
        assert_eq!(countdown.freeze_depth(), 0);
    }

    #[test]
    fn test_cancel_releases_only_its_own_freeze() {
        let mut countdown = scheduler();
        let mut display = RecordingInterstitialDisplay::default();
        let mut interstitial = Interstitial::new();
        countdown.push_freeze("activity");

        interstitial.start(3.0, true, None, &mut countdown, &mut display);
        assert_eq!(countdown.freeze_depth(), 2);
        assert!(interstitial.cancel(&mut countdown, &mut display));
        assert!(!interstitial.cancel(&mut countdown, &mut display));

        assert_eq!(countdown.freeze_depth(), 1);
        assert!(!interstitial.is_active());
    }

    #[test]
    fn test_release_after_clear_spares_a_newer_freeze() {
        let mut countdown = scheduler();
        let mut display = RecordingInterstitialDisplay::default();
        let mut interstitial = Interstitial::new();

        interstitial.start(3.0, true, None, &mut countdown, &mut display);
        countdown.clear_freeze();
        countdown.push_freeze("pause menu");

        assert_eq!(
            interstitial.step(3.0, &mut countdown, &mut display),
            InterstitialStatus::Done
        );
        assert_eq!(countdown.freeze_depth(), 1);
    }
}
