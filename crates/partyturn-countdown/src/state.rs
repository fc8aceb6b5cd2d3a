//! Per-participant countdown state.

use serde::{Deserialize, Serialize};

use crate::EPSILON;

/// One participant's time allotment.
///
/// `0 <= remaining <= max` always holds. `initial_max` is fixed at creation
/// and anchors the bonus window even after `max` grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountdownState {
    remaining: f64,
    max: f64,
    initial_max: f64,
}

impl CountdownState {
    /// A full allotment of `duration_secs`.
    #[must_use]
    pub fn new(duration_secs: f64) -> Self {
        let duration = duration_secs.max(0.0);
        Self {
            remaining: duration,
            max: duration,
            initial_max: duration,
        }
    }

    /// A state with `remaining_secs` left of `max_secs`, clamped into range.
    #[must_use]
    pub fn with_remaining(max_secs: f64, remaining_secs: f64) -> Self {
        let mut state = Self::new(max_secs);
        state.remaining = remaining_secs.clamp(0.0, state.max);
        state
    }

    /// Seconds left.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Current capacity.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Capacity at creation.
    #[must_use]
    pub fn initial_max(&self) -> f64 {
        self.initial_max
    }

    /// Returns `true` once the allotment is used up.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining <= EPSILON
    }

    /// Subtracts elapsed time, snapping to zero inside the epsilon band.
    pub fn decrement(&mut self, secs: f64) {
        self.remaining = (self.remaining - secs.max(0.0)).max(0.0);
        if self.remaining <= EPSILON {
            self.remaining = 0.0;
        }
    }

    /// `0 < remaining <= fraction * initial_max`.
    #[must_use]
    pub fn is_in_bonus_window(&self, fraction: f64) -> bool {
        self.remaining > EPSILON && self.remaining <= fraction * self.initial_max + EPSILON
    }

    /// Adds to `remaining` without exceeding `max`.
    pub fn add_capped(&mut self, secs: f64) {
        self.remaining = (self.remaining + secs.max(0.0)).min(self.max);
    }

    /// Raises both `max` and `remaining`.
    pub fn extend(&mut self, secs: f64) {
        let secs = secs.max(0.0);
        self.max += secs;
        self.remaining += secs;
    }
}
