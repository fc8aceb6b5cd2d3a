//! Countdown tuning.

use partyturn_core::error::TurnError;
use serde::{Deserialize, Serialize};

/// Timing constants for the elimination countdown. All values are seconds
/// unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Allotment per participant at a full table.
    pub base_duration_secs: f64,
    /// Extra allotment per participant missing from a full table.
    pub short_handed_bonus_secs: f64,
    /// Table size at which no short-handed bonus applies (participants).
    pub full_table_size: usize,
    /// Time granted to every survivor after an elimination.
    pub elimination_bonus_secs: f64,
    /// Real-time hold between running out and leaving the round.
    pub elimination_hold_secs: f64,
    /// Share of the original allotment that forms the bonus window.
    pub bonus_window_fraction: f64,
    /// Remaining time at which the tick sound starts.
    pub tick_warning_secs: f64,
    /// How long `start` waits for the roster to report a participant.
    pub participant_wait_secs: f64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            base_duration_secs: 15.0,
            short_handed_bonus_secs: 5.0,
            full_table_size: 4,
            elimination_bonus_secs: 10.0,
            elimination_hold_secs: 2.0,
            bonus_window_fraction: 0.25,
            tick_warning_secs: 5.0,
            participant_wait_secs: 2.0,
        }
    }
}

impl CountdownConfig {
    /// Allotment for a participant when `active` participants remain.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_for(&self, active: usize) -> f64 {
        let missing = self.full_table_size.saturating_sub(active);
        self.base_duration_secs + self.short_handed_bonus_secs * missing as f64
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<(), TurnError> {
        let positive = [
            ("base_duration_secs", self.base_duration_secs),
            ("elimination_hold_secs", self.elimination_hold_secs),
            ("participant_wait_secs", self.participant_wait_secs),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(TurnError::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        let non_negative = [
            ("short_handed_bonus_secs", self.short_handed_bonus_secs),
            ("elimination_bonus_secs", self.elimination_bonus_secs),
            ("tick_warning_secs", self.tick_warning_secs),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(TurnError::InvalidConfig(format!("{name} must be >= 0")));
            }
        }
        if !(self.bonus_window_fraction > 0.0 && self.bonus_window_fraction <= 1.0) {
            return Err(TurnError::InvalidConfig(
                "bonus_window_fraction must be in (0, 1]".to_owned(),
            ));
        }
        Ok(())
    }
}
