//! Clock abstraction and frame timing.
//!
//! Two time sources are distinguished. *Logical* time follows the host's
//! time scale and stops entirely under a global pause. *Real* time is the
//! unscaled wall clock and never stops; the elimination hold and the
//! interstitial are measured on it.

use chrono::{DateTime, Utc};

/// Abstraction over system time for deterministic behavior.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Elapsed time for one host tick, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// Scaled time; zero while the host is globally paused.
    pub logical_secs: f64,
    /// Unscaled wall-clock time.
    pub real_secs: f64,
}

impl Frame {
    /// A frame where logical and real time advance together.
    #[must_use]
    pub fn uniform(secs: f64) -> Self {
        Self {
            logical_secs: secs,
            real_secs: secs,
        }
    }

    /// A frame under global pause: only real time advances.
    #[must_use]
    pub fn paused(real_secs: f64) -> Self {
        Self {
            logical_secs: 0.0,
            real_secs,
        }
    }
}

/// Turns successive clock reads into [`Frame`]s.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last: DateTime<Utc>,
}

impl FrameClock {
    /// Starts measuring from the clock's current time.
    #[must_use]
    pub fn new(clock: &dyn Clock) -> Self {
        Self { last: clock.now() }
    }

    /// Measures the time since the previous call.
    ///
    /// `time_scale` multiplies real time into logical time; `0.0` is a global
    /// pause. A clock that moves backwards yields an empty frame.
    pub fn next_frame(&mut self, clock: &dyn Clock, time_scale: f64) -> Frame {
        let now = clock.now();
        let real_secs = (now - self.last)
            .to_std()
            .map(|elapsed| elapsed.as_secs_f64())
            .unwrap_or(0.0);
        self.last = now;
        Frame {
            logical_secs: real_secs * time_scale.max(0.0),
            real_secs,
        }
    }
}
