//! Cooperative bounded waits.
//!
//! A wait is stepped once per host tick with the real elapsed time and a
//! probe. It resolves as soon as the probe yields a value, or gives up once
//! the timeout elapses so the caller can continue in degraded mode.

/// Outcome of one [`BoundedWait::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus<T> {
    /// The probe produced a value.
    Ready(T),
    /// Still waiting; step again next tick.
    Pending,
    /// The timeout elapsed without a value.
    TimedOut,
}

/// A wait with an upper bound measured in real seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundedWait {
    waited_secs: f64,
    timeout_secs: f64,
}

impl BoundedWait {
    /// Creates a wait that gives up after `timeout_secs`.
    #[must_use]
    pub fn new(timeout_secs: f64) -> Self {
        Self {
            waited_secs: 0.0,
            timeout_secs: timeout_secs.max(0.0),
        }
    }

    /// Seconds spent waiting so far.
    #[must_use]
    pub fn waited_secs(&self) -> f64 {
        self.waited_secs
    }

    /// Probes once, then accounts `real_secs` towards the timeout.
    pub fn step<T>(&mut self, real_secs: f64, probe: impl FnOnce() -> Option<T>) -> WaitStatus<T> {
        if let Some(value) = probe() {
            return WaitStatus::Ready(value);
        }
        self.waited_secs += real_secs.max(0.0);
        if self.waited_secs >= self.timeout_secs {
            WaitStatus::TimedOut
        } else {
            WaitStatus::Pending
        }
    }
}
