//! Partyturn — elimination countdown.
//!
//! Runs one real-time countdown bound to the roster's current participant.
//! A participant whose time runs out is eliminated after a short hold, and
//! every survivor receives bonus time. Pauses ("freezes") are reentrant: any
//! number of independent callers may hold one at once.

pub mod config;
pub mod freeze;
pub mod scheduler;
pub mod state;

pub use config::CountdownConfig;
pub use freeze::FreezeStack;
pub use scheduler::{CountdownScheduler, CountdownSignal, SchedulerPhase};
pub use state::CountdownState;

/// Tolerance for comparisons against zero and window thresholds.
pub const EPSILON: f64 = 1e-4;
