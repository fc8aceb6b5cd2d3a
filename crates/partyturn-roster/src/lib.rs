//! Partyturn — participant roster.
//!
//! Tracks which participants are still in the round and whose turn it is.

pub mod roster;

pub use roster::{ParticipantRoster, TurnCycleEvent};
