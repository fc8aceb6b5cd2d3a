//! Partyturn Core — shared turn-engine abstractions.
//!
//! This crate defines the fundamental traits and types that the roster,
//! countdown and orchestration crates depend on. It contains no game rules
//! and no presentation code.

pub mod clock;
pub mod collaborators;
pub mod error;
pub mod event;
pub mod participant;
pub mod rng;
pub mod wait;
