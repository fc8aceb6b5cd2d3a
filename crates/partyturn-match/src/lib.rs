//! Partyturn — match controller.
//!
//! Owns the roster, the elimination countdown and the activity orchestrator
//! for one match and drives them from a single host tick, in that order.
//! Configuration loads from YAML or JSON; everything that happens during a
//! tick is reported back as a list of [`MatchEvent`]s.

pub mod config;
pub mod controller;
pub mod error;
pub mod event;

pub use config::MatchConfig;
pub use controller::{MatchBuilder, MatchController, MatchPhase};
pub use error::ConfigError;
pub use event::MatchEvent;
