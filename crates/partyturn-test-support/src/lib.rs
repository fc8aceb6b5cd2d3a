//! Shared test mocks and utilities for the Partyturn turn engine.

mod clock;
mod collaborators;
mod rng;

pub use clock::{FixedClock, ManualClock};
pub use collaborators::{
    InstructionCall, InterstitialCall, RecordingEliminationSink, RecordingInstructionDisplay,
    RecordingInterstitialDisplay, RecordingTimerPresenter, TimerCall,
};
pub use rng::{MockRng, SequenceRng};
