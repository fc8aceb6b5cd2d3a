//! Partyturn — activity orchestration.
//!
//! Picks one activity (minigame) per turn, drives it until it completes,
//! advances the roster and runs the "next turn" interstitial before picking
//! again. An elimination mid-activity aborts the activity and restarts the
//! countdown for the next participant.

pub mod activity;
pub mod completion;
pub mod interstitial;
pub mod orchestrator;
pub mod pool;

pub use activity::{Activity, ActivityContext, ActivityKind, TurnContext};
pub use completion::{CompletionSignal, CompletionSubscription};
pub use interstitial::{Interstitial, InterstitialConfig, InterstitialStatus};
pub use orchestrator::{ActivityOrchestrator, OrchestratorEvent, OrchestratorState};
pub use pool::{ActivityPool, SelectionConfig, SelectionMode};
