//! Shared test helpers for match integration tests.
#![allow(dead_code)]

use partyturn_core::clock::Frame;
use partyturn_core::participant::ParticipantId;
use partyturn_match::{MatchConfig, MatchController, MatchEvent, MatchPhase};
use partyturn_orchestrator::{
    Activity, ActivityContext, ActivityKind, ActivityPool, CompletionSignal,
};
use partyturn_test_support::{
    MockRng, RecordingEliminationSink, RecordingInstructionDisplay, RecordingTimerPresenter,
    SequenceRng,
};

/// Never completes; aborts cleanly.
pub struct Stall {
    signal: CompletionSignal,
}

impl Stall {
    pub fn new() -> Self {
        Self {
            signal: CompletionSignal::new(),
        }
    }
}

impl Activity for Stall {
    fn kind(&self) -> ActivityKind {
        ActivityKind::PatternMemory
    }

    fn start(&mut self, _ctx: &mut ActivityContext<'_>) {}

    fn abort(&mut self, _ctx: &mut ActivityContext<'_>) -> bool {
        true
    }

    fn completion(&mut self) -> Option<&mut CompletionSignal> {
        Some(&mut self.signal)
    }
}

/// Completes after a fixed number of updates.
pub struct Finisher {
    kind: ActivityKind,
    after: usize,
    updates: usize,
    signal: CompletionSignal,
}

impl Finisher {
    pub fn new(kind: ActivityKind, after: usize) -> Self {
        Self {
            kind,
            after,
            updates: 0,
            signal: CompletionSignal::new(),
        }
    }
}

impl Activity for Finisher {
    fn kind(&self) -> ActivityKind {
        self.kind
    }

    fn start(&mut self, _ctx: &mut ActivityContext<'_>) {
        self.updates = 0;
    }

    fn update(&mut self, _ctx: &mut ActivityContext<'_>, _frame: &Frame) {
        self.updates += 1;
        if self.updates == self.after {
            self.signal.fire();
        }
    }

    fn completion(&mut self) -> Option<&mut CompletionSignal> {
        Some(&mut self.signal)
    }
}

/// Never completes, but claims window bonus time on every update.
pub struct BonusGrabber {
    seconds: f64,
    signal: CompletionSignal,
}

impl BonusGrabber {
    pub fn new(seconds: f64) -> Self {
        Self {
            seconds,
            signal: CompletionSignal::new(),
        }
    }
}

impl Activity for BonusGrabber {
    fn kind(&self) -> ActivityKind {
        ActivityKind::QuickDraw
    }

    fn start(&mut self, _ctx: &mut ActivityContext<'_>) {}

    fn update(&mut self, ctx: &mut ActivityContext<'_>, _frame: &Frame) {
        ctx.grant_bonus_if_in_window(self.seconds);
    }

    fn completion(&mut self) -> Option<&mut CompletionSignal> {
        Some(&mut self.signal)
    }
}

/// Resolved inside `start`; exposes no completion signal.
pub struct Snap;

impl Activity for Snap {
    fn kind(&self) -> ActivityKind {
        ActivityKind::TapTargets
    }

    fn start(&mut self, _ctx: &mut ActivityContext<'_>) {}
}

/// One-second countdowns, half-second hold and interstitial, no
/// short-handed bonus.
pub fn fast_config(participants: usize) -> MatchConfig {
    let mut config = MatchConfig {
        participants,
        ..MatchConfig::default()
    };
    config.countdown.base_duration_secs = 1.0;
    config.countdown.short_handed_bonus_secs = 0.0;
    config.countdown.elimination_hold_secs = 0.5;
    config.interstitial.duration_secs = 0.5;
    config.interstitial.two_remaining_secs = 0.5;
    config
}

/// A controller plus handles on its recording collaborators.
pub struct Harness {
    pub controller: MatchController,
    pub sink: RecordingEliminationSink,
    pub timer: RecordingTimerPresenter,
    pub instructions: RecordingInstructionDisplay,
}

/// Builds a controller whose first turn goes to `first_seat`.
pub fn harness(config: MatchConfig, pool: ActivityPool, first_seat: u32) -> Harness {
    let sink = RecordingEliminationSink::default();
    let timer = RecordingTimerPresenter::default();
    let instructions = RecordingInstructionDisplay::default();
    let controller = MatchController::builder(config)
        .pool(pool)
        .roster_rng(SequenceRng::new(vec![first_seat]))
        .activity_rng(MockRng)
        .elimination_sink(sink.clone())
        .timer_presenter(timer.clone())
        .instruction_display(instructions.clone())
        .build()
        .unwrap();
    Harness {
        controller,
        sink,
        timer,
        instructions,
    }
}

/// Ticks up to `ticks` times, stopping early once the match leaves
/// `Playing`. Returns every event produced.
pub fn run(controller: &mut MatchController, frame: Frame, ticks: usize) -> Vec<MatchEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        if controller.phase() != MatchPhase::Playing {
            break;
        }
        events.extend(controller.tick(&frame));
    }
    events
}

/// The participants the turn passed to, in order.
pub fn turns(events: &[MatchEvent]) -> Vec<ParticipantId> {
    events
        .iter()
        .filter_map(|event| match event {
            MatchEvent::TurnAdvanced { participant } => Some(*participant),
            _ => None,
        })
        .collect()
}

/// The activities dispatched, in order.
pub fn dispatched(events: &[MatchEvent]) -> Vec<(ActivityKind, Option<ParticipantId>)> {
    events
        .iter()
        .filter_map(|event| match event {
            MatchEvent::ActivityDispatched { kind, participant } => Some((*kind, *participant)),
            _ => None,
        })
        .collect()
}
