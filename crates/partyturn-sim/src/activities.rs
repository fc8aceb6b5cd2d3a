//! Demo activities played by simulated participants.
//!
//! Each one stands in for a minigame: it decides at start how long the
//! simulated participant needs, then plays on logical time until done or
//! until the countdown runs out first.

use std::sync::{Arc, Mutex, PoisonError};

use partyturn_core::clock::Frame;
use partyturn_core::rng::{DeterministicRng, SeededRng};
use partyturn_orchestrator::{
    Activity, ActivityContext, ActivityKind, ActivityPool, CompletionSignal,
};
use tracing::{debug, info};

type SharedRng = Arc<Mutex<SeededRng>>;

fn draw_secs(rng: &SharedRng, min: u32, max: u32) -> f64 {
    let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
    let whole = rng.next_u32_range(min, max);
    f64::from(whole) + rng.next_f64()
}

/// The pool the simulator plays: a tutorial first, then the rest at random.
pub fn demo_pool(seed: Option<u64>) -> ActivityPool {
    let rng: SharedRng = Arc::new(Mutex::new(match seed {
        Some(seed) => SeededRng::from_seed(seed.wrapping_add(2)),
        None => SeededRng::from_os(),
    }));

    let mut pool = ActivityPool::new();
    pool.register(ActivityKind::Tutorial, Tutorial::new);
    let taps = Arc::clone(&rng);
    pool.register(ActivityKind::TapTargets, move || TapTargets::new(draw_secs(&taps, 4, 20)));
    let puzzles = Arc::clone(&rng);
    pool.register(ActivityKind::PhysicsPuzzle, move || {
        PhysicsPuzzle::new(draw_secs(&puzzles, 1, 2), draw_secs(&puzzles, 6, 22))
    });
    pool.register(ActivityKind::QuickDraw, move || QuickDraw::new(draw_secs(&rng, 0, 1)));
    pool
}

/// Introductory walkthrough. Reading it does not use up a turn.
pub struct Tutorial {
    read_secs: f64,
    elapsed_secs: f64,
    signal: CompletionSignal,
}

impl Tutorial {
    pub fn new() -> Self {
        Self {
            read_secs: 3.0,
            elapsed_secs: 0.0,
            signal: CompletionSignal::new(),
        }
    }
}

impl Activity for Tutorial {
    fn kind(&self) -> ActivityKind {
        ActivityKind::Tutorial
    }

    fn start(&mut self, _ctx: &mut ActivityContext<'_>) {
        self.elapsed_secs = 0.0;
    }

    fn update(&mut self, _ctx: &mut ActivityContext<'_>, frame: &Frame) {
        self.elapsed_secs += frame.real_secs;
        if self.elapsed_secs >= self.read_secs {
            self.signal.fire();
        }
    }

    fn abort(&mut self, _ctx: &mut ActivityContext<'_>) -> bool {
        true
    }

    fn completion(&mut self) -> Option<&mut CompletionSignal> {
        Some(&mut self.signal)
    }

    fn skip_turn_advance(&self) -> bool {
        true
    }
}

/// Tap every target before time runs out. Each hit made inside the bonus
/// window buys a little time back.
pub struct TapTargets {
    needed_secs: f64,
    played_secs: f64,
    next_hit_secs: f64,
    signal: CompletionSignal,
}

impl TapTargets {
    const HIT_EVERY_SECS: f64 = 2.0;
    const HIT_BONUS_SECS: f64 = 1.5;

    pub fn new(needed_secs: f64) -> Self {
        Self {
            needed_secs,
            played_secs: 0.0,
            next_hit_secs: Self::HIT_EVERY_SECS,
            signal: CompletionSignal::new(),
        }
    }
}

impl Activity for TapTargets {
    fn kind(&self) -> ActivityKind {
        ActivityKind::TapTargets
    }

    fn start(&mut self, ctx: &mut ActivityContext<'_>) {
        self.played_secs = 0.0;
        self.next_hit_secs = Self::HIT_EVERY_SECS;
        debug!(participant = ?ctx.participant(), needed_secs = self.needed_secs, "tap targets started");
    }

    fn update(&mut self, ctx: &mut ActivityContext<'_>, frame: &Frame) {
        self.played_secs += frame.logical_secs;
        while self.played_secs >= self.next_hit_secs {
            self.next_hit_secs += Self::HIT_EVERY_SECS;
            if ctx.grant_bonus_if_in_window(Self::HIT_BONUS_SECS) {
                info!(participant = ?ctx.participant(), "late hit bought time");
            }
        }
        if self.played_secs >= self.needed_secs {
            self.signal.fire();
        }
    }

    fn abort(&mut self, _ctx: &mut ActivityContext<'_>) -> bool {
        true
    }

    fn completion(&mut self) -> Option<&mut CompletionSignal> {
        Some(&mut self.signal)
    }
}

/// The timer is frozen while the pieces settle; a solved puzzle permanently
/// extends the solver's allotment.
pub struct PhysicsPuzzle {
    settle_secs: f64,
    needed_secs: f64,
    settled_secs: f64,
    played_secs: f64,
    holding_freeze: bool,
    signal: CompletionSignal,
}

impl PhysicsPuzzle {
    const SOLVE_REWARD_SECS: f64 = 2.0;

    pub fn new(settle_secs: f64, needed_secs: f64) -> Self {
        Self {
            settle_secs,
            needed_secs,
            settled_secs: 0.0,
            played_secs: 0.0,
            holding_freeze: false,
            signal: CompletionSignal::new(),
        }
    }

    fn release(&mut self, ctx: &mut ActivityContext<'_>) {
        if self.holding_freeze {
            self.holding_freeze = false;
            ctx.pop_freeze();
        }
    }
}

impl Activity for PhysicsPuzzle {
    fn kind(&self) -> ActivityKind {
        ActivityKind::PhysicsPuzzle
    }

    fn start(&mut self, ctx: &mut ActivityContext<'_>) {
        self.settled_secs = 0.0;
        self.played_secs = 0.0;
        ctx.push_freeze("physics settling");
        self.holding_freeze = true;
    }

    fn update(&mut self, ctx: &mut ActivityContext<'_>, frame: &Frame) {
        if self.holding_freeze {
            self.settled_secs += frame.real_secs;
            if self.settled_secs >= self.settle_secs {
                self.release(ctx);
            }
            return;
        }
        self.played_secs += frame.logical_secs;
        if self.played_secs >= self.needed_secs && self.signal.fire() {
            ctx.grant_unconditional_bonus(Self::SOLVE_REWARD_SECS);
        }
    }

    fn abort(&mut self, ctx: &mut ActivityContext<'_>) -> bool {
        self.release(ctx);
        true
    }

    fn completion(&mut self) -> Option<&mut CompletionSignal> {
        Some(&mut self.signal)
    }
}

/// Resolved the instant it starts; exposes no completion signal.
pub struct QuickDraw {
    reaction_secs: f64,
}

impl QuickDraw {
    pub fn new(reaction_secs: f64) -> Self {
        Self { reaction_secs }
    }
}

impl Activity for QuickDraw {
    fn kind(&self) -> ActivityKind {
        ActivityKind::QuickDraw
    }

    fn start(&mut self, ctx: &mut ActivityContext<'_>) {
        info!(
            participant = ?ctx.participant(),
            reaction_secs = self.reaction_secs,
            "quick draw"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partyturn_core::participant::ParticipantId;
    use partyturn_countdown::{CountdownConfig, CountdownScheduler};
    use partyturn_orchestrator::TurnContext;
    use partyturn_roster::ParticipantRoster;
    use partyturn_test_support::MockRng;

    fn seated() -> (ParticipantRoster, CountdownScheduler) {
        let mut roster = ParticipantRoster::new();
        roster.initialize(3, &mut MockRng);
        let mut countdown = CountdownScheduler::new(CountdownConfig::default());
        countdown.start(&roster);
        (roster, countdown)
    }

    #[test]
    fn test_demo_pool_starts_with_tutorial() {
        let pool = demo_pool(Some(1));
        assert_eq!(
            pool.kinds(),
            vec![
                ActivityKind::Tutorial,
                ActivityKind::TapTargets,
                ActivityKind::PhysicsPuzzle,
                ActivityKind::QuickDraw,
            ]
        );
    }

    #[test]
    fn test_tutorial_keeps_the_turn() {
        let (mut roster, mut countdown) = seated();
        let mut turn = TurnContext::new(&mut roster, &mut countdown);
        let mut tutorial = Tutorial::new();
        tutorial.signal.arm();
        tutorial.start(&mut turn.activity_context());

        tutorial.update(&mut turn.activity_context(), &Frame::paused(3.0));

        assert!(tutorial.signal.is_fired());
        assert!(tutorial.skip_turn_advance());
    }

    #[test]
    fn test_physics_puzzle_holds_freeze_until_settled() {
        let (mut roster, mut countdown) = seated();
        let mut turn = TurnContext::new(&mut roster, &mut countdown);
        let mut puzzle = PhysicsPuzzle::new(1.0, 2.0);
        puzzle.signal.arm();

        puzzle.start(&mut turn.activity_context());
        assert_eq!(turn.countdown.freeze_depth(), 1);

        puzzle.update(&mut turn.activity_context(), &Frame::uniform(1.0));
        assert_eq!(turn.countdown.freeze_depth(), 0);

        puzzle.update(&mut turn.activity_context(), &Frame::uniform(2.0));
        assert!(puzzle.signal.is_fired());
        let state = turn.countdown.state(ParticipantId(0)).unwrap();
        assert!((state.max() - 22.0).abs() < 1e-9);
    }

    #[test]
    fn test_physics_puzzle_abort_releases_freeze_once() {
        let (mut roster, mut countdown) = seated();
        let mut turn = TurnContext::new(&mut roster, &mut countdown);
        let mut puzzle = PhysicsPuzzle::new(5.0, 5.0);
        puzzle.start(&mut turn.activity_context());

        assert!(puzzle.abort(&mut turn.activity_context()));
        assert!(puzzle.abort(&mut turn.activity_context()));

        assert_eq!(turn.countdown.freeze_depth(), 0);
    }

    #[test]
    fn test_tap_targets_grants_bonus_only_in_window() {
        let (mut roster, mut countdown) = seated();
        let mut turn = TurnContext::new(&mut roster, &mut countdown);
        let mut taps = TapTargets::new(100.0);
        taps.start(&mut turn.activity_context());

        // 20s allotment for three participants; 15s in, 5s left is in the window.
        turn.countdown.tick(&Frame::uniform(15.0), turn.roster);
        taps.update(&mut turn.activity_context(), &Frame::uniform(2.0));

        let remaining = turn.countdown.remaining(ParticipantId(0)).unwrap();
        assert!((remaining - 6.5).abs() < 1e-9);
    }
}
