//! The activity contract.

use partyturn_core::clock::Frame;
use partyturn_core::collaborators::{DifficultyProvider, InstructionKind};
use partyturn_core::participant::ParticipantId;
use partyturn_countdown::CountdownScheduler;
use partyturn_roster::ParticipantRoster;
use serde::{Deserialize, Serialize};

use crate::completion::CompletionSignal;

/// Every minigame the orchestrator knows how to introduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Walkthrough played before anything else.
    Tutorial,
    /// Tap the targets before they vanish.
    TapTargets,
    /// Tap the tiles matching the called colour.
    ColorMatch,
    /// Repeat a growing sequence.
    SequenceRepeat,
    /// Recall a briefly shown pattern.
    PatternMemory,
    /// Get the ball into the cup.
    PhysicsPuzzle,
    /// Slide tiles into order.
    SlidingPuzzle,
    /// React to the cue faster than the timer.
    QuickDraw,
    /// Keep the beam level.
    BalanceBeam,
}

impl ActivityKind {
    /// The instruction panel shown before this activity.
    #[must_use]
    pub fn instruction_kind(self) -> InstructionKind {
        match self {
            Self::Tutorial => InstructionKind::Tutorial,
            Self::TapTargets | Self::ColorMatch => InstructionKind::Tap,
            Self::SequenceRepeat | Self::PatternMemory => InstructionKind::Repeat,
            Self::PhysicsPuzzle | Self::SlidingPuzzle => InstructionKind::Solve,
            Self::QuickDraw => InstructionKind::React,
            Self::BalanceBeam => InstructionKind::Steady,
        }
    }

    /// Introductory activities are forced on the first selection of a
    /// session.
    #[must_use]
    pub fn is_introductory(self) -> bool {
        matches!(self, Self::Tutorial)
    }
}

/// What a running activity may see and touch.
///
/// The roster is read-only; the countdown is reachable for freezes and bonus
/// time. Freezes taken through [`push_freeze`](Self::push_freeze) are
/// counted, and the orchestrator releases any the activity still holds when
/// it finishes or is aborted.
#[derive(Debug)]
pub struct ActivityContext<'a> {
    /// Active participants and the current turn.
    pub roster: &'a ParticipantRoster,
    /// The elimination countdown.
    pub countdown: &'a mut CountdownScheduler,
    pushed: usize,
    popped: usize,
}

impl ActivityContext<'_> {
    /// The participant playing this turn.
    #[must_use]
    pub fn participant(&self) -> Option<ParticipantId> {
        self.roster.current()
    }

    /// Number of participants still in the round, for difficulty scaling.
    #[must_use]
    pub fn active_participants(&self) -> usize {
        self.roster.active_participant_count()
    }

    /// Pauses the countdown until a matching [`pop_freeze`](Self::pop_freeze).
    pub fn push_freeze(&mut self, reason: &str) -> usize {
        self.pushed += 1;
        self.countdown.push_freeze(reason)
    }

    /// Releases one freeze taken with [`push_freeze`](Self::push_freeze).
    pub fn pop_freeze(&mut self) -> usize {
        self.popped += 1;
        self.countdown.pop_freeze()
    }

    /// Rewards a success with bonus time if the current participant is in
    /// their bonus window.
    pub fn grant_bonus_if_in_window(&mut self, seconds: f64) -> bool {
        let participant = self.participant();
        self.countdown.grant_bonus_if_in_window(seconds, participant)
    }

    /// Permanently extends the current participant's allotment.
    pub fn grant_unconditional_bonus(&mut self, seconds: f64) -> bool {
        match self.participant() {
            Some(participant) => self.countdown.grant_unconditional_bonus(participant, seconds),
            None => false,
        }
    }
}

/// Mutable access to the round's shared state, lent to the orchestrator for
/// one call.
#[derive(Debug)]
pub struct TurnContext<'a> {
    /// Active participants and the current turn.
    pub roster: &'a mut ParticipantRoster,
    /// The elimination countdown.
    pub countdown: &'a mut CountdownScheduler,
}

impl<'a> TurnContext<'a> {
    /// Bundles the roster and countdown.
    pub fn new(roster: &'a mut ParticipantRoster, countdown: &'a mut CountdownScheduler) -> Self {
        Self { roster, countdown }
    }

    /// The narrower view handed to activities.
    pub fn activity_context(&mut self) -> ActivityContext<'_> {
        ActivityContext {
            roster: &*self.roster,
            countdown: &mut *self.countdown,
            pushed: 0,
            popped: 0,
        }
    }
}

/// Freezes an activity took through its contexts and has not released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeldFreezes {
    count: usize,
    epoch: u64,
}

impl HeldFreezes {
    pub(crate) fn new(countdown: &CountdownScheduler) -> Self {
        Self {
            count: 0,
            epoch: countdown.freeze_epoch(),
        }
    }

    /// Folds in the pushes and pops made through one context.
    pub(crate) fn record(&mut self, ctx: &ActivityContext<'_>) {
        let epoch = ctx.countdown.freeze_epoch();
        if epoch != self.epoch {
            self.count = 0;
            self.epoch = epoch;
        }
        self.count = (self.count + ctx.pushed).saturating_sub(ctx.popped);
    }

    /// Pops every freeze still held and returns how many were released.
    pub(crate) fn release(&mut self, countdown: &mut CountdownScheduler) -> usize {
        let held = std::mem::take(&mut self.count);
        let mut released = 0;
        for _ in 0..held {
            if countdown.release_freeze(self.epoch) {
                released += 1;
            }
        }
        released
    }
}

/// One minigame instance, created per dispatch and discarded on completion.
///
/// Only [`kind`](Self::kind) and [`start`](Self::start) are required. An
/// activity without a completion signal is treated as finished as soon as it
/// has started.
pub trait Activity: Send {
    /// Which minigame this is.
    fn kind(&self) -> ActivityKind;

    /// Begins the activity for the current participant.
    fn start(&mut self, ctx: &mut ActivityContext<'_>);

    /// Advances the activity by one host tick. Not called during an
    /// elimination hold.
    fn update(&mut self, _ctx: &mut ActivityContext<'_>, _frame: &Frame) {}

    /// Stops the activity early. Returns `false` if the activity has no way
    /// to stop, in which case it is dropped without further calls.
    fn abort(&mut self, _ctx: &mut ActivityContext<'_>) -> bool {
        false
    }

    /// The signal fired when the activity completes.
    fn completion(&mut self) -> Option<&mut CompletionSignal> {
        None
    }

    /// Read once at completion; `true` keeps the turn with the current
    /// participant.
    fn skip_turn_advance(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_maps_to_an_instruction() {
        let kinds = [
            (ActivityKind::Tutorial, InstructionKind::Tutorial),
            (ActivityKind::TapTargets, InstructionKind::Tap),
            (ActivityKind::ColorMatch, InstructionKind::Tap),
            (ActivityKind::SequenceRepeat, InstructionKind::Repeat),
            (ActivityKind::PatternMemory, InstructionKind::Repeat),
            (ActivityKind::PhysicsPuzzle, InstructionKind::Solve),
            (ActivityKind::SlidingPuzzle, InstructionKind::Solve),
            (ActivityKind::QuickDraw, InstructionKind::React),
            (ActivityKind::BalanceBeam, InstructionKind::Steady),
        ];
        for (kind, instruction) in kinds {
            assert_eq!(kind.instruction_kind(), instruction, "{kind:?}");
        }
    }

    #[test]
    fn test_only_tutorial_is_introductory() {
        assert!(ActivityKind::Tutorial.is_introductory());
        assert!(!ActivityKind::QuickDraw.is_introductory());
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ActivityKind::PatternMemory).unwrap();
        assert_eq!(json, r#""pattern_memory""#);
    }

    // --- held freezes ---

    fn seated() -> (ParticipantRoster, CountdownScheduler) {
        let mut roster = ParticipantRoster::new();
        roster.initialize(3, &mut partyturn_test_support::MockRng);
        let countdown = CountdownScheduler::new(partyturn_countdown::CountdownConfig::default());
        (roster, countdown)
    }

    #[test]
    fn test_held_freezes_net_pushes_against_pops() {
        let (mut roster, mut countdown) = seated();
        let mut turn = TurnContext::new(&mut roster, &mut countdown);
        let mut held = HeldFreezes::new(turn.countdown);

        let mut ctx = turn.activity_context();
        ctx.push_freeze("settling");
        ctx.push_freeze("cutscene");
        held.record(&ctx);
        let mut ctx = turn.activity_context();
        ctx.pop_freeze();
        held.record(&ctx);

        assert_eq!(held.release(turn.countdown), 1);
        assert_eq!(turn.countdown.freeze_depth(), 0);
        assert_eq!(held.release(turn.countdown), 0);
    }

    #[test]
    fn test_held_freezes_forgotten_after_clear() {
        let (mut roster, mut countdown) = seated();
        let mut turn = TurnContext::new(&mut roster, &mut countdown);
        let mut held = HeldFreezes::new(turn.countdown);

        let mut ctx = turn.activity_context();
        ctx.push_freeze("settling");
        held.record(&ctx);
        turn.countdown.clear_freeze();
        turn.countdown.push_freeze("pause menu");

        assert_eq!(held.release(turn.countdown), 0);
        assert_eq!(turn.countdown.freeze_depth(), 1);
    }
}
