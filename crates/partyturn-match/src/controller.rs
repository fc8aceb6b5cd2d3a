//! The top-level owner of a match.
//!
//! [`MatchController`] replaces process-wide singletons: it owns one roster,
//! one countdown and one orchestrator and lends them to each other through a
//! [`TurnContext`] for the duration of a call. Each host tick runs the
//! countdown first, so activities always observe this tick's decrement.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use partyturn_core::clock::Frame;
use partyturn_core::collaborators::{
    EliminationSink, InstructionDisplay, InterstitialDisplay, Silent, TimerPresenter,
};
use partyturn_core::participant::ParticipantId;
use partyturn_core::rng::{DeterministicRng, SeededRng};
use partyturn_countdown::{CountdownScheduler, CountdownSignal};
use partyturn_orchestrator::{ActivityOrchestrator, ActivityPool, OrchestratorState, TurnContext};
use partyturn_roster::ParticipantRoster;
use serde::Serialize;
use tracing::{Span, info, info_span, warn};
use uuid::Uuid;

use crate::config::MatchConfig;
use crate::error::ConfigError;
use crate::event::MatchEvent;

type EventLog = Arc<Mutex<Vec<MatchEvent>>>;

fn record(log: &EventLog, event: MatchEvent) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(event);
}

/// Where the match as a whole stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MatchPhase {
    /// Built, `start_round` not called yet.
    NotStarted,
    /// Ticks are being processed.
    Playing,
    /// At most one participant remains.
    RoundOver { winner: Option<ParticipantId> },
    /// The activity pool was empty.
    Exhausted,
    /// Stopped by the host.
    Stopped,
}

/// Assembles a [`MatchController`].
pub struct MatchBuilder {
    config: MatchConfig,
    pool: ActivityPool,
    instructions: Box<dyn InstructionDisplay>,
    interstitial: Box<dyn InterstitialDisplay>,
    presenter: Box<dyn TimerPresenter>,
    sink: Box<dyn EliminationSink>,
    seed: Option<u64>,
    roster_rng: Option<Box<dyn DeterministicRng>>,
    activity_rng: Option<Box<dyn DeterministicRng>>,
}

impl MatchBuilder {
    fn new(config: MatchConfig) -> Self {
        Self {
            config,
            pool: ActivityPool::new(),
            instructions: Box::new(Silent),
            interstitial: Box::new(Silent),
            presenter: Box::new(Silent),
            sink: Box::new(Silent),
            seed: None,
            roster_rng: None,
            activity_rng: None,
        }
    }

    /// The activities to pick from.
    #[must_use]
    pub fn pool(mut self, pool: ActivityPool) -> Self {
        self.pool = pool;
        self
    }

    #[must_use]
    pub fn instruction_display(mut self, display: impl InstructionDisplay + 'static) -> Self {
        self.instructions = Box::new(display);
        self
    }

    #[must_use]
    pub fn interstitial_display(mut self, display: impl InterstitialDisplay + 'static) -> Self {
        self.interstitial = Box::new(display);
        self
    }

    #[must_use]
    pub fn timer_presenter(mut self, presenter: impl TimerPresenter + 'static) -> Self {
        self.presenter = Box::new(presenter);
        self
    }

    #[must_use]
    pub fn elimination_sink(mut self, sink: impl EliminationSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Seeds both random streams, making seating and selection reproducible.
    /// Without a seed they are seeded from the OS.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Supplies the random source for the starting seat.
    #[must_use]
    pub fn roster_rng(mut self, rng: impl DeterministicRng + 'static) -> Self {
        self.roster_rng = Some(Box::new(rng));
        self
    }

    /// Supplies the random source for activity selection.
    #[must_use]
    pub fn activity_rng(mut self, rng: impl DeterministicRng + 'static) -> Self {
        self.activity_rng = Some(Box::new(rng));
        self
    }

    /// Validates the config and wires the subsystems together.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the config fails validation.
    pub fn build(self) -> Result<MatchController, ConfigError> {
        self.config.validate()?;
        let seed = self.seed;
        let roster_rng = self.roster_rng.unwrap_or_else(|| seeded(seed, 0));
        let activity_rng = self.activity_rng.unwrap_or_else(|| seeded(seed, 1));

        let events = EventLog::default();

        let mut roster = ParticipantRoster::new();
        let log = Arc::clone(&events);
        // Listeners live as long as the roster and orchestrator they sit on.
        let _turns = roster.subscribe_turns(move |event| {
            record(
                &log,
                MatchEvent::TurnAdvanced {
                    participant: event.participant,
                },
            );
        });

        let countdown = CountdownScheduler::new(self.config.countdown)
            .with_presenter(self.presenter)
            .with_elimination_sink(self.sink);

        let mut orchestrator = ActivityOrchestrator::new(
            self.pool,
            self.config.selection,
            self.config.interstitial,
            activity_rng,
        )
        .with_instruction_display(self.instructions)
        .with_interstitial_display(self.interstitial);
        let log = Arc::clone(&events);
        let _lifecycle =
            orchestrator.subscribe(move |event| record(&log, MatchEvent::from(*event)));

        Ok(MatchController {
            config: self.config,
            match_id: Uuid::nil(),
            span: Span::none(),
            phase: MatchPhase::NotStarted,
            roster,
            countdown,
            orchestrator,
            roster_rng,
            events,
        })
    }
}

fn seeded(seed: Option<u64>, stream: u64) -> Box<dyn DeterministicRng> {
    match seed {
        Some(seed) => Box::new(SeededRng::from_seed(seed.wrapping_add(stream))),
        None => Box::new(SeededRng::from_os()),
    }
}

/// Owns and drives one match.
pub struct MatchController {
    config: MatchConfig,
    match_id: Uuid,
    span: Span,
    phase: MatchPhase,
    roster: ParticipantRoster,
    countdown: CountdownScheduler,
    orchestrator: ActivityOrchestrator,
    roster_rng: Box<dyn DeterministicRng>,
    events: EventLog,
}

impl MatchController {
    /// Starts assembling a controller for `config`.
    #[must_use]
    pub fn builder(config: MatchConfig) -> MatchBuilder {
        MatchBuilder::new(config)
    }

    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Identifier of the current round; nil before the first round.
    #[must_use]
    pub fn match_id(&self) -> Uuid {
        self.match_id
    }

    #[must_use]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    #[must_use]
    pub fn roster(&self) -> &ParticipantRoster {
        &self.roster
    }

    #[must_use]
    pub fn countdown(&self) -> &CountdownScheduler {
        &self.countdown
    }

    #[must_use]
    pub fn orchestrator(&self) -> &ActivityOrchestrator {
        &self.orchestrator
    }

    /// Holds a freeze on the countdown on behalf of the host (a pause menu,
    /// say). Returns the new depth.
    pub fn push_freeze(&mut self, reason: &str) -> usize {
        self.countdown.push_freeze(reason)
    }

    /// Releases one freeze held through [`push_freeze`](Self::push_freeze).
    pub fn pop_freeze(&mut self) -> usize {
        self.countdown.pop_freeze()
    }

    /// Seats the participants and dispatches the first activity.
    ///
    /// Calling it again starts a fresh round with a new `match_id`: every
    /// countdown, freeze and selection history is discarded.
    pub fn start_round(&mut self) -> Vec<MatchEvent> {
        if self.phase == MatchPhase::Playing {
            let mut ctx = TurnContext::new(&mut self.roster, &mut self.countdown);
            self.orchestrator.stop(&mut ctx);
        }
        self.drain_events();

        self.match_id = Uuid::new_v4();
        self.span = info_span!("match", match_id = %self.match_id);
        let span = self.span.clone();
        let _guard = span.enter();

        self.countdown.reset();
        self.orchestrator.reset_session();
        self.roster
            .initialize(self.config.participants, self.roster_rng.as_mut());
        let first = self.roster.current();
        info!(participants = self.config.participants, first = ?first, "round started");
        record(
            &self.events,
            MatchEvent::RoundStarted {
                participants: self.config.participants,
                first,
            },
        );
        self.phase = MatchPhase::Playing;

        self.countdown.start(&self.roster);
        let mut ctx = TurnContext::new(&mut self.roster, &mut self.countdown);
        self.orchestrator.run_next(&mut ctx);
        self.check_exhausted();
        self.drain_events()
    }

    /// Advances the match by one host tick and returns what happened.
    ///
    /// The countdown ticks first. An elimination either ends the round or
    /// hands over to the orchestrator's elimination path; otherwise the
    /// orchestrator steps the interstitial or the current activity.
    pub fn tick(&mut self, frame: &Frame) -> Vec<MatchEvent> {
        if self.phase != MatchPhase::Playing {
            return Vec::new();
        }
        let span = self.span.clone();
        let _guard = span.enter();

        match self.countdown.tick(frame, &mut self.roster) {
            Some(CountdownSignal::Eliminated(participant)) => self.on_eliminated(participant),
            None => {
                let mut ctx = TurnContext::new(&mut self.roster, &mut self.countdown);
                self.orchestrator.update(frame, &mut ctx);
            }
        }
        self.check_exhausted();
        self.drain_events()
    }

    /// Stops the countdown and the orchestrator. Idempotent.
    pub fn stop(&mut self) -> Vec<MatchEvent> {
        if self.phase == MatchPhase::Playing {
            let span = self.span.clone();
            let _guard = span.enter();
            self.halt();
            self.phase = MatchPhase::Stopped;
            info!("match stopped");
        }
        self.drain_events()
    }

    fn on_eliminated(&mut self, participant: ParticipantId) {
        let survivors = self.roster.active_count();
        record(
            &self.events,
            MatchEvent::Eliminated {
                participant,
                survivors,
            },
        );
        if self.roster.is_round_over() {
            let winner = self.roster.winner();
            self.halt();
            self.phase = MatchPhase::RoundOver { winner };
            info!(winner = ?winner, "round over");
            record(&self.events, MatchEvent::RoundOver { winner });
        } else {
            let mut ctx = TurnContext::new(&mut self.roster, &mut self.countdown);
            self.orchestrator.on_countdown_elimination(&mut ctx);
        }
    }

    fn halt(&mut self) {
        let mut ctx = TurnContext::new(&mut self.roster, &mut self.countdown);
        self.orchestrator.stop(&mut ctx);
        self.countdown.stop();
    }

    fn check_exhausted(&mut self) {
        if self.phase == MatchPhase::Playing
            && self.orchestrator.state() == OrchestratorState::Finished
        {
            warn!("no activities left; match stopped");
            self.countdown.stop();
            self.phase = MatchPhase::Exhausted;
        }
    }

    fn drain_events(&self) -> Vec<MatchEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl fmt::Debug for MatchController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchController")
            .field("match_id", &self.match_id)
            .field("phase", &self.phase)
            .field("roster", &self.roster)
            .field("countdown", &self.countdown)
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partyturn_core::error::TurnError;
    use partyturn_countdown::SchedulerPhase;
    use partyturn_orchestrator::{Activity, ActivityContext, ActivityKind, CompletionSignal};
    use partyturn_test_support::{MockRng, RecordingEliminationSink, SequenceRng};

    /// Starts and never finishes.
    struct Endless {
        signal: CompletionSignal,
    }

    impl Endless {
        fn new() -> Self {
            Self {
                signal: CompletionSignal::new(),
            }
        }
    }

    impl Activity for Endless {
        fn kind(&self) -> ActivityKind {
            ActivityKind::BalanceBeam
        }

        fn start(&mut self, _ctx: &mut ActivityContext<'_>) {}

        fn completion(&mut self) -> Option<&mut CompletionSignal> {
            Some(&mut self.signal)
        }
    }

    /// Exposes no completion signal, so it finishes inside dispatch.
    struct Immediate;

    impl Activity for Immediate {
        fn kind(&self) -> ActivityKind {
            ActivityKind::TapTargets
        }

        fn start(&mut self, _ctx: &mut ActivityContext<'_>) {}
    }

    fn quick_config(participants: usize) -> MatchConfig {
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

    // --- building ---

    #[test]
    fn test_build_rejects_invalid_config() {
        let result = MatchController::builder(quick_config(1)).build();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid(TurnError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_tick_before_start_does_nothing() {
        let mut controller = MatchController::builder(quick_config(3))
            .pool(ActivityPool::new().with(ActivityKind::BalanceBeam, Endless::new))
            .build()
            .unwrap();

        assert!(controller.tick(&Frame::uniform(1.0)).is_empty());
        assert_eq!(controller.phase(), MatchPhase::NotStarted);
        assert!(controller.match_id().is_nil());
    }

    // --- rounds ---

    #[test]
    fn test_start_round_seats_and_dispatches() {
        let mut controller = MatchController::builder(quick_config(3))
            .pool(ActivityPool::new().with(ActivityKind::BalanceBeam, Endless::new))
            .roster_rng(SequenceRng::new(vec![1]))
            .activity_rng(MockRng)
            .build()
            .unwrap();

        let events = controller.start_round();

        assert_eq!(
            events,
            vec![
                MatchEvent::RoundStarted {
                    participants: 3,
                    first: Some(ParticipantId(1)),
                },
                MatchEvent::ActivityDispatched {
                    kind: ActivityKind::BalanceBeam,
                    participant: Some(ParticipantId(1)),
                },
            ]
        );
        assert_eq!(controller.phase(), MatchPhase::Playing);
        assert_eq!(controller.countdown().phase(), SchedulerPhase::Running);
        assert!(!controller.match_id().is_nil());
    }

    #[test]
    fn test_empty_pool_exhausts_the_match() {
        let mut controller = MatchController::builder(quick_config(3)).seed(7).build().unwrap();

        let events = controller.start_round();

        assert!(events.contains(&MatchEvent::AllActivitiesFinished));
        assert_eq!(controller.phase(), MatchPhase::Exhausted);
        assert_eq!(controller.countdown().phase(), SchedulerPhase::Idle);
        assert!(controller.tick(&Frame::uniform(1.0)).is_empty());
    }

    #[test]
    fn test_signal_free_activity_advances_inside_start() {
        let mut controller = MatchController::builder(quick_config(3))
            .pool(ActivityPool::new().with(ActivityKind::TapTargets, || Immediate))
            .roster_rng(SequenceRng::new(vec![0]))
            .activity_rng(MockRng)
            .build()
            .unwrap();

        let events = controller.start_round();

        let advanced: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, MatchEvent::TurnAdvanced { .. }))
            .collect();
        assert_eq!(
            advanced,
            vec![&MatchEvent::TurnAdvanced {
                participant: ParticipantId(1)
            }]
        );
        assert_eq!(controller.roster().current(), Some(ParticipantId(1)));
        assert_eq!(
            controller.orchestrator().state(),
            OrchestratorState::Interstitial
        );
    }

    #[test]
    fn test_last_elimination_ends_the_round() {
        let sink = RecordingEliminationSink::default();
        let mut controller = MatchController::builder(quick_config(2))
            .pool(ActivityPool::new().with(ActivityKind::BalanceBeam, Endless::new))
            .roster_rng(SequenceRng::new(vec![0]))
            .activity_rng(MockRng)
            .elimination_sink(sink.clone())
            .build()
            .unwrap();
        controller.start_round();

        let mut events = Vec::new();
        for _ in 0..20 {
            events.extend(controller.tick(&Frame::uniform(0.25)));
        }

        assert_eq!(sink.eliminated(), vec![ParticipantId(0)]);
        assert!(events.contains(&MatchEvent::Eliminated {
            participant: ParticipantId(0),
            survivors: 1,
        }));
        assert_eq!(
            events.last(),
            Some(&MatchEvent::RoundOver {
                winner: Some(ParticipantId(1))
            })
        );
        assert_eq!(
            controller.phase(),
            MatchPhase::RoundOver {
                winner: Some(ParticipantId(1))
            }
        );
        assert_eq!(controller.countdown().phase(), SchedulerPhase::Idle);
        assert_eq!(controller.orchestrator().current_kind(), None);
    }

    #[test]
    fn test_host_freeze_stops_the_countdown() {
        let mut controller = MatchController::builder(quick_config(3))
            .pool(ActivityPool::new().with(ActivityKind::BalanceBeam, Endless::new))
            .roster_rng(SequenceRng::new(vec![0]))
            .activity_rng(MockRng)
            .build()
            .unwrap();
        controller.start_round();
        controller.tick(&Frame::uniform(0.25));
        let before = controller.countdown().remaining(ParticipantId(0));

        assert_eq!(controller.push_freeze("pause menu"), 1);
        for _ in 0..10 {
            controller.tick(&Frame::uniform(0.25));
        }
        assert_eq!(controller.countdown().remaining(ParticipantId(0)), before);

        assert_eq!(controller.pop_freeze(), 0);
        controller.tick(&Frame::uniform(0.25));
        assert!(controller.countdown().remaining(ParticipantId(0)) < before);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut controller = MatchController::builder(quick_config(3))
            .pool(ActivityPool::new().with(ActivityKind::BalanceBeam, Endless::new))
            .seed(3)
            .build()
            .unwrap();
        controller.start_round();

        let events = controller.stop();
        assert_eq!(
            events,
            vec![MatchEvent::ActivityAborted {
                kind: ActivityKind::BalanceBeam
            }]
        );
        assert_eq!(controller.phase(), MatchPhase::Stopped);
        assert!(controller.stop().is_empty());
    }

    #[test]
    fn test_restarting_a_round_issues_a_new_match_id() {
        let mut controller = MatchController::builder(quick_config(3))
            .pool(ActivityPool::new().with(ActivityKind::BalanceBeam, Endless::new))
            .seed(11)
            .build()
            .unwrap();
        controller.start_round();
        let first = controller.match_id();

        let events = controller.start_round();

        assert_ne!(controller.match_id(), first);
        assert!(matches!(events.first(), Some(MatchEvent::RoundStarted { .. })));
        assert_eq!(controller.roster().active_count(), 3);
        assert_eq!(controller.countdown().freeze_depth(), 0);
    }
}
