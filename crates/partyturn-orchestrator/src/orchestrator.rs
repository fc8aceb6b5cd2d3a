//! Per-turn activity dispatch.

use std::fmt;

use partyturn_core::clock::Frame;
use partyturn_core::collaborators::{InstructionDisplay, InstructionKind, InterstitialDisplay, Silent};
use partyturn_core::error::TurnError;
use partyturn_core::event::{Listeners, Subscription};
use partyturn_core::participant::ParticipantId;
use partyturn_core::rng::DeterministicRng;
use partyturn_core::wait::{BoundedWait, WaitStatus};
use partyturn_countdown::CountdownScheduler;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::activity::{Activity, ActivityKind, HeldFreezes, TurnContext};
use crate::completion::CompletionSubscription;
use crate::interstitial::{Interstitial, InterstitialConfig, InterstitialStatus};
use crate::pool::{ActivityPool, SelectionConfig, Selector};

/// Observable orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestratorState {
    /// Nothing dispatched yet, or stopped.
    Idle,
    /// An activity is current.
    Playing,
    /// Between activities.
    Interstitial,
    /// The pool was empty; nothing more will run.
    Finished,
}

/// Lifecycle notifications for the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrchestratorEvent {
    /// An activity was started.
    Dispatched {
        /// Which activity.
        kind: ActivityKind,
        /// Who plays it, if known at dispatch time.
        participant: Option<ParticipantId>,
    },
    /// An activity completed on its own.
    Completed {
        /// Which activity.
        kind: ActivityKind,
        /// Whether the roster advanced because of it.
        advanced: bool,
    },
    /// An activity was stopped by an elimination or by `stop`.
    Aborted {
        /// Which activity.
        kind: ActivityKind,
    },
    /// The "next turn" countdown started.
    InterstitialStarted {
        /// Who plays next.
        next: Option<ParticipantId>,
        /// How long the countdown lasts.
        duration_secs: f64,
    },
    /// No activities are configured.
    AllFinished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AfterInterstitial {
    RunNext,
    RestartCountdown,
}

struct CurrentActivity {
    kind: ActivityKind,
    activity: Box<dyn Activity>,
    subscription: Option<CompletionSubscription>,
    freezes: HeldFreezes,
}

impl CurrentActivity {
    /// Pops freezes the activity took and never released.
    fn release_freezes(&mut self, countdown: &mut CountdownScheduler) {
        let released = self.freezes.release(countdown);
        if released > 0 {
            warn!(kind = ?self.kind, released, "activity left freezes held; released");
        }
    }

    fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            if let Some(signal) = self.activity.completion() {
                signal.detach(subscription);
            }
        }
    }

    fn take_completion(&mut self) -> bool {
        match (self.activity.completion(), &self.subscription) {
            (Some(signal), Some(subscription)) => signal.take_completion(subscription),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingInstructions {
    instruction: InstructionKind,
    wait: BoundedWait,
}

/// Runs one activity per turn and the interstitial between turns.
pub struct ActivityOrchestrator {
    pool: ActivityPool,
    selection: SelectionConfig,
    interstitial_config: InterstitialConfig,
    selector: Selector,
    rng: Box<dyn DeterministicRng>,
    current: Option<CurrentActivity>,
    pending_instructions: Option<PendingInstructions>,
    interstitial: Interstitial,
    after_interstitial: AfterInterstitial,
    all_finished: bool,
    dispatches: u64,
    instructions: Box<dyn InstructionDisplay>,
    interstitial_display: Box<dyn InterstitialDisplay>,
    listeners: Listeners<OrchestratorEvent>,
}

impl ActivityOrchestrator {
    /// Creates an orchestrator over `pool` with silent displays.
    #[must_use]
    pub fn new(
        pool: ActivityPool,
        selection: SelectionConfig,
        interstitial_config: InterstitialConfig,
        rng: impl DeterministicRng + 'static,
    ) -> Self {
        Self {
            pool,
            selection,
            interstitial_config,
            selector: Selector::default(),
            rng: Box::new(rng),
            current: None,
            pending_instructions: None,
            interstitial: Interstitial::new(),
            after_interstitial: AfterInterstitial::RunNext,
            all_finished: false,
            dispatches: 0,
            instructions: Box::new(Silent),
            interstitial_display: Box::new(Silent),
            listeners: Listeners::new(),
        }
    }

    /// Replaces the instruction display.
    #[must_use]
    pub fn with_instruction_display(mut self, display: impl InstructionDisplay + 'static) -> Self {
        self.instructions = Box::new(display);
        self
    }

    /// Replaces the interstitial display.
    #[must_use]
    pub fn with_interstitial_display(mut self, display: impl InterstitialDisplay + 'static) -> Self {
        self.interstitial_display = Box::new(display);
        self
    }

    /// Registers a lifecycle listener.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&OrchestratorEvent) + Send + 'static,
    ) -> Subscription {
        self.listeners.subscribe(listener)
    }

    /// Removes a listener registered with [`subscribe`](Self::subscribe).
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.listeners.unsubscribe(subscription)
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> OrchestratorState {
        if self.all_finished {
            OrchestratorState::Finished
        } else if self.current.is_some() {
            OrchestratorState::Playing
        } else if self.interstitial.is_active() {
            OrchestratorState::Interstitial
        } else {
            OrchestratorState::Idle
        }
    }

    /// Kind of the current activity.
    #[must_use]
    pub fn current_kind(&self) -> Option<ActivityKind> {
        self.current.as_ref().map(|current| current.kind)
    }

    /// Number of dispatches this session.
    #[must_use]
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    /// Picks the next activity from the pool and dispatches it.
    ///
    /// The first pick of a session is the introductory activity if the pool
    /// has one. With an empty pool the orchestrator reports all-finished and
    /// stays idle.
    pub fn run_next(&mut self, ctx: &mut TurnContext<'_>) {
        let picked = self
            .selector
            .select(&self.pool, &self.selection, self.rng.as_mut());
        let Some(activity) = picked.and_then(|index| self.pool.create(index)) else {
            warn!(error = %TurnError::NoActivities, "orchestrator stopping");
            self.all_finished = true;
            self.listeners.emit(&OrchestratorEvent::AllFinished);
            return;
        };
        self.dispatch(activity, ctx);
    }

    /// Makes `activity` current and starts it.
    ///
    /// Any previous activity is aborted and detached first. An activity with
    /// no completion signal is finished immediately after starting.
    pub fn dispatch(&mut self, mut activity: Box<dyn Activity>, ctx: &mut TurnContext<'_>) {
        if self.current.is_some() {
            warn!("dispatch while an activity is current; aborting it");
            self.abort_current(ctx);
        }
        self.interstitial
            .cancel(ctx.countdown, self.interstitial_display.as_mut());

        let kind = activity.kind();
        let instruction = kind.instruction_kind();
        let participant = ctx.roster.current();
        self.dispatches += 1;
        self.all_finished = false;

        match participant {
            Some(participant) => {
                self.pending_instructions = None;
                self.instructions.show(instruction, Some(participant));
            }
            None => {
                debug!(kind = ?kind, "instructions waiting for a current participant");
                self.pending_instructions = Some(PendingInstructions {
                    instruction,
                    wait: BoundedWait::new(self.selection.instruction_wait_secs),
                });
            }
        }

        let subscription = activity.completion().map(|signal| {
            signal.arm();
            signal.subscribe()
        });
        let mut freezes = HeldFreezes::new(ctx.countdown);
        let mut activity_ctx = ctx.activity_context();
        activity.start(&mut activity_ctx);
        freezes.record(&activity_ctx);
        info!(kind = ?kind, participant = ?participant, dispatch = self.dispatches, "activity dispatched");
        self.listeners
            .emit(&OrchestratorEvent::Dispatched { kind, participant });

        let has_signal = subscription.is_some();
        self.current = Some(CurrentActivity {
            kind,
            activity,
            subscription,
            freezes,
        });
        if has_signal {
            self.poll_completion(ctx);
        } else {
            debug!(kind = ?kind, "activity has no completion signal");
            self.on_activity_finished(ctx);
        }
    }

    /// Handles completion of the current activity: hides instructions,
    /// advances the roster unless the activity kept the turn, and starts the
    /// interstitial that leads to the next dispatch.
    pub fn on_activity_finished(&mut self, ctx: &mut TurnContext<'_>) {
        let Some(mut current) = self.current.take() else {
            warn!("activity finished with nothing current");
            return;
        };
        current.detach();
        current.release_freezes(ctx.countdown);
        self.pending_instructions = None;
        self.instructions.hide();

        let advanced = !current.activity.skip_turn_advance();
        if advanced {
            ctx.roster.advance();
            self.instructions
                .update_participant_icon(ctx.roster.current());
        }
        info!(kind = ?current.kind, advanced, "activity completed");
        self.listeners.emit(&OrchestratorEvent::Completed {
            kind: current.kind,
            advanced,
        });

        self.begin_interstitial(ctx, AfterInterstitial::RunNext);
    }

    /// Handles an elimination that happened mid-activity: stops and detaches
    /// the current activity, then runs the interstitial, after which the
    /// countdown restarts for the new current participant and the next
    /// activity is dispatched.
    pub fn on_countdown_elimination(&mut self, ctx: &mut TurnContext<'_>) {
        self.abort_current(ctx);
        self.instructions
            .update_participant_icon(ctx.roster.current());
        self.begin_interstitial(ctx, AfterInterstitial::RestartCountdown);
    }

    /// Advances by one host tick.
    ///
    /// Steps the interstitial or, between interstitials, resolves pending
    /// instructions and updates the current activity. Neither the activity
    /// nor the interstitial moves during the elimination hold, so nothing can
    /// dispatch or advance the roster before the elimination lands.
    pub fn update(&mut self, frame: &Frame, ctx: &mut TurnContext<'_>) {
        let finishing = ctx.countdown.is_finishing();
        if self.interstitial.is_active() {
            if finishing {
                return;
            }
            let status =
                self.interstitial
                    .step(frame.real_secs, ctx.countdown, self.interstitial_display.as_mut());
            if status == InterstitialStatus::Done {
                self.on_interstitial_done(ctx);
            }
            return;
        }

        self.step_pending_instructions(frame, ctx);

        if finishing {
            return;
        }
        if let Some(current) = self.current.as_mut() {
            let mut activity_ctx = ctx.activity_context();
            current.activity.update(&mut activity_ctx, frame);
            current.freezes.record(&activity_ctx);
        }
        self.poll_completion(ctx);
    }

    /// Stops everything: aborts the current activity, cancels the
    /// interstitial (releasing its freeze) and hides instructions.
    pub fn stop(&mut self, ctx: &mut TurnContext<'_>) {
        self.abort_current(ctx);
        self.interstitial
            .cancel(ctx.countdown, self.interstitial_display.as_mut());
        info!("orchestrator stopped");
    }

    /// Forgets selection history so the next session starts over.
    pub fn reset_session(&mut self) {
        self.selector.reset();
        self.all_finished = false;
        self.dispatches = 0;
    }

    fn abort_current(&mut self, ctx: &mut TurnContext<'_>) {
        let Some(mut current) = self.current.take() else {
            self.pending_instructions = None;
            return;
        };
        let mut activity_ctx = ctx.activity_context();
        let aborted = current.activity.abort(&mut activity_ctx);
        current.freezes.record(&activity_ctx);
        if !aborted {
            warn!(kind = ?current.kind, "activity cannot abort; force-disabled");
        }
        current.detach();
        current.release_freezes(ctx.countdown);
        self.pending_instructions = None;
        self.instructions.hide();
        info!(kind = ?current.kind, "activity aborted");
        self.listeners
            .emit(&OrchestratorEvent::Aborted { kind: current.kind });
    }

    fn poll_completion(&mut self, ctx: &mut TurnContext<'_>) {
        let completed = self
            .current
            .as_mut()
            .is_some_and(CurrentActivity::take_completion);
        if completed {
            self.on_activity_finished(ctx);
        }
    }

    fn step_pending_instructions(&mut self, frame: &Frame, ctx: &TurnContext<'_>) {
        let Some(pending) = self.pending_instructions.as_mut() else {
            return;
        };
        match pending.wait.step(frame.real_secs, || ctx.roster.current()) {
            WaitStatus::Ready(participant) => {
                self.instructions.show(pending.instruction, Some(participant));
                self.pending_instructions = None;
            }
            WaitStatus::Pending => {}
            WaitStatus::TimedOut => {
                warn!(
                    error = %TurnError::NoCurrentParticipant,
                    "instructions shown without a participant"
                );
                self.instructions.show(pending.instruction, None);
                self.pending_instructions = None;
            }
        }
    }

    fn begin_interstitial(&mut self, ctx: &mut TurnContext<'_>, after: AfterInterstitial) {
        let duration_secs = self
            .interstitial_config
            .duration_for(ctx.roster.active_count());
        let next = ctx.roster.current();
        self.after_interstitial = after;
        self.interstitial.start(
            duration_secs,
            self.interstitial_config.hold_freeze,
            next,
            ctx.countdown,
            self.interstitial_display.as_mut(),
        );
        self.listeners.emit(&OrchestratorEvent::InterstitialStarted {
            next,
            duration_secs,
        });
    }

    fn on_interstitial_done(&mut self, ctx: &mut TurnContext<'_>) {
        if self.after_interstitial == AfterInterstitial::RestartCountdown {
            ctx.countdown.start(ctx.roster);
        }
        self.after_interstitial = AfterInterstitial::RunNext;
        self.run_next(ctx);
    }
}

impl fmt::Debug for ActivityOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityOrchestrator")
            .field("pool", &self.pool)
            .field("state", &self.state())
            .field("current", &self.current_kind())
            .field("dispatches", &self.dispatches)
            .field("interstitial", &self.interstitial)
            .finish_non_exhaustive()
    }
}
