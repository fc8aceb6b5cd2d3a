//! Partyturn headless simulator entry point.
//!
//! A tokio interval stands in for the game engine's per-frame callback; each
//! tick measures a frame, advances the match and logs its events as JSON.

use std::error::Error;

use partyturn_core::clock::{Clock, FrameClock, SystemClock};
use partyturn_match::{MatchController, MatchEvent, MatchPhase};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

mod activities;
mod presenters;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Partyturn simulator");

    // Read configuration from environment.
    let settings = settings::Settings::from_env()?;

    // Build the match.
    let mut builder = MatchController::builder(settings.config)
        .pool(activities::demo_pool(settings.seed))
        .instruction_display(presenters::LogInstructionDisplay)
        .interstitial_display(presenters::LogInterstitialDisplay)
        .timer_presenter(presenters::LogTimerPresenter::default())
        .elimination_sink(presenters::LogEliminationSink);
    if let Some(seed) = settings.seed {
        builder = builder.seed(seed);
    }
    let mut controller = builder.build()?;

    let clock = SystemClock;
    let mut frames = FrameClock::new(&clock);
    let mut interval = tokio::time::interval(settings.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    log_events(&controller.start_round());
    while controller.phase() == MatchPhase::Playing {
        tokio::select! {
            _ = interval.tick() => {
                log_events(&step(&mut controller, &mut frames, &clock, settings.time_scale));
            }
            _ = &mut shutdown => {
                tracing::info!("Interrupted");
                log_events(&controller.stop());
            }
        }
    }

    tracing::info!(
        match_id = %controller.match_id(),
        phase = ?controller.phase(),
        "Simulation finished"
    );
    Ok(())
}

/// Measures one frame and advances the match by it.
fn step(
    controller: &mut MatchController,
    frames: &mut FrameClock,
    clock: &dyn Clock,
    time_scale: f64,
) -> Vec<MatchEvent> {
    let frame = frames.next_frame(clock, time_scale);
    controller.tick(&frame)
}

fn log_events(events: &[MatchEvent]) {
    for event in events {
        match serde_json::to_string(event) {
            Ok(json) => tracing::info!(event = %json, "match event"),
            Err(e) => tracing::warn!(error = %e, "match event not serializable"),
        }
    }
}
