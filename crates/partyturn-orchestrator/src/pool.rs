//! The configured activity pool and the per-turn selection policy.

use std::fmt;

use partyturn_core::rng::DeterministicRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::activity::{Activity, ActivityKind};

/// How the next activity is picked once any introductory activity has run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Uniform sampling, avoiding an immediate repeat where possible.
    #[default]
    Random,
    /// Round-robin through the pool in registration order.
    Deterministic,
}

/// Selection tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Random or round-robin.
    pub mode: SelectionMode,
    /// Extra samples drawn to avoid repeating the previous activity.
    pub max_resample_attempts: u32,
    /// Force an introductory activity on the first selection.
    pub introductory_first: bool,
    /// How long instructions wait for a current participant, in seconds.
    pub instruction_wait_secs: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::Random,
            max_resample_attempts: 5,
            introductory_first: true,
            instruction_wait_secs: 2.0,
        }
    }
}

type Factory = Box<dyn Fn() -> Box<dyn Activity> + Send>;

struct PoolEntry {
    kind: ActivityKind,
    factory: Factory,
}

/// The activities available this session, in registration order.
#[derive(Default)]
pub struct ActivityPool {
    entries: Vec<PoolEntry>,
}

impl ActivityPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an activity factory under `kind`. The factory is only
    /// called on dispatch.
    pub fn register<A, F>(&mut self, kind: ActivityKind, factory: F) -> &mut Self
    where
        A: Activity + 'static,
        F: Fn() -> A + Send + 'static,
    {
        self.entries.push(PoolEntry {
            kind,
            factory: Box::new(move || Box::new(factory()) as Box<dyn Activity>),
        });
        self
    }

    /// Builder form of [`register`](Self::register).
    #[must_use]
    pub fn with<A, F>(mut self, kind: ActivityKind, factory: F) -> Self
    where
        A: Activity + 'static,
        F: Fn() -> A + Send + 'static,
    {
        self.register(kind, factory);
        self
    }

    /// Number of registered activities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered kinds in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<ActivityKind> {
        self.entries.iter().map(|entry| entry.kind).collect()
    }

    /// Instantiates the activity at `index`.
    #[must_use]
    pub fn create(&self, index: usize) -> Option<Box<dyn Activity>> {
        let entry = self.entries.get(index)?;
        let activity = (entry.factory)();
        if activity.kind() != entry.kind {
            warn!(
                registered = ?entry.kind,
                actual = ?activity.kind(),
                "activity kind differs from registration"
            );
        }
        Some(activity)
    }

    fn introductory_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.kind.is_introductory())
    }
}

impl fmt::Debug for ActivityPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityPool")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Remembers what was picked so far this session.
#[derive(Debug, Default, Clone)]
pub(crate) struct Selector {
    first_done: bool,
    last: Option<usize>,
    cursor: Option<usize>,
}

impl Selector {
    /// Picks the next pool index, or `None` for an empty pool.
    pub(crate) fn select(
        &mut self,
        pool: &ActivityPool,
        config: &SelectionConfig,
        rng: &mut dyn DeterministicRng,
    ) -> Option<usize> {
        let len = pool.len();
        if len == 0 {
            return None;
        }

        let introductory = if !self.first_done && config.introductory_first {
            pool.introductory_index()
        } else {
            None
        };
        let choice = match (introductory, config.mode) {
            (Some(index), _) => {
                debug!(index, "introductory activity forced");
                index
            }
            (None, SelectionMode::Deterministic) => self.next_in_order(len),
            (None, SelectionMode::Random) => self.sample(len, config.max_resample_attempts, rng),
        };

        self.first_done = true;
        self.last = Some(choice);
        Some(choice)
    }

    /// Forgets the session history.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    fn next_in_order(&mut self, len: usize) -> usize {
        let mut next = self.cursor.map_or(0, |cursor| (cursor + 1) % len);
        if len > 1 && Some(next) == self.last {
            next = (next + 1) % len;
        }
        self.cursor = Some(next);
        next
    }

    fn sample(&self, len: usize, max_attempts: u32, rng: &mut dyn DeterministicRng) -> usize {
        let mut pick = rng.next_index(len);
        let mut attempts = 0;
        while len > 1 && Some(pick) == self.last && attempts < max_attempts {
            pick = rng.next_index(len);
            attempts += 1;
        }
        if len > 1 && Some(pick) == self.last {
            debug!(pick, "resampling exhausted; taking the next entry");
            pick = (pick + 1) % len;
        }
        pick
    }
}
