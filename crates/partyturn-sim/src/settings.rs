//! Simulator settings read from the environment.

use std::error::Error;
use std::time::Duration;

use partyturn_match::MatchConfig;

/// Everything the simulator needs before the loop starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub config: MatchConfig,
    pub seed: Option<u64>,
    pub tick: Duration,
    pub time_scale: f64,
}

impl Settings {
    /// Reads `PARTYTURN_CONFIG`, `PARTYTURN_PARTICIPANTS`, `PARTYTURN_SEED`,
    /// `PARTYTURN_TICK_MS` and `PARTYTURN_TIME_SCALE`.
    pub fn from_env() -> Result<Self, Box<dyn Error>> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from any key lookup; unset keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Box<dyn Error>> {
        let mut config = match lookup("PARTYTURN_CONFIG") {
            Some(path) => MatchConfig::from_path(&path)?,
            None => MatchConfig::default(),
        };

        if let Some(participants) = lookup("PARTYTURN_PARTICIPANTS") {
            config.participants = participants
                .parse()
                .map_err(|e| format!("PARTYTURN_PARTICIPANTS must be a valid count: {e}"))?;
        }
        config.validate()?;

        let seed = lookup("PARTYTURN_SEED")
            .map(|seed| {
                seed.parse::<u64>()
                    .map_err(|e| format!("PARTYTURN_SEED must be a valid u64: {e}"))
            })
            .transpose()?;

        let tick_ms: u64 = lookup("PARTYTURN_TICK_MS")
            .unwrap_or_else(|| "50".to_string())
            .parse()
            .map_err(|e| format!("PARTYTURN_TICK_MS must be a valid u64: {e}"))?;
        if tick_ms == 0 {
            return Err("PARTYTURN_TICK_MS must be at least 1".into());
        }

        let time_scale: f64 = lookup("PARTYTURN_TIME_SCALE")
            .unwrap_or_else(|| "1.0".to_string())
            .parse()
            .map_err(|e| format!("PARTYTURN_TIME_SCALE must be a number: {e}"))?;
        if !time_scale.is_finite() || time_scale < 0.0 {
            return Err("PARTYTURN_TIME_SCALE must be >= 0".into());
        }

        Ok(Self {
            config,
            seed,
            tick: Duration::from_millis(tick_ms),
            time_scale,
        })
    }
}
