//! Match configuration, loadable from YAML or JSON.

use std::path::Path;

use partyturn_core::error::TurnError;
use partyturn_countdown::CountdownConfig;
use partyturn_orchestrator::{InterstitialConfig, SelectionConfig};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Everything needed to run one match. Missing fields take their defaults,
/// so an empty document is a valid four-participant match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Participants seated at the start of the round.
    pub participants: usize,
    /// Elimination countdown tuning.
    pub countdown: CountdownConfig,
    /// "Next turn" countdown tuning.
    pub interstitial: InterstitialConfig,
    /// Activity selection policy.
    pub selection: SelectionConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            participants: 4,
            countdown: CountdownConfig::default(),
            interstitial: InterstitialConfig::default(),
            selection: SelectionConfig::default(),
        }
    }
}

impl MatchConfig {
    /// Parses and validates a YAML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Yaml` if the document does not parse, or
    /// `ConfigError::Invalid` if a value is out of range.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Json` if the document does not parse, or
    /// `ConfigError::Invalid` if a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a config file, choosing the format from its extension
    /// (`.yaml`, `.yml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read,
    /// `ConfigError::UnsupportedFormat` for any other extension, or the
    /// parse and validation errors of the matching `from_*_str`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&std::fs::read_to_string(path)?),
            Some("json") => Self::from_json_str(&std::fs::read_to_string(path)?),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Checks that the match can run.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<(), TurnError> {
        if self.participants < 2 {
            return Err(TurnError::InvalidConfig(format!(
                "participants must be at least 2, got {}",
                self.participants
            )));
        }
        self.countdown.validate()?;

        let interstitial = [
            ("interstitial.duration_secs", self.interstitial.duration_secs),
            (
                "interstitial.two_remaining_secs",
                self.interstitial.two_remaining_secs,
            ),
        ];
        for (name, value) in interstitial {
            if !value.is_finite() || value <= 0.0 {
                return Err(TurnError::InvalidConfig(format!("{name} must be > 0")));
            }
        }

        let wait = self.selection.instruction_wait_secs;
        if !wait.is_finite() || wait < 0.0 {
            return Err(TurnError::InvalidConfig(
                "selection.instruction_wait_secs must be >= 0".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partyturn_orchestrator::SelectionMode;

    // --- parsing ---

    #[test]
    fn test_empty_yaml_yields_defaults() {
        let config = MatchConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, MatchConfig::default());
        assert_eq!(config.participants, 4);
    }

    #[test]
    fn test_yaml_overrides_nested_fields() {
        let yaml = "
participants: 3
countdown:
  base_duration_secs: 20
  elimination_hold_secs: 1.5
interstitial:
  hold_freeze: false
selection:
  mode: deterministic
";
        let config = MatchConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.participants, 3);
        assert!((config.countdown.base_duration_secs - 20.0).abs() < f64::EPSILON);
        assert!((config.countdown.elimination_hold_secs - 1.5).abs() < f64::EPSILON);
        // untouched fields keep their defaults
        assert!((config.countdown.elimination_bonus_secs - 10.0).abs() < f64::EPSILON);
        assert!(!config.interstitial.hold_freeze);
        assert_eq!(config.selection.mode, SelectionMode::Deterministic);
        assert_eq!(config.selection.max_resample_attempts, 5);
    }

    #[test]
    fn test_json_round_trips_through_serde() {
        let original = MatchConfig {
            participants: 6,
            ..MatchConfig::default()
        };
        let json = serde_json::to_string(&original).unwrap();

        let parsed = MatchConfig::from_json_str(&json).unwrap();

        assert_eq!(parsed, original);
    }

    #[test]
    fn test_malformed_yaml_is_a_yaml_error() {
        let result = MatchConfig::from_yaml_str("participants: [not, a, number]");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_malformed_json_is_a_json_error() {
        let result = MatchConfig::from_json_str("{\"participants\": ");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    // --- validation ---

    #[test]
    fn test_single_participant_is_rejected() {
        let result = MatchConfig::from_yaml_str("participants: 1");
        assert!(matches!(
            result,
            Err(ConfigError::Invalid(TurnError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_countdown_errors_surface_through_match_validation() {
        let config = MatchConfig {
            countdown: CountdownConfig {
                bonus_window_fraction: 1.5,
                ..CountdownConfig::default()
            },
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interstitial_is_rejected() {
        let config = MatchConfig {
            interstitial: InterstitialConfig {
                two_remaining_secs: 0.0,
                ..InterstitialConfig::default()
            },
            ..MatchConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("two_remaining_secs"));
    }

    #[test]
    fn test_negative_instruction_wait_is_rejected() {
        let config = MatchConfig {
            selection: SelectionConfig {
                instruction_wait_secs: -1.0,
                ..SelectionConfig::default()
            },
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    // --- files ---

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("partyturn-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_from_path_dispatches_on_extension() {
        let path = scratch_path("match.yml");
        std::fs::write(&path, "participants: 5\n").unwrap();

        let config = MatchConfig::from_path(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.participants, 5);
    }

    #[test]
    fn test_from_path_rejects_unknown_extension() {
        let result = MatchConfig::from_path("match.toml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_from_path_missing_file_is_io_error() {
        let result = MatchConfig::from_path(scratch_path("missing.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
