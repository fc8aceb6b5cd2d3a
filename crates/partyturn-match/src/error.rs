//! Match-level error types.

use partyturn_core::error::TurnError;

/// Errors raised while loading a [`MatchConfig`](crate::MatchConfig) or
/// building a controller from one.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML document did not parse.
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The JSON document did not parse.
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension names no supported format.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The document parsed but a value is out of range.
    #[error(transparent)]
    Invalid(#[from] TurnError),
}
