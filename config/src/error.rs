//! Error types for configuration loading and saving.

use thiserror::Error;

/// Errors that can occur while reading or writing a [`ScrapeConfig`](crate::ScrapeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Configuration parsed but failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// No ruleset descriptor exists for the requested ruleset.
    #[error("no ruleset configured for '{0}'")]
    MissingRuleset(gearset_core::Ruleset),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
