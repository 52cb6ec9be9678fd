//! Run configuration for gear-set table generation.
//!
//! Defines the YAML-serializable configuration that controls which rulesets
//! are generated, where documents are written, and how pages are requested.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! http:
//!   user_agent: "Mozilla/5.0"
//!   timeout_secs: 30
//! jobs: 1
//! output_dir: "."
//! rulesets:
//!   - ruleset: legacy
//!     base_host: "http://classic.wowhead.com"
//!     output_file: "LibPeriodicTable-3.1-GearSet-classic.lua"
//!     classes:
//!       - { label: "Warrior", id: 1 }
//!     tiers:
//!       - { label: "1", set_id: 3 }
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use gearset_core::Ruleset;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::ruleset::RulesetDescriptor;
use crate::validate::validate_config;

/// Configuration format version written by [`ScrapeConfig::default`].
pub const CONFIG_VERSION: &str = "1.0";

/// Browser-like identifier; some hosts reject default client identifiers.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for outbound page requests.
///
/// # Examples
///
/// ```
/// # use gearset_config::HttpConfig;
/// let http = HttpConfig::default();
/// assert_eq!(http.user_agent, "Mozilla/5.0");
/// assert_eq!(http.timeout_secs, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Value of the `User-Agent` request header.
    pub user_agent: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

fn default_jobs() -> usize {
    1
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Top-level run configuration.
///
/// # Examples
///
/// ```
/// use gearset_config::ScrapeConfig;
/// use gearset_core::Ruleset;
///
/// let config = ScrapeConfig::default();
/// assert_eq!(config.rulesets.len(), 2);
/// assert_eq!(config.ruleset(Ruleset::Legacy).unwrap().tiers.len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    #[serde(default)]
    pub http: HttpConfig,
    /// Number of pages fetched concurrently. Output order does not depend on it.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
    /// Directory the documents are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Rulesets in run order.
    pub rulesets: Vec<RulesetDescriptor>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            http: HttpConfig::default(),
            jobs: default_jobs(),
            output_dir: default_output_dir(),
            rulesets: Ruleset::ALL
                .into_iter()
                .map(RulesetDescriptor::builtin)
                .collect(),
        }
    }
}

impl ScrapeConfig {
    /// Loads and validates configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// [`YamlError`](ConfigError::YamlError) if parsing fails, or
    /// [`Invalid`](ConfigError::Invalid) with the first validation problem.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = Self::read(path)?;
        config.ensure_valid()?;
        Ok(config)
    }

    /// Parses a YAML file without validating it.
    ///
    /// Use with [`validate_config`] to report every problem at once.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be
    /// written, or [`YamlError`](ConfigError::YamlError) if serialization
    /// fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Fails with the first validation problem, if any.
    pub fn ensure_valid(&self) -> Result<()> {
        match validate_config(self).into_iter().next() {
            Some(err) => Err(ConfigError::Invalid(err.to_string())),
            None => Ok(()),
        }
    }

    /// Returns the descriptor for `ruleset`.
    pub fn ruleset(&self, ruleset: Ruleset) -> Result<&RulesetDescriptor> {
        self.rulesets
            .iter()
            .find(|d| d.ruleset == ruleset)
            .ok_or(ConfigError::MissingRuleset(ruleset))
    }

    /// Keeps only the listed rulesets, preserving configured order. An empty
    /// selection keeps everything.
    pub fn retain_rulesets(&mut self, selected: &[Ruleset]) {
        if selected.is_empty() {
            return;
        }
        self.rulesets.retain(|d| selected.contains(&d.ruleset));
    }

    /// Absolute or relative path of the document for `descriptor`.
    pub fn output_path(&self, descriptor: &RulesetDescriptor) -> PathBuf {
        self.output_dir.join(&descriptor.output_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_yaml() -> &'static str {
        r#"
version: "1.0"
http:
  user_agent: "Mozilla/5.0 (X11; Linux x86_64)"
  timeout_secs: 10
jobs: 4
output_dir: "out"
rulesets:
  - ruleset: legacy
    base_host: "http://classic.wowhead.com"
    output_file: "classic.lua"
    classes:
      - { label: "Warrior", id: 1 }
      - { label: "Paladin", id: 2 }
    tiers:
      - { label: "1", set_id: 3 }
"#
    }

    fn minimal_yaml() -> &'static str {
        r#"
version: "1.0"
rulesets: []
"#
    }

    #[test]
    fn test_deserialize_complete() {
        let config: ScrapeConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.jobs, 4);
        assert_eq!(config.output_dir, PathBuf::from("out"));

        let legacy = config.ruleset(Ruleset::Legacy).unwrap();
        assert_eq!(legacy.classes.len(), 2);
        assert_eq!(legacy.class_id("Paladin"), Some(2));
        assert_eq!(config.output_path(legacy), PathBuf::from("out/classic.lua"));
    }

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: ScrapeConfig = serde_yaml::from_str(minimal_yaml()).unwrap();
        assert_eq!(config.http, HttpConfig::default());
        assert_eq!(config.jobs, 1);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.rulesets.is_empty());
    }

    #[test]
    fn test_missing_ruleset_is_error() {
        let config: ScrapeConfig = serde_yaml::from_str(sample_yaml()).unwrap();
        let err = config.ruleset(Ruleset::Current).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRuleset(Ruleset::Current)));
    }

    #[test]
    fn test_retain_rulesets() {
        let mut config = ScrapeConfig::default();
        config.retain_rulesets(&[]);
        assert_eq!(config.rulesets.len(), 2);

        config.retain_rulesets(&[Ruleset::Legacy]);
        assert_eq!(config.rulesets.len(), 1);
        assert_eq!(config.rulesets[0].ruleset, Ruleset::Legacy);
    }

    #[test]
    fn test_default_is_valid() {
        assert!(ScrapeConfig::default().ensure_valid().is_ok());
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gearset.yml");

        let original = ScrapeConfig::default();
        original.save(&path).unwrap();

        let loaded = ScrapeConfig::load(&path).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yml");
        std::fs::write(
            &path,
            r#"
version: "1.0"
rulesets:
  - ruleset: current
    base_host: ""
    output_file: "out.lua"
    classes: []
    tiers: []
"#,
        )
        .unwrap();

        let err = ScrapeConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");

        let unchecked = ScrapeConfig::read(&path).unwrap();
        assert!(!validate_config(&unchecked).is_empty());
    }
}
