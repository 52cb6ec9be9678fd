//! Ruleset descriptors and run configuration for gear-set table generation.
//!
//! The identifier tables (class label to class id, tier label to set id),
//! the database host and the output file of each ruleset are plain data in a
//! [`RulesetDescriptor`]. A [`ScrapeConfig`] bundles the descriptors with
//! request settings and can be loaded from or saved to YAML.
//!
//! # Quick start
//!
//! ```no_run
//! use gearset_config::{ScrapeConfig, validate_config};
//! use gearset_core::Ruleset;
//!
//! // Built-in tables for both rulesets
//! let config = ScrapeConfig::default();
//! assert!(validate_config(&config).is_empty());
//!
//! // Or a curated file
//! let config = ScrapeConfig::load("gearset.yml").unwrap();
//! let current = config.ruleset(Ruleset::Current).unwrap();
//! println!("{} pairs", current.pair_count());
//! ```

mod config;
mod error;
mod ruleset;
mod validate;

pub use config::{
    CONFIG_VERSION, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, HttpConfig, ScrapeConfig,
};
pub use error::{ConfigError, Result};
pub use ruleset::{
    CURRENT_BASE_HOST, CURRENT_OUTPUT_FILE, ClassEntry, LEGACY_BASE_HOST, LEGACY_OUTPUT_FILE,
    RulesetDescriptor, TierEntry,
};
pub use validate::{ValidationError, validate_config, validate_ruleset};
