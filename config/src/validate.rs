//! Configuration validation.
//!
//! Catches structural problems before a run starts: missing hosts, duplicate
//! labels, zero ids, and labels that would corrupt the table key grammar.

use std::collections::HashSet;

use gearset_core::{KEY_DELIMITER, Ruleset};
use thiserror::Error;

use crate::{RulesetDescriptor, ScrapeConfig};

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Configuration version string is empty.
    #[error("config version cannot be empty")]
    EmptyVersion,
    /// Request timeout is zero.
    #[error("http timeout must be greater than zero")]
    ZeroTimeout,
    /// Two descriptors target the same ruleset.
    #[error("duplicate ruleset: {0}")]
    DuplicateRuleset(Ruleset),
    /// Base host is empty or has no scheme.
    #[error("{0}: base host must start with http:// or https://")]
    InvalidHost(Ruleset),
    /// Output file name is empty.
    #[error("{0}: output file cannot be empty")]
    EmptyOutputFile(Ruleset),
    /// Two descriptors write the same output file.
    #[error("output file shared by several rulesets: {0}")]
    SharedOutputFile(String),
    /// A class or tier label is empty.
    #[error("{0}: labels cannot be empty")]
    EmptyLabel(Ruleset),
    /// A class or tier label contains the key delimiter.
    #[error("{ruleset}: label '{label}' contains the key delimiter '{delimiter}'")]
    DelimiterInLabel {
        ruleset: Ruleset,
        label: String,
        delimiter: char,
    },
    /// A class label appears twice.
    #[error("{ruleset}: duplicate class label '{label}'")]
    DuplicateClass { ruleset: Ruleset, label: String },
    /// A tier label appears twice.
    #[error("{ruleset}: duplicate tier label '{label}'")]
    DuplicateTier { ruleset: Ruleset, label: String },
    /// A class or set id is zero.
    #[error("{ruleset}: '{label}' has id 0")]
    ZeroId { ruleset: Ruleset, label: String },
}

/// Validates a full configuration.
///
/// # Examples
///
/// ```
/// use gearset_config::*;
///
/// let mut config = ScrapeConfig::default();
/// assert!(validate_config(&config).is_empty());
///
/// config.rulesets[0].classes[0].label = "Death.Knight".into();
/// let errors = validate_config(&config);
/// assert!(errors.iter().any(|e| matches!(e, ValidationError::DelimiterInLabel { .. })));
/// ```
pub fn validate_config(config: &ScrapeConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.version.trim().is_empty() {
        errors.push(ValidationError::EmptyVersion);
    }
    if config.http.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut rulesets = HashSet::new();
    let mut outputs = HashSet::new();
    for descriptor in &config.rulesets {
        if !rulesets.insert(descriptor.ruleset) {
            errors.push(ValidationError::DuplicateRuleset(descriptor.ruleset));
        }
        if !descriptor.output_file.trim().is_empty()
            && !outputs.insert(descriptor.output_file.as_str())
        {
            errors.push(ValidationError::SharedOutputFile(
                descriptor.output_file.clone(),
            ));
        }
        errors.extend(validate_ruleset(descriptor));
    }

    errors
}

/// Validates one ruleset descriptor.
pub fn validate_ruleset(descriptor: &RulesetDescriptor) -> Vec<ValidationError> {
    let ruleset = descriptor.ruleset;
    let mut errors = Vec::new();

    let host = descriptor.base_host.trim();
    if !(host.starts_with("http://") || host.starts_with("https://")) {
        errors.push(ValidationError::InvalidHost(ruleset));
    }
    if descriptor.output_file.trim().is_empty() {
        errors.push(ValidationError::EmptyOutputFile(ruleset));
    }

    let mut classes = HashSet::new();
    for class in &descriptor.classes {
        check_label(ruleset, &class.label, class.id, &mut errors);
        if !classes.insert(class.label.as_str()) {
            errors.push(ValidationError::DuplicateClass {
                ruleset,
                label: class.label.clone(),
            });
        }
    }

    let mut tiers = HashSet::new();
    for tier in &descriptor.tiers {
        check_label(ruleset, &tier.label, tier.set_id, &mut errors);
        if !tiers.insert(tier.label.as_str()) {
            errors.push(ValidationError::DuplicateTier {
                ruleset,
                label: tier.label.clone(),
            });
        }
    }

    errors
}

fn check_label(ruleset: Ruleset, label: &str, id: u32, errors: &mut Vec<ValidationError>) {
    if label.trim().is_empty() {
        errors.push(ValidationError::EmptyLabel(ruleset));
    } else if label.contains(KEY_DELIMITER) {
        errors.push(ValidationError::DelimiterInLabel {
            ruleset,
            label: label.to_string(),
            delimiter: KEY_DELIMITER,
        });
    }
    if id == 0 {
        errors.push(ValidationError::ZeroId {
            ruleset,
            label: label.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClassEntry, TierEntry};

    #[test]
    fn test_builtin_descriptors_are_valid() {
        assert!(validate_ruleset(&RulesetDescriptor::current()).is_empty());
        assert!(validate_ruleset(&RulesetDescriptor::legacy()).is_empty());
    }

    #[test]
    fn test_duplicate_ruleset_and_output() {
        let mut config = ScrapeConfig::default();
        config.rulesets.push(RulesetDescriptor::legacy());
        let errors = validate_config(&config);
        assert!(errors.contains(&ValidationError::DuplicateRuleset(Ruleset::Legacy)));
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::SharedOutputFile(_)))
        );
    }

    #[test]
    fn test_duplicate_labels() {
        let mut descriptor = RulesetDescriptor::legacy();
        descriptor.classes.push(ClassEntry {
            label: "Warrior".into(),
            id: 12,
        });
        descriptor.tiers.push(TierEntry {
            label: "1".into(),
            set_id: 99,
        });
        let errors = validate_ruleset(&descriptor);
        assert!(errors.contains(&ValidationError::DuplicateClass {
            ruleset: Ruleset::Legacy,
            label: "Warrior".into(),
        }));
        assert!(errors.contains(&ValidationError::DuplicateTier {
            ruleset: Ruleset::Legacy,
            label: "1".into(),
        }));
    }

    #[test]
    fn test_zero_id_and_empty_label() {
        let mut descriptor = RulesetDescriptor::legacy();
        descriptor.tiers[0].set_id = 0;
        descriptor.classes[0].label = "  ".into();
        let errors = validate_ruleset(&descriptor);
        assert!(errors.contains(&ValidationError::ZeroId {
            ruleset: Ruleset::Legacy,
            label: "1".into(),
        }));
        assert!(errors.contains(&ValidationError::EmptyLabel(Ruleset::Legacy)));
    }

    #[test]
    fn test_invalid_host_and_timeout() {
        let mut config = ScrapeConfig::default();
        config.http.timeout_secs = 0;
        config.rulesets[0].base_host = "wowhead.com".into();
        let errors = validate_config(&config);
        assert!(errors.contains(&ValidationError::ZeroTimeout));
        assert!(errors.contains(&ValidationError::InvalidHost(Ruleset::Current)));
    }
}
