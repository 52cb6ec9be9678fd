//! Ruleset descriptors: database host, identifier tables and output file.
//!
//! A [`RulesetDescriptor`] carries everything a run needs to know about one
//! ruleset. The built-in descriptors ([`RulesetDescriptor::current`] and
//! [`RulesetDescriptor::legacy`]) hold the known class and tier tables.

use gearset_core::{Ruleset, SetQuery};
use serde::{Deserialize, Serialize};

/// Host serving current-ruleset pages.
pub const CURRENT_BASE_HOST: &str = "http://wowhead.com";

/// Host serving legacy-ruleset pages.
pub const LEGACY_BASE_HOST: &str = "http://classic.wowhead.com";

/// Output document for the current ruleset.
pub const CURRENT_OUTPUT_FILE: &str = "LibPeriodicTable-3.1-GearSet.lua";

/// Output document for the legacy ruleset.
pub const LEGACY_OUTPUT_FILE: &str = "LibPeriodicTable-3.1-GearSet-classic.lua";

/// Class label to class id, in run order.
const CLASSES: &[(&str, u32)] = &[
    ("Death Knight", 6),
    ("Druid", 11),
    ("Hunter", 3),
    ("Mage", 8),
    ("Monk", 10),
    ("Paladin", 2),
    ("Priest", 5),
    ("Rogue", 4),
    ("Shaman", 7),
    ("Warlock", 9),
    ("Warrior", 1),
];

const LEGACY_TIERS: &[(&str, u32)] = &[("1", 3), ("2", 4), ("3", 5)];

const CURRENT_TIERS: &[(&str, u32)] = &[
    ("1", 3),
    ("2", 4),
    ("3", 5),
    ("4", 12),
    ("5", 13),
    ("6", 18),
    ("7", 23),
    ("8", 25),
    ("9", 27),
    ("10", 29),
    ("11", 31),
    ("12", 35),
    ("13", 38),
    ("14", 39),
    ("15", 43),
    ("16", 64),
    ("17", 65),
    ("18", 71),
    ("19", 78),
    ("20", 82),
    ("21", 86),
];

/// A character class: label used in table keys, id used in requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub label: String,
    pub id: u32,
}

/// A tier: label used in table keys, item-set family id used in requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierEntry {
    pub label: String,
    pub set_id: u32,
}

/// Host, identifier tables and output file for one ruleset.
///
/// # Examples
///
/// ```
/// use gearset_config::RulesetDescriptor;
///
/// let legacy = RulesetDescriptor::legacy();
/// assert_eq!(legacy.tiers.len(), 3);
/// assert_eq!(legacy.classes.len(), 11);
/// assert_eq!(
///     legacy.item_sets_url(1, 3),
///     "http://classic.wowhead.com/item-sets?filter=cl=1;ta=3&xml"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetDescriptor {
    pub ruleset: Ruleset,
    /// Scheme and host, without a trailing path.
    pub base_host: String,
    /// File name of the generated document, relative to the output directory.
    pub output_file: String,
    /// Classes in run order.
    pub classes: Vec<ClassEntry>,
    /// Tiers in run order.
    pub tiers: Vec<TierEntry>,
}

impl RulesetDescriptor {
    /// Built-in descriptor for the current ruleset (21 tiers).
    pub fn current() -> Self {
        Self::from_tables(
            Ruleset::Current,
            CURRENT_BASE_HOST,
            CURRENT_OUTPUT_FILE,
            CURRENT_TIERS,
        )
    }

    /// Built-in descriptor for the legacy ruleset (3 tiers).
    pub fn legacy() -> Self {
        Self::from_tables(
            Ruleset::Legacy,
            LEGACY_BASE_HOST,
            LEGACY_OUTPUT_FILE,
            LEGACY_TIERS,
        )
    }

    /// Built-in descriptor for `ruleset`.
    pub fn builtin(ruleset: Ruleset) -> Self {
        match ruleset {
            Ruleset::Current => Self::current(),
            Ruleset::Legacy => Self::legacy(),
        }
    }

    fn from_tables(
        ruleset: Ruleset,
        base_host: &str,
        output_file: &str,
        tiers: &[(&str, u32)],
    ) -> Self {
        Self {
            ruleset,
            base_host: base_host.to_string(),
            output_file: output_file.to_string(),
            classes: CLASSES
                .iter()
                .map(|&(label, id)| ClassEntry {
                    label: label.to_string(),
                    id,
                })
                .collect(),
            tiers: tiers
                .iter()
                .map(|&(label, set_id)| TierEntry {
                    label: label.to_string(),
                    set_id,
                })
                .collect(),
        }
    }

    /// Listing page URL for one `(class id, set id)` pair.
    pub fn item_sets_url(&self, class_id: u32, set_id: u32) -> String {
        format!(
            "{}/item-sets?filter=cl={class_id};ta={set_id}&xml",
            self.base_host.trim_end_matches('/')
        )
    }

    /// Looks up a class id by label.
    pub fn class_id(&self, label: &str) -> Option<u32> {
        self.classes.iter().find(|c| c.label == label).map(|c| c.id)
    }

    /// Looks up a tier's set id by label.
    pub fn set_id(&self, tier_label: &str) -> Option<u32> {
        self.tiers
            .iter()
            .find(|t| t.label == tier_label)
            .map(|t| t.set_id)
    }

    /// Every `(tier, class)` pair in run order: tiers outer, classes inner.
    pub fn pairs(&self) -> impl Iterator<Item = (&TierEntry, &ClassEntry, SetQuery)> {
        self.tiers.iter().flat_map(move |tier| {
            self.classes.iter().map(move |class| {
                (
                    tier,
                    class,
                    SetQuery::new(class.id, tier.set_id, self.ruleset),
                )
            })
        })
    }

    /// Number of `(tier, class)` pairs a run visits.
    pub fn pair_count(&self) -> usize {
        self.tiers.len() * self.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables() {
        let current = RulesetDescriptor::current();
        assert_eq!(current.ruleset, Ruleset::Current);
        assert_eq!(current.classes.len(), 11);
        assert_eq!(current.tiers.len(), 21);
        assert_eq!(current.set_id("1"), Some(3));
        assert_eq!(current.set_id("16"), Some(64));
        assert_eq!(current.set_id("21"), Some(86));
        assert_eq!(current.class_id("Death Knight"), Some(6));
        assert_eq!(current.class_id("Warrior"), Some(1));
        assert_eq!(current.class_id("Bard"), None);

        let legacy = RulesetDescriptor::legacy();
        assert_eq!(legacy.tiers.len(), 3);
        assert_eq!(legacy.set_id("4"), None);
    }

    #[test]
    fn test_builtin_classes_are_sorted_by_label() {
        let current = RulesetDescriptor::current();
        let labels: Vec<&str> = current
            .classes
            .iter()
            .map(|c| c.label.as_str())
            .collect();
        let mut sorted = labels.clone();
        sorted.sort_unstable();
        assert_eq!(labels, sorted);
    }

    #[test]
    fn test_item_sets_url_trims_trailing_slash() {
        let mut descriptor = RulesetDescriptor::current();
        descriptor.base_host = "http://wowhead.com/".to_string();
        assert_eq!(
            descriptor.item_sets_url(11, 86),
            "http://wowhead.com/item-sets?filter=cl=11;ta=86&xml"
        );
    }

    #[test]
    fn test_pairs_iterate_tiers_then_classes() {
        let legacy = RulesetDescriptor::legacy();
        let pairs: Vec<(String, String, SetQuery)> = legacy
            .pairs()
            .map(|(tier, class, query)| (tier.label.clone(), class.label.clone(), query))
            .collect();

        assert_eq!(pairs.len(), legacy.pair_count());
        assert_eq!(pairs.len(), 33);
        assert_eq!(pairs[0].0, "1");
        assert_eq!(pairs[0].1, "Death Knight");
        assert_eq!(pairs[0].2, SetQuery::new(6, 3, Ruleset::Legacy));
        assert_eq!(pairs[10].1, "Warrior");
        assert_eq!(pairs[11].0, "2");
        assert_eq!(pairs[32].2, SetQuery::new(1, 5, Ruleset::Legacy));
    }
}
