//! Data model for gear-set extraction.
//!
//! These types describe one request against the item-set database
//! ([`SetQuery`]), one row of the embedded listing data ([`ItemRecord`]) and
//! the game rule version a run targets ([`Ruleset`]). They carry no I/O and
//! can round-trip through JSON and YAML.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Game rule version a run targets.
///
/// Each ruleset has its own database host, tier table and output document.
///
/// # Examples
///
/// ```
/// use gearset_core::Ruleset;
///
/// let ruleset: Ruleset = "legacy".parse().unwrap();
/// assert_eq!(ruleset, Ruleset::Legacy);
/// assert!(ruleset.is_legacy());
/// assert_eq!(Ruleset::Current.to_string(), "current");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Ruleset {
    /// The live game (the default).
    #[default]
    Current,
    /// The legacy ("classic") game.
    Legacy,
}

impl Ruleset {
    /// All rulesets in run order.
    pub const ALL: [Ruleset; 2] = [Ruleset::Current, Ruleset::Legacy];

    /// Returns `true` for [`Ruleset::Legacy`].
    pub fn is_legacy(self) -> bool {
        matches!(self, Ruleset::Legacy)
    }

    /// Lowercase label, identical to the serde representation.
    pub fn label(self) -> &'static str {
        match self {
            Ruleset::Current => "current",
            Ruleset::Legacy => "legacy",
        }
    }
}

impl fmt::Display for Ruleset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string does not name a [`Ruleset`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ruleset '{0}': expected 'current' or 'legacy'")]
pub struct ParseRulesetError(pub String);

impl FromStr for Ruleset {
    type Err = ParseRulesetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" | "retail" => Ok(Ruleset::Current),
            "legacy" | "classic" => Ok(Ruleset::Legacy),
            other => Err(ParseRulesetError(other.to_string())),
        }
    }
}

/// One fetch request: a class id and a set id under a ruleset.
///
/// Ids are not validated locally. An unknown combination simply yields a
/// page without listing data.
///
/// # Examples
///
/// ```
/// use gearset_core::{Ruleset, SetQuery};
///
/// let query = SetQuery::new(1, 3, Ruleset::Legacy);
/// assert!(query.is_legacy());
/// assert_eq!(query.to_string(), "legacy cl=1 ta=3");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetQuery {
    /// Database class identifier.
    pub class_id: u32,
    /// Database item-set family identifier for one tier.
    pub set_id: u32,
    /// Ruleset whose host serves the page.
    pub ruleset: Ruleset,
}

impl SetQuery {
    pub fn new(class_id: u32, set_id: u32, ruleset: Ruleset) -> Self {
        Self {
            class_id,
            set_id,
            ruleset,
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.ruleset.is_legacy()
    }
}

impl fmt::Display for SetQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cl={} ta={}", self.ruleset, self.class_id, self.set_id)
    }
}

/// One item-set row from the embedded listing data.
///
/// Field names follow the listing's JSON keys: `name`, `maxlevel`, `id` and
/// `pieces`. The `pieces` key holds either a count or the list of piece item
/// ids; both deserialize to a count.
///
/// # Examples
///
/// ```
/// use gearset_core::ItemRecord;
///
/// let json = r#"{"name":"Battlegear of Might","maxlevel":60,"id":209,"pieces":[16861,16862]}"#;
/// let record: ItemRecord = serde_json::from_str(json).unwrap();
/// assert_eq!(record.level_variant, 60);
/// assert_eq!(record.item_id, 209);
/// assert_eq!(record.piece_count, 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Display name of the set.
    pub name: String,
    /// Maximum character level the set version was obtainable at.
    #[serde(rename = "maxlevel")]
    pub level_variant: i64,
    /// Database identifier of the set.
    #[serde(rename = "id")]
    pub item_id: i64,
    /// Number of pieces in the set.
    #[serde(rename = "pieces", deserialize_with = "deserialize_piece_count")]
    pub piece_count: u32,
}

impl ItemRecord {
    pub fn new(name: impl Into<String>, level_variant: i64, item_id: i64, piece_count: u32) -> Self {
        Self {
            name: name.into(),
            level_variant,
            item_id,
            piece_count,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PiecesField {
    Count(u32),
    Items(Vec<serde_json::Value>),
}

fn deserialize_piece_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match PiecesField::deserialize(deserializer)? {
        PiecesField::Count(count) => Ok(count),
        PiecesField::Items(items) => u32::try_from(items.len()).map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ruleset_parse_accepts_aliases() {
        assert_eq!("Current".parse::<Ruleset>().unwrap(), Ruleset::Current);
        assert_eq!("retail".parse::<Ruleset>().unwrap(), Ruleset::Current);
        assert_eq!(" classic ".parse::<Ruleset>().unwrap(), Ruleset::Legacy);
        assert!("tbc".parse::<Ruleset>().is_err());
    }

    #[test]
    fn test_ruleset_display_matches_serde() {
        for ruleset in Ruleset::ALL {
            let json = serde_json::to_string(&ruleset).unwrap();
            assert_eq!(json, format!("\"{ruleset}\""));
        }
    }

    #[test]
    fn test_item_record_piece_count_from_integer() {
        let json = r#"{"name":"Plate of the Fallen","maxlevel":70,"id":200,"pieces":8}"#;
        let record: ItemRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record, ItemRecord::new("Plate of the Fallen", 70, 200, 8));
    }

    #[test]
    fn test_item_record_ignores_unknown_fields() {
        let json = r#"{"name":"Dreadnaught","maxlevel":80,"id":787,"pieces":[1,2,3,4,5],"note":3}"#;
        let record: ItemRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.piece_count, 5);
    }

    #[test]
    fn test_item_record_accepts_negative_ids() {
        let json = r#"{"name":"Placeholder Set","maxlevel":0,"id":-428,"pieces":2}"#;
        let record: ItemRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.item_id, -428);
        assert_eq!(record.level_variant, 0);
    }

    #[test]
    fn test_item_record_missing_field_is_error() {
        let json = r#"{"name":"Dreadnaught","id":787,"pieces":5}"#;
        let err = serde_json::from_str::<ItemRecord>(json).unwrap_err();
        assert!(err.to_string().contains("maxlevel"));
    }
}
