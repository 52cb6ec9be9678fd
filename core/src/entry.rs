//! Lookup-table entry lines and their key grammar.
//!
//! Every entry of the generated table is one line of the form
//!
//! ```text
//! \t["GearSet.Tier {tier}.{level}.{class}.{name}"] = "",
//! ```
//!
//! The consumer indexes the table by the key string verbatim, so the grammar
//! is fixed: [`KEY_PREFIX`], then `Tier ` and the tier label, the level
//! variant, the class label and the set name, joined by [`KEY_DELIMITER`].
//! The value is always an empty placeholder.
//!
//! Key components are written inside a double-quoted Lua string. Backslashes,
//! double quotes and line breaks are escaped so the literal evaluates to the
//! unescaped key.

use std::fmt;

use crate::{AggregatedSet, SetEntry};

/// Leading key component shared by all entries.
pub const KEY_PREFIX: &str = "GearSet";

/// Separator between key components.
pub const KEY_DELIMITER: char = '.';

/// One rendered line of the lookup table.
///
/// # Examples
///
/// ```
/// use gearset_core::TableEntry;
///
/// let entry = TableEntry::new("1", 60, "Warrior", "Plate of the Fallen");
/// assert_eq!(entry.key(), "GearSet.Tier 1.60.Warrior.Plate of the Fallen");
/// assert_eq!(
///     entry.to_string(),
///     "\t[\"GearSet.Tier 1.60.Warrior.Plate of the Fallen\"] = \"\","
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub tier: String,
    pub level_variant: i64,
    pub class_label: String,
    pub name: String,
}

impl TableEntry {
    pub fn new(
        tier: impl Into<String>,
        level_variant: i64,
        class_label: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            tier: tier.into(),
            level_variant,
            class_label: class_label.into(),
            name: name.into(),
        }
    }

    /// Builds the entry for one aggregated triple.
    pub fn from_set_entry(entry: SetEntry<'_>, tier: &str, class_label: &str) -> Self {
        Self::new(tier, entry.level_variant, class_label, entry.name)
    }

    /// The unescaped lookup key.
    pub fn key(&self) -> String {
        format!(
            "{KEY_PREFIX}{d}Tier {}{d}{}{d}{}{d}{}",
            self.tier,
            self.level_variant,
            self.class_label,
            self.name,
            d = KEY_DELIMITER,
        )
    }

    /// The full table line without a trailing newline.
    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\t[\"{}\"] = \"\",", escape_lua_string(&self.key()))
    }
}

/// Renders one table entry per `(name, level variant)` pair of `set`.
///
/// Names are visited in sorted order and each name's level variants in
/// ascending order.
///
/// # Examples
///
/// ```
/// use gearset_core::*;
///
/// let set = aggregate(&[
///     ItemRecord::new("Plate of the Fallen", 70, 200, 8),
///     ItemRecord::new("Plate of the Fallen", 60, 100, 8),
/// ]);
/// let lines: Vec<String> = render_entries(&set, "1", "Warrior")
///     .iter()
///     .map(TableEntry::line)
///     .collect();
/// assert_eq!(lines, vec![
///     "\t[\"GearSet.Tier 1.60.Warrior.Plate of the Fallen\"] = \"\",",
///     "\t[\"GearSet.Tier 1.70.Warrior.Plate of the Fallen\"] = \"\",",
/// ]);
/// ```
pub fn render_entries(set: &AggregatedSet, tier: &str, class_label: &str) -> Vec<TableEntry> {
    set.entries()
        .map(|entry| TableEntry::from_set_entry(entry, tier, class_label))
        .collect()
}

/// Escapes text for a double-quoted Lua string literal.
pub fn escape_lua_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}
