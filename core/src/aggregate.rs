//! Grouping of item records by display name and level variant.
//!
//! [`aggregate`] folds a sequence of [`ItemRecord`]s into an
//! [`AggregatedSet`], a nested `name -> level variant -> item id` mapping.
//! Both levels are ordered maps, so iteration is sorted by name and then by
//! ascending level variant regardless of input order.
//!
//! When two records share a `(name, level variant)` pair the later record
//! wins. Every overwrite with a different id is kept as a [`Collision`] so
//! callers can report it.
//!
//! # Example
//!
//! ```
//! use gearset_core::*;
//!
//! let records = vec![
//!     ItemRecord::new("Plate of the Fallen", 70, 200, 8),
//!     ItemRecord::new("Plate of the Fallen", 60, 100, 8),
//! ];
//! let set = aggregate(&records);
//! let levels: Vec<i64> = set.levels("Plate of the Fallen").unwrap().keys().copied().collect();
//! assert_eq!(levels, vec![60, 70]);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ItemRecord;

/// A `(name, level variant)` pair that was assigned more than one item id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collision {
    pub name: String,
    pub level_variant: i64,
    /// Id that was overwritten.
    pub previous_item_id: i64,
    /// Id that was kept.
    pub item_id: i64,
}

/// One flattened `(name, level variant, item id)` triple of an
/// [`AggregatedSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetEntry<'a> {
    pub name: &'a str,
    pub level_variant: i64,
    pub item_id: i64,
}

/// Item ids grouped by set name, then by level variant.
///
/// # Examples
///
/// ```
/// use gearset_core::AggregatedSet;
///
/// let mut set = AggregatedSet::new();
/// assert!(set.insert("Dreadnaught Battlegear", 80, 787).is_none());
/// assert_eq!(set.insert("Dreadnaught Battlegear", 80, 788), Some(787));
/// assert_eq!(set.item_id("Dreadnaught Battlegear", 80), Some(788));
/// assert_eq!(set.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedSet {
    sets: BTreeMap<String, BTreeMap<i64, i64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    collisions: Vec<Collision>,
}

impl AggregatedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `item_id` under `(name, level_variant)` and returns the id it
    /// replaced, if any.
    ///
    /// Replacing an id with a different id records a [`Collision`].
    pub fn insert(&mut self, name: &str, level_variant: i64, item_id: i64) -> Option<i64> {
        let previous = self
            .sets
            .entry(name.to_string())
            .or_default()
            .insert(level_variant, item_id);

        if let Some(previous_item_id) = previous {
            if previous_item_id != item_id {
                self.collisions.push(Collision {
                    name: name.to_string(),
                    level_variant,
                    previous_item_id,
                    item_id,
                });
            }
        }
        previous
    }

    /// Returns the item id stored for `(name, level_variant)`.
    pub fn item_id(&self, name: &str, level_variant: i64) -> Option<i64> {
        self.sets.get(name)?.get(&level_variant).copied()
    }

    /// Returns the level variant map for one set name.
    pub fn levels(&self, name: &str) -> Option<&BTreeMap<i64, i64>> {
        self.sets.get(name)
    }

    /// Set names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sets.keys().map(String::as_str)
    }

    /// All triples, sorted by name and then ascending level variant.
    pub fn entries(&self) -> impl Iterator<Item = SetEntry<'_>> {
        self.sets.iter().flat_map(|(name, levels)| {
            levels.iter().map(move |(&level_variant, &item_id)| SetEntry {
                name,
                level_variant,
                item_id,
            })
        })
    }

    /// Overwrites observed while aggregating, in input order.
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// Number of `(name, level variant)` pairs.
    pub fn len(&self) -> usize {
        self.sets.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Groups records into an [`AggregatedSet`], later records winning on
/// duplicate `(name, level variant)` pairs.
pub fn aggregate<'a, I>(records: I) -> AggregatedSet
where
    I: IntoIterator<Item = &'a ItemRecord>,
{
    let mut set = AggregatedSet::new();
    for record in records {
        set.insert(&record.name, record.level_variant, record.item_id);
    }
    set
}
