//! Core types for tier gear-set lookup tables.
//!
//! This crate defines the data that flows through a gear-set extraction run:
//!
//! - [`Ruleset`]: the game rule version a run targets (current or legacy).
//! - [`SetQuery`]: one `(class id, set id)` request under a ruleset.
//! - [`ItemRecord`]: one row of the listing data embedded in a database page.
//! - [`AggregatedSet`]: records grouped as `name -> level variant -> item id`.
//! - [`TableEntry`]: one `["GearSet.Tier ..."] = "",` line of the output table.
//!
//! Aggregation ([`aggregate`]) is last-write-wins on duplicate
//! `(name, level variant)` pairs and records every overwrite as a
//! [`Collision`]. Rendering ([`render_entries`]) is deterministic: names in
//! sorted order, level variants ascending.
//!
//! # Example
//!
//! ```
//! use gearset_core::*;
//!
//! let records = vec![
//!     ItemRecord::new("Plate of the Fallen", 60, 100, 8),
//!     ItemRecord::new("Plate of the Fallen", 70, 200, 8),
//! ];
//! let set = aggregate(&records);
//! let entries = render_entries(&set, "1", "Warrior");
//!
//! assert_eq!(entries.len(), 2);
//! assert_eq!(entries[0].key(), "GearSet.Tier 1.60.Warrior.Plate of the Fallen");
//! ```

mod aggregate;
mod entry;
mod types;

pub use aggregate::{AggregatedSet, Collision, SetEntry, aggregate};
pub use entry::{KEY_DELIMITER, KEY_PREFIX, TableEntry, escape_lua_string, render_entries};
pub use types::*;
