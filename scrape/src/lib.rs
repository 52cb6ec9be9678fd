//! Fetch item-set listing pages, extract their embedded data and write
//! gear-set lookup tables.
//!
//! A run visits every `(tier, class)` pair of a ruleset:
//!
//! 1. [`fetch`]: retrieve the listing page ([`fetch::HttpFetcher`] online,
//!    [`fetch::DirectoryFetcher`] from saved pages).
//! 2. [`extract`]: locate the `new Listview({... data: [...]})` block and
//!    read its rows as item records. Region ends come from the bracket
//!    scanner in [`scan`].
//! 3. Aggregate and render with `gearset-core`.
//! 4. [`document`]: append the lines to the ruleset's output document.
//!
//! [`pipeline::generate`] drives the whole run and returns a
//! [`report::RunReport`].
//!
//! # Example
//!
//! ```no_run
//! use gearset_config::ScrapeConfig;
//! use gearset_scrape::fetch::HttpFetcher;
//! use gearset_scrape::pipeline::generate;
//!
//! let config = ScrapeConfig::default();
//! let fetcher = HttpFetcher::new(&config.http, &config.rulesets);
//! let report = generate(&config, &fetcher).unwrap();
//! println!("{} entries, {} failed pairs", report.entries_written(), report.failure_count());
//! ```

pub mod document;
pub mod extract;
pub mod fetch;
pub mod pipeline;
pub mod report;
pub mod scan;
