//! End-to-end generation: fetch, extract, aggregate, render, write.
//!
//! Each ruleset produces one document. Its `(tier, class)` pairs are
//! processed in descriptor order (tiers outer, classes inner). A pair that
//! fails to fetch or extract is logged, recorded in the report and skipped;
//! a document that cannot be created, written or finished aborts the run.
//!
//! With `jobs > 1` pages are fetched and extracted on a rayon pool. Results
//! are collected in pair order before anything is written, so the document
//! is byte-identical to a serial run.

use std::path::Path;

use gearset_config::{RulesetDescriptor, ScrapeConfig};
use gearset_core::{Collision, SetQuery, TableEntry, aggregate, render_entries};
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::document::{DocumentError, DocumentFile};
use crate::extract::{ExtractError, extract};
use crate::fetch::{FetchError, PageFetcher};
use crate::report::{FailureCode, PairReport, PairStatus, RulesetReport, RunReport};

/// Failure of a single pair. Never fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum PairError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl PairError {
    pub fn failure_code(&self) -> FailureCode {
        match self {
            Self::Fetch(FetchError::Status { .. }) => FailureCode::HttpStatus,
            Self::Fetch(_) => FailureCode::FetchFailed,
            Self::Extract(ExtractError::Parse(_)) => FailureCode::ParseFailed,
            Self::Extract(ExtractError::Schema { .. }) => FailureCode::SchemaMismatch,
            Self::Extract(ExtractError::NotFound | ExtractError::MalformedData(_)) => {
                FailureCode::MalformedData
            }
        }
    }
}

/// Fatal run failure.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("failed to build fetch thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Rendered output of one pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapedPair {
    /// Records found on the page, before aggregation.
    pub records: usize,
    /// Entry lines in output order.
    pub entries: Vec<TableEntry>,
    /// `(name, level)` keys seen with more than one item id.
    pub collisions: Vec<Collision>,
    /// `true` when the page had no listing at all.
    pub not_found: bool,
}

/// Fetches, extracts, aggregates and renders one pair.
///
/// A page without a Listview block yields an empty result rather than an
/// error.
pub fn scrape_pair<F>(
    fetcher: &F,
    query: &SetQuery,
    tier: &str,
    class_label: &str,
) -> Result<ScrapedPair, PairError>
where
    F: PageFetcher + ?Sized,
{
    let raw = fetcher.fetch(query)?;
    let records = match extract(&raw) {
        Ok(records) => records,
        Err(ExtractError::NotFound) => {
            return Ok(ScrapedPair {
                not_found: true,
                ..ScrapedPair::default()
            });
        }
        Err(err) => return Err(err.into()),
    };

    let set = aggregate(&records);
    Ok(ScrapedPair {
        records: records.len(),
        entries: render_entries(&set, tier, class_label),
        collisions: set.collisions().to_vec(),
        not_found: false,
    })
}

struct PairJob<'a> {
    tier: &'a str,
    class_label: &'a str,
    query: SetQuery,
}

/// Generates the document for one ruleset at `output_path`.
///
/// The document is opened before the first request and finished after the
/// last pair, exactly once.
pub fn generate_ruleset<F>(
    descriptor: &RulesetDescriptor,
    fetcher: &F,
    jobs: usize,
    output_path: &Path,
) -> Result<RulesetReport, RunError>
where
    F: PageFetcher + ?Sized,
{
    let ruleset = descriptor.ruleset;
    info!(
        %ruleset,
        pairs = descriptor.pair_count(),
        output = %output_path.display(),
        "generating gear-set table"
    );

    let mut document = DocumentFile::create(output_path)?;

    let pairs: Vec<PairJob<'_>> = descriptor
        .pairs()
        .map(|(tier, class, query)| PairJob {
            tier: &tier.label,
            class_label: &class.label,
            query,
        })
        .collect();

    let run_one = |job: &PairJob<'_>| scrape_pair(fetcher, &job.query, job.tier, job.class_label);
    let outcomes: Vec<Result<ScrapedPair, PairError>> = if jobs <= 1 {
        pairs.iter().map(run_one).collect()
    } else {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
        pool.install(|| pairs.par_iter().map(run_one).collect())
    };

    let mut reports = Vec::with_capacity(pairs.len());
    for (job, outcome) in pairs.iter().zip(outcomes) {
        let location = fetcher.locate(&job.query);
        let report = match outcome {
            Ok(scraped) => {
                log_collisions(job, &scraped.collisions);
                document.append(&scraped.entries)?;
                if scraped.not_found {
                    info!(query = %job.query, tier = job.tier, class = job.class_label, "no listing on page");
                } else {
                    debug!(
                        query = %job.query,
                        records = scraped.records,
                        entries = scraped.entries.len(),
                        "pair rendered"
                    );
                }
                pair_report(job, location, &scraped)
            }
            Err(err) => {
                log_pair_error(job, &err);
                failed_pair_report(job, location, &err)
            }
        };
        reports.push(report);
    }

    let summary = document.finish()?;
    let failed = reports.iter().filter(|r| r.is_failure()).count();
    info!(
        %ruleset,
        entries = summary.stats.entries,
        failed,
        output = %summary.path.display(),
        "gear-set table written"
    );

    Ok(RulesetReport {
        ruleset,
        output_path: summary.path,
        entries_written: summary.stats.entries,
        checksum: summary.stats.checksum,
        pairs: reports,
    })
}

/// Generates one document per configured ruleset, in configuration order.
///
/// # Errors
///
/// Stops at the first document that cannot be written. Documents finished
/// before the failure stay in place.
pub fn generate<F>(config: &ScrapeConfig, fetcher: &F) -> Result<RunReport, RunError>
where
    F: PageFetcher + ?Sized,
{
    let mut report = RunReport::new();
    for descriptor in &config.rulesets {
        let output_path = config.output_path(descriptor);
        let ruleset_report = generate_ruleset(descriptor, fetcher, config.jobs, &output_path)?;
        report.rulesets.push(ruleset_report);
    }
    Ok(report)
}

fn log_collisions(job: &PairJob<'_>, collisions: &[Collision]) {
    for collision in collisions {
        warn!(
            query = %job.query,
            tier = job.tier,
            class = job.class_label,
            name = %collision.name,
            level = collision.level_variant,
            previous = collision.previous_item_id,
            kept = collision.item_id,
            "duplicate set entry, keeping the later item id"
        );
    }
}

fn log_pair_error(job: &PairJob<'_>, err: &PairError) {
    match err {
        PairError::Fetch(_) => warn!(
            query = %job.query,
            tier = job.tier,
            class = job.class_label,
            error = %err,
            "failed to fetch listing page"
        ),
        PairError::Extract(_) => error!(
            query = %job.query,
            tier = job.tier,
            class = job.class_label,
            error = %err,
            "failed to extract listing data"
        ),
    }
}

fn pair_report(job: &PairJob<'_>, location: Option<String>, scraped: &ScrapedPair) -> PairReport {
    PairReport {
        tier: job.tier.to_string(),
        class_label: job.class_label.to_string(),
        class_id: job.query.class_id,
        set_id: job.query.set_id,
        location,
        status: if scraped.not_found {
            PairStatus::Empty
        } else {
            PairStatus::Ok
        },
        records: scraped.records,
        entries: scraped.entries.len(),
        collisions: scraped.collisions.len(),
        failure_code: None,
        failure_detail: None,
    }
}

fn failed_pair_report(job: &PairJob<'_>, location: Option<String>, err: &PairError) -> PairReport {
    PairReport {
        tier: job.tier.to_string(),
        class_label: job.class_label.to_string(),
        class_id: job.query.class_id,
        set_id: job.query.set_id,
        location,
        status: PairStatus::Failed,
        records: 0,
        entries: 0,
        collisions: 0,
        failure_code: Some(err.failure_code()),
        failure_detail: Some(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gearset_core::{Ruleset, escape_lua_string};

    struct StaticPage(Result<String, u16>);

    impl PageFetcher for StaticPage {
        fn fetch(&self, _query: &SetQuery) -> Result<String, FetchError> {
            match &self.0 {
                Ok(page) => Ok(page.clone()),
                Err(status) => Err(FetchError::Status {
                    url: "http://example.test".to_string(),
                    status: *status,
                }),
            }
        }
    }

    fn query() -> SetQuery {
        SetQuery::new(1, 3, Ruleset::Legacy)
    }

    #[test]
    fn test_scrape_pair_renders_sorted_entries() {
        let page = StaticPage(Ok(r#"new Listview({data: [
            {"name":"Plate of the Fallen","maxlevel":70,"id":200,"pieces":8},
            {"name":"Plate of the Fallen","maxlevel":60,"id":100,"pieces":8}
        ]});"#
            .to_string()));
        let scraped = scrape_pair(&page, &query(), "1", "Warrior").unwrap();

        assert_eq!(scraped.records, 2);
        assert!(!scraped.not_found);
        let keys: Vec<String> = scraped.entries.iter().map(TableEntry::key).collect();
        assert_eq!(
            keys,
            vec![
                "GearSet.Tier 1.60.Warrior.Plate of the Fallen",
                "GearSet.Tier 1.70.Warrior.Plate of the Fallen",
            ]
        );
    }

    #[test]
    fn test_scrape_pair_collision_keeps_later_id() {
        let page = StaticPage(Ok(r#"new Listview({data: [
            {"name":"Dup","maxlevel":60,"id":1,"pieces":1},
            {"name":"Dup","maxlevel":60,"id":2,"pieces":1}
        ]});"#
            .to_string()));
        let scraped = scrape_pair(&page, &query(), "1", "Warrior").unwrap();

        assert_eq!(scraped.entries.len(), 1);
        assert_eq!(scraped.collisions.len(), 1);
        assert_eq!(scraped.collisions[0].previous_item_id, 1);
        assert_eq!(scraped.collisions[0].item_id, 2);
    }

    #[test]
    fn test_scrape_pair_without_listview_is_empty() {
        let page = StaticPage(Ok("<html>no sets</html>".to_string()));
        let scraped = scrape_pair(&page, &query(), "1", "Warrior").unwrap();
        assert!(scraped.not_found);
        assert!(scraped.entries.is_empty());
    }

    #[test]
    fn test_pair_error_failure_codes() {
        let status = scrape_pair(&StaticPage(Err(503)), &query(), "1", "Warrior").unwrap_err();
        assert_eq!(status.failure_code(), FailureCode::HttpStatus);

        let parse = scrape_pair(
            &StaticPage(Ok("new Listview({data: [oops]});".to_string())),
            &query(),
            "1",
            "Warrior",
        )
        .unwrap_err();
        assert_eq!(parse.failure_code(), FailureCode::ParseFailed);

        let malformed = scrape_pair(
            &StaticPage(Ok("new Listview({id: 'x'});".to_string())),
            &query(),
            "1",
            "Warrior",
        )
        .unwrap_err();
        assert_eq!(malformed.failure_code(), FailureCode::MalformedData);

        let transport = PairError::from(FetchError::Transport {
            url: "http://example.test".to_string(),
            reason: "timed out".to_string(),
        });
        assert_eq!(transport.failure_code(), FailureCode::FetchFailed);
    }

    #[test]
    fn test_generate_ruleset_with_no_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GearSet.lua");
        let mut descriptor = RulesetDescriptor::legacy();
        descriptor.tiers.clear();

        let report =
            generate_ruleset(&descriptor, &StaticPage(Err(500)), 1, &path).unwrap();
        assert!(report.pairs.is_empty());
        assert_eq!(report.entries_written, 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_names_with_quotes_are_escaped() {
        let page = StaticPage(Ok(
            r#"new Listview({data: [{"name":"The \"Best\" Set","maxlevel":60,"id":1,"pieces":1}]});"#
                .to_string(),
        ));
        let scraped = scrape_pair(&page, &query(), "1", "Warrior").unwrap();
        let line = scraped.entries[0].line();
        assert!(line.contains(&escape_lua_string("The \"Best\" Set")));
    }
}
