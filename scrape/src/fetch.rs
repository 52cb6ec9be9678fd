//! Page retrieval for `(class id, set id)` pairs.
//!
//! [`PageFetcher`] is the seam between the pipeline and the network.
//! [`HttpFetcher`] issues one GET per call against the ruleset's host;
//! [`DirectoryFetcher`] reads previously saved pages for offline runs.
//! Neither caches or retries: every failure is returned to the caller.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use gearset_config::{HttpConfig, RulesetDescriptor};
use gearset_core::{Ruleset, SetQuery};
use tracing::debug;

/// Typed error for page retrieval.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The host answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Connection, timeout, TLS or body decoding failure.
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// A saved page could not be read.
    #[error("failed to read page '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No host is configured for the query's ruleset.
    #[error("no host configured for ruleset '{0}'")]
    UnknownRuleset(Ruleset),
}

/// Source of listing pages.
pub trait PageFetcher: Send + Sync {
    /// Returns the decoded page text for `query`.
    fn fetch(&self, query: &SetQuery) -> Result<String, FetchError>;

    /// Human-readable location of the page for `query`, used in logs and
    /// reports.
    fn locate(&self, query: &SetQuery) -> Option<String> {
        let _ = query;
        None
    }
}

/// Blocking HTTP fetcher with a browser-like user agent and a whole-request
/// timeout.
pub struct HttpFetcher {
    agent: ureq::Agent,
    rulesets: BTreeMap<Ruleset, RulesetDescriptor>,
}

impl HttpFetcher {
    /// Builds a fetcher serving every ruleset in `rulesets`.
    pub fn new<'a>(
        http: &HttpConfig,
        rulesets: impl IntoIterator<Item = &'a RulesetDescriptor>,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(&http.user_agent)
            .build();
        Self {
            agent,
            rulesets: rulesets
                .into_iter()
                .map(|d| (d.ruleset, d.clone()))
                .collect(),
        }
    }

    fn url_for(&self, query: &SetQuery) -> Result<String, FetchError> {
        self.rulesets
            .get(&query.ruleset)
            .map(|d| d.item_sets_url(query.class_id, query.set_id))
            .ok_or(FetchError::UnknownRuleset(query.ruleset))
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, query: &SetQuery) -> Result<String, FetchError> {
        let url = self.url_for(query)?;
        debug!(%url, "requesting listing page");

        match self.agent.get(&url).call() {
            Ok(response) => response
                .into_string()
                .map_err(|err| FetchError::Transport {
                    url: url.clone(),
                    reason: format!("failed reading response body: {err}"),
                }),
            Err(ureq::Error::Status(status, _)) => Err(FetchError::Status { url, status }),
            Err(ureq::Error::Transport(transport)) => Err(FetchError::Transport {
                url,
                reason: transport.to_string(),
            }),
        }
    }

    fn locate(&self, query: &SetQuery) -> Option<String> {
        self.url_for(query).ok()
    }
}

/// Reads saved pages from a directory.
///
/// Pages are named by [`DirectoryFetcher::page_file_name`], e.g.
/// `legacy-cl1-ta3.html`.
///
/// # Examples
///
/// ```
/// use gearset_core::{Ruleset, SetQuery};
/// use gearset_scrape::fetch::DirectoryFetcher;
///
/// let name = DirectoryFetcher::page_file_name(&SetQuery::new(1, 3, Ruleset::Legacy));
/// assert_eq!(name, "legacy-cl1-ta3.html");
/// ```
pub struct DirectoryFetcher {
    dir: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name a saved page for `query` is expected under.
    pub fn page_file_name(query: &SetQuery) -> String {
        format!(
            "{}-cl{}-ta{}.html",
            query.ruleset, query.class_id, query.set_id
        )
    }

    fn page_path(&self, query: &SetQuery) -> PathBuf {
        self.dir.join(Self::page_file_name(query))
    }
}

impl PageFetcher for DirectoryFetcher {
    fn fetch(&self, query: &SetQuery) -> Result<String, FetchError> {
        let path = self.page_path(query);
        debug!(path = %path.display(), "reading saved listing page");
        fs::read_to_string(&path).map_err(|source| FetchError::Io { path, source })
    }

    fn locate(&self, query: &SetQuery) -> Option<String> {
        Some(self.page_path(query).display().to_string())
    }
}
