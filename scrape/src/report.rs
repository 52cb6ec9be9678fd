//! Structured reporting for generation runs.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use gearset_core::Ruleset;
use serde::{Deserialize, Serialize};

/// Structured failure code for a pair that produced no entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    /// The page could not be retrieved (connection, timeout, unreadable file).
    FetchFailed,
    /// The host answered with a non-success status.
    HttpStatus,
    /// A Listview call exists but its data array could not be located.
    MalformedData,
    /// The data array is not valid JSON.
    ParseFailed,
    /// A listing record lacks a required field.
    SchemaMismatch,
}

impl std::fmt::Display for FailureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchFailed => write!(f, "fetch_failed"),
            Self::HttpStatus => write!(f, "http_status"),
            Self::MalformedData => write!(f, "malformed_data"),
            Self::ParseFailed => write!(f, "parse_failed"),
            Self::SchemaMismatch => write!(f, "schema_mismatch"),
        }
    }
}

/// Outcome of one `(tier, class)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairStatus {
    /// Records were extracted and rendered.
    Ok,
    /// The page had no listing; nothing to render.
    Empty,
    /// Fetch or extraction failed; see the failure code.
    Failed,
}

/// Per-pair report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairReport {
    pub tier: String,
    pub class_label: String,
    pub class_id: u32,
    pub set_id: u32,
    /// URL or file the page was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: PairStatus,
    pub records: usize,
    pub entries: usize,
    pub collisions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_code: Option<FailureCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
}

impl PairReport {
    pub fn is_failure(&self) -> bool {
        self.status == PairStatus::Failed
    }
}

/// Per-ruleset report, one per output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesetReport {
    pub ruleset: Ruleset,
    pub output_path: PathBuf,
    pub entries_written: usize,
    /// Lowercase hex SHA-256 of the finished document.
    pub checksum: String,
    pub pairs: Vec<PairReport>,
}

impl RulesetReport {
    pub fn failed_pairs(&self) -> impl Iterator<Item = &PairReport> {
        self.pairs.iter().filter(|pair| pair.is_failure())
    }
}

/// Report for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// RFC 3339 timestamp of report creation.
    pub generated_at: String,
    pub tool_version: String,
    pub rulesets: Vec<RulesetReport>,
}

impl RunReport {
    /// Creates an empty report stamped with the current time.
    pub fn new() -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            rulesets: Vec::new(),
        }
    }

    /// Every failed pair across rulesets, in run order.
    pub fn failures(&self) -> impl Iterator<Item = (Ruleset, &PairReport)> {
        self.rulesets
            .iter()
            .flat_map(|r| r.failed_pairs().map(move |pair| (r.ruleset, pair)))
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn entries_written(&self) -> usize {
        self.rulesets.iter().map(|r| r.entries_written).sum()
    }

    /// Writes the report as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Summarizes failure code distribution across pair reports.
pub fn failure_code_summary<'a>(
    pairs: impl IntoIterator<Item = &'a PairReport>,
) -> Vec<(FailureCode, usize)> {
    let mut counts: BTreeMap<String, (FailureCode, usize)> = BTreeMap::new();
    for pair in pairs {
        if let Some(code) = pair.failure_code {
            counts
                .entry(code.to_string())
                .and_modify(|(_, count)| *count += 1)
                .or_insert((code, 1));
        }
    }
    counts.into_values().collect()
}
