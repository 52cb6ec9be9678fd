//! Extraction of item-set listing data embedded in a database page.
//!
//! Listing pages carry their data in a script call of the form
//!
//! ```text
//! new Listview({template: 'itemset', id: 'itemsets', data: [{...}, ...]});
//! ```
//!
//! Extraction runs in four steps:
//!
//! 1. Find `new Listview(` and take its argument list up to the matching
//!    `)`. No call means the page has no data for the pair
//!    ([`ExtractError::NotFound`]).
//! 2. Inside the arguments, find the `data:` key of the options object and
//!    take the array literal up to its matching `]`. A call without one means
//!    the page layout changed ([`ExtractError::MalformedData`]).
//! 3. Parse the array as JSON ([`ExtractError::Parse`]).
//! 4. Read each element as an [`ItemRecord`] ([`ExtractError::Schema`]).
//!
//! Regexes only locate the start of a region. Every region end is found by
//! [`matching_close`], so bracket characters in unrelated script, strings or
//! comments never truncate or extend a capture.

use std::sync::LazyLock;

use gearset_core::ItemRecord;
use regex::Regex;
use tracing::debug;

use crate::scan::{code_depth_at, matching_close};

static LISTVIEW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"new\s+Listview\s*\(").expect("static regex must compile"));

static DATA_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\bdata|"data"|'data')\s*:\s*\["#).expect("static regex must compile")
});

/// Typed error for listing extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The page has no `new Listview(...)` call.
    #[error("page contains no Listview block")]
    NotFound,

    /// A Listview call exists but its data array could not be located.
    #[error("malformed Listview block: {0}")]
    MalformedData(String),

    /// The data array is not valid JSON.
    #[error("listing data is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// An element of the data array lacks a required field.
    #[error("listing record {index} is not an item set: {source}")]
    Schema {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl ExtractError {
    /// `true` for [`ExtractError::NotFound`], the expected outcome for pairs
    /// with no data.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Extracts item records from a listing page.
///
/// # Examples
///
/// ```
/// use gearset_scrape::extract::extract;
///
/// let page = r#"<script>
/// new Listview({template: 'itemset', id: 'itemsets', data: [
///     {"name":"Battlegear of Might","maxlevel":60,"id":209,"pieces":8}
/// ]});
/// </script>"#;
/// let records = extract(page).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].name, "Battlegear of Might");
/// ```
pub fn extract(raw: &str) -> Result<Vec<ItemRecord>, ExtractError> {
    let data = locate_listing_data(raw)?;
    parse_listing_data(data)
}

/// Returns the raw JSON array text of the first Listview call that has one.
pub fn locate_listing_data(raw: &str) -> Result<&str, ExtractError> {
    let mut calls = 0usize;
    let mut last_problem = None;

    for call in LISTVIEW_RE.find_iter(raw) {
        calls += 1;
        let open = call.end() - 1;
        let args = match matching_close(raw, open) {
            Ok(end) => &raw[open + 1..end - 1],
            Err(err) => {
                last_problem = Some(format!("argument list: {err}"));
                continue;
            }
        };

        match data_array(args) {
            Ok(data) => {
                debug!(calls, bytes = data.len(), "located listing data");
                return Ok(data);
            }
            Err(problem) => last_problem = Some(problem),
        }
    }

    match last_problem {
        None if calls == 0 => Err(ExtractError::NotFound),
        problem => Err(ExtractError::MalformedData(
            problem.unwrap_or_else(|| "no data array".to_string()),
        )),
    }
}

/// Finds the `data: [...]` array belonging to the options object in `args`.
fn data_array(args: &str) -> Result<&str, String> {
    let key = DATA_KEY_RE
        .find_iter(args)
        .find(|m| code_depth_at(args, m.start()) == Some(1))
        .ok_or_else(|| "no data array in Listview options".to_string())?;

    let open = key.end() - 1;
    let end = matching_close(args, open).map_err(|err| format!("data array: {err}"))?;
    Ok(&args[open..end])
}

/// Parses a JSON array of listing rows into item records.
pub fn parse_listing_data(data: &str) -> Result<Vec<ItemRecord>, ExtractError> {
    let rows: Vec<serde_json::Value> = serde_json::from_str(data).map_err(ExtractError::Parse)?;
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row).map_err(|source| ExtractError::Schema { index, source })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW_60: &str = r#"{"name":"Plate of the Fallen","maxlevel":60,"id":100,"pieces":8}"#;
    const ROW_70: &str = r#"{"name":"Plate of the Fallen","maxlevel":70,"id":200,"pieces":8}"#;

    fn page(body: &str) -> String {
        format!("<html><body><div id=\"lv\"></div><script>{body}</script></body></html>")
    }

    #[test]
    fn test_extracts_records_in_order() {
        let raw = page(&format!(
            "var g = 1;\nnew Listview({{template: 'itemset', id: 'itemsets',\n data: [{ROW_60},\n{ROW_70}]}});"
        ));
        let records = extract(&raw).unwrap();
        assert_eq!(
            records,
            vec![
                ItemRecord::new("Plate of the Fallen", 60, 100, 8),
                ItemRecord::new("Plate of the Fallen", 70, 200, 8),
            ]
        );
    }

    #[test]
    fn test_missing_listview_is_not_found() {
        let raw = page("var listviews = []; // nothing here");
        let err = extract(&raw).unwrap_err();
        assert!(err.is_not_found(), "{err}");
    }

    #[test]
    fn test_empty_data_array_yields_no_records() {
        let raw = page("new Listview({template: 'itemset', data: []});");
        assert!(extract(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_listview_without_data_is_malformed() {
        let raw = page("new Listview({template: 'itemset', id: 'itemsets'});");
        let err = extract(&raw).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedData(_)), "{err}");
    }

    #[test]
    fn test_unterminated_listview_is_malformed() {
        let raw = format!("new Listview({{template: 'itemset', data: [{ROW_60}");
        let err = extract(&raw).unwrap_err();
        assert!(matches!(err, ExtractError::MalformedData(_)), "{err}");
    }

    #[test]
    fn test_noise_after_array_is_not_captured() {
        let raw = page(&format!(
            "new Listview({{template: 'itemset', data: [{ROW_60}] /* noise [not data] */, extra: [[1], {{x: ']'}}]}});\nvar other = [1, [2]];"
        ));
        let data = locate_listing_data(&raw).unwrap();
        assert_eq!(data, format!("[{ROW_60}]"));
        assert_eq!(extract(&raw).unwrap().len(), 1);
    }

    #[test]
    fn test_parentheses_in_names_do_not_truncate_call() {
        let row = r#"{"name":"Regalia (Heroic) [Elite]","maxlevel":80,"id":900,"pieces":[1,2,3]}"#;
        let raw = page(&format!("new Listview({{data: [{row}], note: ')'}});"));
        let records = extract(&raw).unwrap();
        assert_eq!(records, vec![ItemRecord::new("Regalia (Heroic) [Elite]", 80, 900, 3)]);
    }

    #[test]
    fn test_nested_data_key_is_skipped() {
        let raw = page(&format!(
            "new Listview({{extraCols: [{{data: [1, 2]}}], \"data\": [{ROW_70}]}});"
        ));
        let records = extract(&raw).unwrap();
        assert_eq!(records, vec![ItemRecord::new("Plate of the Fallen", 70, 200, 8)]);
    }

    #[test]
    fn test_later_listview_with_data_is_used() {
        let raw = page(&format!(
            "new Listview({{template: 'comment', id: 'comments'}});\nnew Listview({{template: 'itemset', data: [{ROW_60}]}});"
        ));
        assert_eq!(extract(&raw).unwrap().len(), 1);
    }

    #[test]
    fn test_negative_id_keeps_sibling_records() {
        let raw = page(&format!(
            "new Listview({{data: [{ROW_60}, {{\"name\":\"Unlisted Set\",\"maxlevel\":60,\"id\":-428,\"pieces\":[1,2]}}]}});"
        ));
        let records = extract(&raw).unwrap();
        assert_eq!(
            records,
            vec![
                ItemRecord::new("Plate of the Fallen", 60, 100, 8),
                ItemRecord::new("Unlisted Set", 60, -428, 2),
            ]
        );
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let raw = page("new Listview({data: [{name: 'unquoted keys'}]});");
        let err = extract(&raw).unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)), "{err}");
    }

    #[test]
    fn test_missing_field_is_schema_error_with_index() {
        let raw = page(&format!(
            "new Listview({{data: [{ROW_60}, {{\"name\":\"No Level\",\"id\":5,\"pieces\":2}}]}});"
        ));
        match extract(&raw).unwrap_err() {
            ExtractError::Schema { index, source } => {
                assert_eq!(index, 1);
                assert!(source.to_string().contains("maxlevel"));
            }
            other => panic!("expected schema error, got {other}"),
        }
    }
}
