//! Index lifecycle: dated creation with a minimal mapping, listing, deletion.

use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::error::{LoaderError, LoaderResult};
use crate::types::TIMESTAMP_FIELD;

use super::session::ConnectedSession;
use super::transport::{StoreRequest, StoreTransport};

/// Listing request: name, document count and store size of every index.
pub const CAT_INDICES_PATH: &str = "_cat/indices?h=index,docs.count,store.size&format=json";

/// Date token used for indices whose name has no `_YYYYMMDD` suffix.
pub const UNDATED_TOKEN: &str = "00000000";

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static DATE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d{8})$").expect("date suffix pattern is valid"));

/// Lowercase, turn whitespace runs into `_`, and drop everything outside `[a-z0-9_]`.
///
/// Idempotent.
pub fn sanitize_index_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    WHITESPACE
        .replace_all(&lowered, "_")
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
        .collect()
}

/// `sanitize(base) + "_" + YYYYMMDD`.
pub fn dated_index_name(base: &str, date: NaiveDate) -> String {
    format!("{}_{}", sanitize_index_name(base), date.format("%Y%m%d"))
}

/// The trailing `_DDDDDDDD` token of an index name, or [`UNDATED_TOKEN`].
pub fn extract_date_token(index: &str) -> &str {
    DATE_SUFFIX
        .captures(index)
        .and_then(|c| c.get(1))
        .map_or(UNDATED_TOKEN, |m| m.as_str())
}

/// Mapping body sent on index creation.
pub fn default_mapping() -> serde_json::Value {
    json!({
        "mappings": {
            "properties": {
                TIMESTAMP_FIELD: { "type": "date" }
            }
        }
    })
}

/// Names starting with `.` or `log` are system/reserved and never offered.
pub fn is_reserved_index(name: &str) -> bool {
    name.starts_with('.') || name.starts_with("log")
}

/// One row of the index listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub index: String,
    /// `None` when the store does not report a count (e.g. closed indices).
    pub docs_count: Option<u64>,
    /// Human-readable size as reported by the store, e.g. `12.3mb`.
    pub store_size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatIndexRecord {
    index: String,
    #[serde(rename = "docs.count", default)]
    docs_count: Option<serde_json::Value>,
    #[serde(rename = "store.size", default)]
    store_size: Option<String>,
}

// `_cat` renders counts as strings, but accept numbers too.
fn parse_count(raw: &serde_json::Value) -> Option<u64> {
    match raw {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Index operations against a connected store.
pub struct IndexManager<'a, T: ?Sized> {
    transport: &'a T,
    session: &'a ConnectedSession,
}

impl<'a, T: StoreTransport + ?Sized> IndexManager<'a, T> {
    pub fn new(transport: &'a T, session: &'a ConnectedSession) -> Self {
        Self { transport, session }
    }

    /// Create `sanitize(base)_<today>` with [`default_mapping`], using the local date.
    pub fn create_with_mapping(&self, base: &str) -> LoaderResult<String> {
        self.create_with_mapping_on(base, Local::now().date_naive())
    }

    /// Create `sanitize(base)_<date>` with [`default_mapping`] and return its name.
    ///
    /// A non-success response is returned as [`LoaderError::IndexCreation`]; there is no retry.
    pub fn create_with_mapping_on(&self, base: &str, date: NaiveDate) -> LoaderResult<String> {
        if sanitize_index_name(base).is_empty() {
            return Err(LoaderError::InvalidOptions {
                message: format!("index base name '{base}' has no usable characters"),
            });
        }
        let index = dated_index_name(base, date);
        let request = StoreRequest::put_json(index.as_str(), &default_mapping())?;
        let resp = self.transport.send(self.session.session(), &request)?;
        if !resp.is_success() {
            return Err(LoaderError::IndexCreation {
                index,
                status: resp.status,
                body: resp.body,
            });
        }
        tracing::info!(index = %index, "created index with default mapping");
        Ok(index)
    }

    /// Eligible (non-reserved) indices, ascending by their date suffix; undated names first.
    pub fn list(&self) -> LoaderResult<Vec<IndexSummary>> {
        let resp = self
            .transport
            .send(self.session.session(), &StoreRequest::get(CAT_INDICES_PATH))?;
        if !resp.is_success() {
            return Err(LoaderError::IndexListing {
                status: resp.status,
                body: resp.body,
            });
        }

        let records: Vec<CatIndexRecord> = serde_json::from_str(&resp.body)?;
        let mut indices: Vec<IndexSummary> = records
            .into_iter()
            .filter(|r| !is_reserved_index(&r.index))
            .map(|r| IndexSummary {
                docs_count: r.docs_count.as_ref().and_then(parse_count),
                store_size: r.store_size,
                index: r.index,
            })
            .collect();
        indices.sort_by(|a, b| extract_date_token(&a.index).cmp(extract_date_token(&b.index)));
        Ok(indices)
    }

    /// Delete `index`; a non-success response is returned as [`LoaderError::IndexDeletion`].
    pub fn delete(&self, index: &str) -> LoaderResult<()> {
        let resp = self
            .transport
            .send(self.session.session(), &StoreRequest::delete(index))?;
        if !resp.is_success() {
            return Err(LoaderError::IndexDeletion {
                index: index.to_string(),
                status: resp.status,
                body: resp.body,
            });
        }
        tracing::info!(index = %index, "deleted index");
        Ok(())
    }
}
