//! Log search backends.
//!
//! A backend answers one bounded [`FetchRequest`] with raw [`LogEntry`]
//! values. Failures are returned to the caller as they are; nothing here
//! retries.

pub mod elasticsearch;
pub mod ndjson;

use crate::domain::LogEntry;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

pub use elasticsearch::{ElasticsearchBackend, ElasticsearchConfig};
pub use ndjson::NdjsonBackend;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: {status} - {message}")]
    Status { status: u16, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON at {path}:{line}: {source}")]
    Json {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// What to search for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchExpression {
    /// Lucene query string, e.g. `appname: "phalanx" AND -lvl: "INFO"`.
    QueryString(String),
    /// Exact phrase match on one field, e.g. `@exception.class = DBQueryError`.
    Match { field: String, value: String },
}

impl SearchExpression {
    pub fn query_string(query: impl Into<String>) -> Self {
        Self::QueryString(query.into())
    }

    pub fn matching(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Elasticsearch query DSL clause.
    pub fn to_query_dsl(&self) -> Value {
        match self {
            Self::QueryString(query) => json!({
                "query_string": { "query": query, "analyze_wildcard": true }
            }),
            Self::Match { field, value } => json!({
                "match_phrase": { field.as_str(): value }
            }),
        }
    }

    /// Client-side evaluation. Query strings are not interpreted locally and
    /// match everything; the category filter narrows the result.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        match self {
            Self::QueryString(_) => true,
            Self::Match { field, value } => {
                lookup_field(entry, field).and_then(Value::as_str) == Some(value.as_str())
            }
        }
    }
}

/// Resolve a dotted document path (`@exception.class`) against an entry whose
/// top-level keys have lost their `@` prefix.
fn lookup_field<'a>(entry: &'a LogEntry, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let first = first.strip_prefix('@').unwrap_or(first);

    let mut current = entry.get(first)?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current)
}

/// One bounded fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub expression: SearchExpression,
    pub limit: usize,
    /// Only entries newer than `now - period` are returned.
    pub period: Duration,
}

#[cfg_attr(test, automock)]
pub trait LogBackend: Send + Sync {
    /// Fetch at most `request.limit` entries, oldest first.
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<LogEntry>, BackendError>;

    fn name(&self) -> &str;
}
