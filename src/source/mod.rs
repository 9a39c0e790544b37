//! Issue categories.
//!
//! Every category plugs the same four hooks into the pipeline: what to search
//! for, which entries are in scope, how an entry is fingerprinted and how the
//! report for a group is formatted.

pub mod db_errors;
pub mod db_no_limit;
pub mod phalanx;
pub mod php_assertions;
pub mod php_errors;
pub mod php_exceptions;
pub mod registry;

use crate::backend::SearchExpression;
use crate::domain::{LogEntry, QueryDescriptor};
use crate::report::{DashboardQuery, Report};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use db_errors::DbQueryErrorsSource;
pub use db_no_limit::DbQueryNoLimitSource;
pub use phalanx::PhalanxSource;
pub use php_assertions::PhpAssertionsSource;
pub use php_errors::PhpErrorsSource;
pub use php_exceptions::PhpExceptionsSource;
pub use registry::SourceRegistry;

/// Values computed while fingerprinting and reused when formatting the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Derived(BTreeMap<String, String>);

impl Derived {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value of `key`, `n/a` when it was not derived.
    pub fn get_or_na(&self, key: &str) -> &str {
        self.get(key).unwrap_or(crate::report::NOT_AVAILABLE)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of [`IssueSource::normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub fingerprint: String,
    pub derived: Derived,
}

impl Normalized {
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            derived: Derived::new(),
        }
    }

    #[must_use]
    pub fn with_derived(mut self, derived: Derived) -> Self {
        self.derived = derived;
        self
    }
}

/// One issue category.
pub trait IssueSource: Send + Sync {
    /// Label attached to every report of this category.
    fn label(&self) -> &'static str;

    fn search(&self, descriptor: &QueryDescriptor) -> SearchExpression;

    /// Result cap for one fetch. Categories may lower the descriptor's limit.
    fn limit(&self, descriptor: &QueryDescriptor) -> usize {
        descriptor.limit
    }

    fn filter(&self, entry: &LogEntry, descriptor: &QueryDescriptor) -> bool;

    /// Fingerprint an entry. `None` keeps the entry out of every group.
    fn normalize(&self, entry: &LogEntry) -> Option<Normalized>;

    fn build_report(&self, entry: &LogEntry, normalized: &Normalized) -> Report;

    /// Saved search showing the issue, appended to the report when a
    /// dashboard is configured.
    fn dashboard_query(&self, _entry: &LogEntry, _normalized: &Normalized) -> Option<DashboardQuery> {
        None
    }
}

/// Built-in categories, addressable by their registry name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    PhpErrors,
    PhpExceptions,
    PhpAssertions,
    DbErrors,
    DbNoLimit,
    Phalanx,
}

impl SourceKind {
    pub const ALL: [SourceKind; 6] = [
        SourceKind::PhpErrors,
        SourceKind::PhpExceptions,
        SourceKind::PhpAssertions,
        SourceKind::DbErrors,
        SourceKind::DbNoLimit,
        SourceKind::Phalanx,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::PhpErrors => "php-errors",
            SourceKind::PhpExceptions => "php-exceptions",
            SourceKind::PhpAssertions => "php-assertions",
            SourceKind::DbErrors => "db-errors",
            SourceKind::DbNoLimit => "db-no-limit",
            SourceKind::Phalanx => "phalanx",
        }
    }

    pub fn build(self) -> Arc<dyn IssueSource> {
        match self {
            SourceKind::PhpErrors => Arc::new(PhpErrorsSource::new()),
            SourceKind::PhpExceptions => Arc::new(PhpExceptionsSource::new()),
            SourceKind::PhpAssertions => Arc::new(PhpAssertionsSource::new()),
            SourceKind::DbErrors => Arc::new(DbQueryErrorsSource::new()),
            SourceKind::DbNoLimit => Arc::new(DbQueryNoLimitSource::new()),
            SourceKind::Phalanx => Arc::new(PhalanxSource::new()),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown source: {s}"))
    }
}
