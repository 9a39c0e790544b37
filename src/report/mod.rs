//! Outgoing issue records.

pub mod dashboard;
pub mod template;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use dashboard::{DashboardLink, DashboardQuery};
pub use template::{DescriptionBuilder, NOT_AVAILABLE, backtrace_list, url_from_entry};

/// One escalated issue, handed to the ticketing side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub summary: String,
    pub description: String,
    pub label: String,
    /// Occurrences in the scanned window.
    pub counter: u64,
    /// Stable across runs for the same fingerprint.
    pub unique_id: String,
}

impl Report {
    pub fn new(
        summary: impl Into<String>,
        description: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            summary: summary.into(),
            description: description.into(),
            label: label.into(),
            counter: 0,
            unique_id: String::new(),
        }
    }

    /// Stamp the occurrence count and the identifier derived from `fingerprint`.
    #[must_use]
    pub fn with_occurrences(mut self, counter: u64, fingerprint: &str) -> Self {
        self.counter = counter;
        self.unique_id = fingerprint_id(fingerprint);
        self
    }

    pub fn append_dashboard_link(&mut self, url: &str) {
        self.description
            .push_str(&format!("\n\n*Still valid?* Check [Kibana dashboard|{url}]"));
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} instances)", self.summary, self.counter)
    }
}

/// Lowercase hex MD5 of the fingerprint.
pub fn fingerprint_id(fingerprint: &str) -> String {
    format!("{:x}", md5::compute(fingerprint.as_bytes()))
}
