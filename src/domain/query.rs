use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound on entries fetched for one category, bounding memory and backend load.
pub const DEFAULT_LIMIT: usize = 100_000;

/// Default recency window.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(3600);

/// Parameters describing what to fetch for one category.
///
/// Passed by reference through every pipeline stage and never stored by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Free-text match expression, e.g. the `PHP Fatal Error` message prefix.
    /// Categories with a fixed search ignore it.
    pub query: String,
    pub limit: usize,
    #[serde(with = "crate::app::config::serde_helpers::duration_secs")]
    pub period: Duration,
}

impl Default for QueryDescriptor {
    fn default() -> Self {
        Self {
            query: String::new(),
            limit: DEFAULT_LIMIT,
            period: DEFAULT_PERIOD,
        }
    }
}

impl QueryDescriptor {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }
}
