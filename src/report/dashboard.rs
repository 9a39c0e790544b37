use std::time::Duration;
use url::Url;
use url::form_urlencoded::byte_serialize;

/// Saved search a category suggests for re-checking an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardQuery {
    pub query: String,
    pub columns: Vec<String>,
}

impl DashboardQuery {
    pub fn new(query: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            query: query.into(),
            columns: columns.iter().map(|column| column.to_string()).collect(),
        }
    }
}

/// Builds Kibana discover links under a configured base URL.
#[derive(Debug, Clone)]
pub struct DashboardLink {
    base: Url,
}

impl DashboardLink {
    pub fn new(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base)?,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Discover view of `query` over the last `period`.
    pub fn url_for(&self, query: &DashboardQuery, period: Duration) -> String {
        let encoded: String = byte_serialize(query.query.as_bytes()).collect();
        let columns = query.columns.join(",");

        format!(
            "{base}#/discover?_g=(time:(from:now-{secs}s,mode:quick,to:now))&_a=(columns:!({columns}),query:(query_string:(analyze_wildcard:!t,query:'{encoded}')))",
            base = self.base.as_str().trim_end_matches('/'),
            secs = period.as_secs(),
        )
    }
}
