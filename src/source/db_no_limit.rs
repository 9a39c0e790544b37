//! Queries returning far too many rows, usually a missing `LIMIT`.

use super::{Derived, IssueSource, Normalized};
use crate::backend::SearchExpression;
use crate::domain::{LogEntry, QueryDescriptor};
use crate::normalizer::{generalize_sql, method_from_query};
use crate::origin;
use crate::report::{DashboardQuery, DescriptionBuilder, NOT_AVAILABLE, Report, backtrace_list};

pub const LABEL: &str = "DBQueryNoLimit";

pub const ROWS_THRESHOLD: i64 = 2000;

const MESSAGE_PREFIX: &str = "SQL ";

#[derive(Debug, Clone, Copy, Default)]
pub struct DbQueryNoLimitSource;

impl DbQueryNoLimitSource {
    pub fn new() -> Self {
        Self
    }

    fn method(entry: &LogEntry, message: &str) -> String {
        entry
            .context_str("method")
            .map(str::to_string)
            .or_else(|| method_from_query(message))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

impl IssueSource for DbQueryNoLimitSource {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn search(&self, _descriptor: &QueryDescriptor) -> SearchExpression {
        SearchExpression::query_string(format!("@context.num_rows: [{ROWS_THRESHOLD} TO *]"))
    }

    fn filter(&self, entry: &LogEntry, _descriptor: &QueryDescriptor) -> bool {
        if !entry.message().is_some_and(|message| message.starts_with(MESSAGE_PREFIX)) {
            return false;
        }

        if !origin::is_main_datacenter(entry.source_host()) {
            return false;
        }

        entry.context_i64("num_rows").unwrap_or(0) >= ROWS_THRESHOLD
    }

    fn normalize(&self, entry: &LogEntry) -> Option<Normalized> {
        let message = entry.message()?;
        let method = Self::method(entry, message);
        let env = origin::environment_of(entry);

        let query = message.strip_prefix("SQL").unwrap_or(message).trim();
        let rows = entry.context_i64("num_rows").unwrap_or(0);

        let derived = Derived::new()
            .with("method", method.as_str())
            .with("query", query)
            .with("num_rows", rows.to_string());

        Some(
            Normalized::new(format!("{}-{method}-no-limit-{env}", generalize_sql(message)))
                .with_derived(derived),
        )
    }

    fn build_report(&self, entry: &LogEntry, normalized: &Normalized) -> Report {
        let derived = &normalized.derived;
        let method = derived.get_or_na("method");
        let rows: i64 = derived
            .get("num_rows")
            .and_then(|rows| rows.parse().ok())
            .unwrap_or(0);

        let full_message = format!(
            "The database query below returned far too many rows. Please use a proper LIMIT statement.\n\n*Query*: {{noformat}}{query}{{noformat}}\n*Function*: {method}\n*Rows returned*: {rows}\n\nh5. Backtrace\n{backtrace}",
            query = derived.get_or_na("query"),
            backtrace = backtrace_list(&entry.exception().trace()),
        );
        let description = DescriptionBuilder::new(entry)
            .full_message(full_message)
            .build();

        Report::new(
            format!("[{method}] The database query returns {}k+ rows", rows / 1000),
            description,
            LABEL,
        )
    }

    fn dashboard_query(&self, _entry: &LogEntry, normalized: &Normalized) -> Option<DashboardQuery> {
        let method = normalized.derived.get("method")?;

        Some(DashboardQuery::new(
            format!("@context.num_rows: [{ROWS_THRESHOLD} TO *] AND @context.method: \"{method}\""),
            &["@timestamp", "@source_host", "@context.method", "@context.num_rows", "@fields.http_url"],
        ))
    }
}
