//! Uncaught exceptions logged with `severity: error`.

use super::{Derived, IssueSource, Normalized};
use crate::backend::SearchExpression;
use crate::domain::{LogEntry, QueryDescriptor};
use crate::normalizer::generalize_message;
use crate::origin;
use crate::report::{DashboardQuery, DescriptionBuilder, NOT_AVAILABLE, Report, backtrace_list};

pub const LABEL: &str = "PHPExceptions";

const SEVERITY_QUERY: &str = "severity: \"error\"";

/// `WikiaException` puts the useful text in the exception, not the log line.
const DETAILED_EXCEPTION: &str = "WikiaException";

#[derive(Debug, Clone, Copy, Default)]
pub struct PhpExceptionsSource;

impl PhpExceptionsSource {
    pub fn new() -> Self {
        Self
    }

    fn message<'a>(entry: &'a LogEntry) -> Option<&'a str> {
        let exception = entry.exception();

        exception
            .message()
            .filter(|_| exception.class() == Some(DETAILED_EXCEPTION))
            .or_else(|| entry.message())
    }
}

impl IssueSource for PhpExceptionsSource {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn search(&self, _descriptor: &QueryDescriptor) -> SearchExpression {
        SearchExpression::query_string(SEVERITY_QUERY)
    }

    fn filter(&self, entry: &LogEntry, _descriptor: &QueryDescriptor) -> bool {
        origin::is_main_datacenter(entry.source_host()) && Self::message(entry).is_some()
    }

    fn normalize(&self, entry: &LogEntry) -> Option<Normalized> {
        let message = generalize_message(Self::message(entry)?);
        let class = entry.exception().class().unwrap_or(NOT_AVAILABLE);
        let env = origin::environment_of(entry);

        Some(
            Normalized::new(format!("{env}-{class}-{message}")).with_derived(
                Derived::new()
                    .with("class", class)
                    .with("message", message),
            ),
        )
    }

    fn build_report(&self, entry: &LogEntry, normalized: &Normalized) -> Report {
        let message = normalized.derived.get_or_na("message");
        let summary = match entry.exception().class() {
            Some(class) => format!("[{class}] {message}"),
            None => message.to_string(),
        };

        let raw = Self::message(entry).unwrap_or(NOT_AVAILABLE);
        let trace = entry.exception().trace();
        let full_message = if trace.is_empty() {
            raw.to_string()
        } else {
            format!("{raw}\n\nh5. Backtrace\n{}", backtrace_list(&trace))
        };

        let description = DescriptionBuilder::new(entry)
            .full_message(full_message)
            .build();

        Report::new(summary, description, LABEL)
    }

    fn dashboard_query(&self, entry: &LogEntry, _normalized: &Normalized) -> Option<DashboardQuery> {
        let class = entry.exception().class()?;

        Some(DashboardQuery::new(
            format!("{SEVERITY_QUERY} AND @exception.class: \"{class}\""),
            &["@timestamp", "@source_host", "@message", "@exception.class", "@fields.http_url"],
        ))
    }
}
