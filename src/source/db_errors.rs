//! Failed database queries (`DBQueryError`).

use super::{Derived, IssueSource, Normalized};
use crate::backend::SearchExpression;
use crate::domain::{LogEntry, QueryDescriptor};
use crate::normalizer::generalize_sql;
use crate::normalizer::rules::RELEASE_PATH;
use crate::origin;
use crate::report::{DashboardQuery, DescriptionBuilder, NOT_AVAILABLE, Report, backtrace_list};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

pub const LABEL: &str = "DBQueryErrors";

// MySQL server error codes
pub const ER_PARSE_ERROR: i64 = 1064;
pub const ER_LOCK_WAIT_TIMEOUT: i64 = 1205;
pub const ER_LOCK_DEADLOCK: i64 = 1213;
pub const ER_QUERY_INTERRUPTED: i64 = 1317;
pub const ER_CONNECTION_LOST: i64 = 2013;

/// Semantic MediaWiki and DynamicPageList run long queries that get killed routinely.
static NOISY_CALLERS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(SMW|DPLMain|SMWSQLStore2):")
        .map_err(|e| tracing::warn!(error = %e, "noisy caller pattern failed to compile"))
        .ok()
});

/// Details MediaWiki writes into the exception message:
///
/// ```text
/// A database error has occurred.  Did you forget to run maintenance/update.php after upgrading?
/// Query: SELECT foo FROM bar
/// Function: DPLMain:dynamicPageList
/// Error: 1317 Query execution was interrupted (10.8.38.37)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryErrorContext {
    pub query: Option<String>,
    /// Calling function, release path stripped.
    pub function: String,
    /// `<errno> <err>` from the structured context.
    pub error: String,
}

impl QueryErrorContext {
    pub fn from_entry(entry: &LogEntry) -> Option<Self> {
        let message = entry.exception().message()?.trim();

        let parsed: HashMap<&str, &str> = message
            .lines()
            .skip(1)
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key, value.trim()))
            .collect();

        let function = parsed.get("Function").copied().unwrap_or_default();
        let function = RELEASE_PATH.apply(function).into_owned();

        let errno = errno(entry).map_or_else(|| NOT_AVAILABLE.to_string(), |errno| errno.to_string());
        let err = entry.context_str("err").unwrap_or_default();

        Some(Self {
            query: parsed.get("Query").map(|query| (*query).to_string()),
            function,
            error: format!("{errno} {err}").trim().to_string(),
        })
    }
}

fn errno(entry: &LogEntry) -> Option<i64> {
    entry.context_i64("errno")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DbQueryErrorsSource;

impl DbQueryErrorsSource {
    pub fn new() -> Self {
        Self
    }
}

impl IssueSource for DbQueryErrorsSource {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn search(&self, _descriptor: &QueryDescriptor) -> SearchExpression {
        SearchExpression::matching("@exception.class", "DBQueryError")
    }

    fn filter(&self, entry: &LogEntry, _descriptor: &QueryDescriptor) -> bool {
        if !origin::is_main_datacenter(entry.source_host()) {
            return false;
        }

        let errno = errno(entry);

        // lock contention is tracked elsewhere
        if matches!(errno, Some(ER_LOCK_DEADLOCK | ER_LOCK_WAIT_TIMEOUT)) {
            return false;
        }

        if matches!(errno, Some(ER_QUERY_INTERRUPTED | ER_CONNECTION_LOST)) {
            let function = QueryErrorContext::from_entry(entry)
                .map(|context| context.function)
                .unwrap_or_default();

            if let Some(pattern) = NOISY_CALLERS.as_ref() {
                return !pattern.is_match(&function);
            }
        }

        true
    }

    fn normalize(&self, entry: &LogEntry) -> Option<Normalized> {
        let context = QueryErrorContext::from_entry(entry)?;
        let query = context.query?;
        let errno = errno(entry);
        let normalized_query = generalize_sql(&query);

        // Parse errors are often injection attempts: the query text is
        // attacker-controlled, so group them by caller instead.
        let key = if errno == Some(ER_PARSE_ERROR) {
            context.function.clone()
        } else {
            normalized_query.clone()
        };

        let errno = errno.map_or_else(|| NOT_AVAILABLE.to_string(), |errno| errno.to_string());
        let env = origin::environment_of(entry);

        let derived = Derived::new()
            .with("query", query)
            .with("normalized_query", normalized_query)
            .with("function", context.function)
            .with("error", context.error)
            .with("server", entry.context_str("server").unwrap_or(NOT_AVAILABLE));

        Some(Normalized::new(format!("{key}-{errno}-{env}")).with_derived(derived))
    }

    fn build_report(&self, entry: &LogEntry, normalized: &Normalized) -> Report {
        let derived = &normalized.derived;
        let server = derived.get_or_na("server");
        let function = derived.get_or_na("function");

        let error_no_ip = derived
            .get_or_na("error")
            .replace(&format!("({server})"), "")
            .trim()
            .to_string();

        let full_message = format!(
            "*Query*: {{noformat}}{query}{{noformat}}\n*Function*: {function}\n*DB server*: {server}\n*Error*: {error_no_ip}\n\nh5. Backtrace\n{backtrace}",
            query = derived.get_or_na("query"),
            backtrace = backtrace_list(&entry.exception().trace()),
        );
        let description = DescriptionBuilder::new(entry)
            .full_message(full_message)
            .build();

        Report::new(
            format!(
                "[DB error {error_no_ip}] {function} - {}",
                derived.get_or_na("normalized_query")
            ),
            description,
            LABEL,
        )
    }

    fn dashboard_query(&self, _entry: &LogEntry, normalized: &Normalized) -> Option<DashboardQuery> {
        let function = normalized.derived.get("function")?;

        Some(DashboardQuery::new(
            format!("@exception.class: \"DBQueryError\" AND \"{function}\""),
            &[
                "@timestamp",
                "@source_host",
                "@context.errno",
                "@context.err",
                "@fields.db_name",
                "@fields.http_url",
            ],
        ))
    }
}
