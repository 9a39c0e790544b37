//! Errors logged by the Phalanx content-filtering service.

use super::{Derived, IssueSource, Normalized};
use crate::backend::SearchExpression;
use crate::domain::{LogEntry, QueryDescriptor};
use crate::normalizer::{Rule, RuleChain, RuleSet};
use crate::origin;
use crate::report::{DashboardQuery, NOT_AVAILABLE, Report};
use std::sync::LazyLock;

pub const LABEL: &str = "Phalanx";

/// Phalanx logs are verbose, a smaller window is enough to spot trends.
pub const LIMIT: usize = 10_000;

/// INFO lines are skipped.
const SEARCH_QUERY: &str = "appname: \"phalanx\" AND -lvl: \"INFO\"";

static PHALANX_RULES: RuleSet = RuleSet::new(
    "phalanx",
    &[
        Rule::new("node_name", r"phalanx-\w[0-9]", "phalanx-*"),
        // dotted or dashed, `10.14.30.130:48933` and `ip-10-14-30-130:48933`
        Rule::new("address", r"[0-9]+[.-][0-9]+[.-][0-9]+[.-][0-9]+:[0-9]+", "x.x.x.x:x"),
        Rule::new("request_id", r"X-Request-Id: [a-z0-9-]+", ""),
    ],
);

static MESSAGE_CHAIN: LazyLock<RuleChain> =
    LazyLock::new(|| RuleChain::new("phalanx").then(&PHALANX_RULES).trimmed());

pub fn normalize_message(message: &str) -> String {
    MESSAGE_CHAIN.apply(message)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhalanxSource;

impl PhalanxSource {
    pub fn new() -> Self {
        Self
    }
}

impl IssueSource for PhalanxSource {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn search(&self, _descriptor: &QueryDescriptor) -> SearchExpression {
        SearchExpression::query_string(SEARCH_QUERY)
    }

    fn limit(&self, descriptor: &QueryDescriptor) -> usize {
        descriptor.limit.min(LIMIT)
    }

    fn filter(&self, _entry: &LogEntry, _descriptor: &QueryDescriptor) -> bool {
        true
    }

    fn normalize(&self, entry: &LogEntry) -> Option<Normalized> {
        let message = normalize_message(entry.message()?);
        let logger = entry.get_str("logger_name").unwrap_or(NOT_AVAILABLE);
        let env = origin::environment_of(entry);

        Some(
            Normalized::new(format!("{LABEL}-{logger}-{message}-{env}"))
                .with_derived(Derived::new().with("logger_name", logger)),
        )
    }

    fn build_report(&self, entry: &LogEntry, _normalized: &Normalized) -> Report {
        let message = entry.message().unwrap_or(NOT_AVAILABLE);
        let logger = entry.get_str("logger_name").unwrap_or(NOT_AVAILABLE);
        let thread = entry.get_str("thread_name").unwrap_or(NOT_AVAILABLE);
        let stack_trace = entry.get_str("stack_trace").unwrap_or(NOT_AVAILABLE).trim();

        let description = format!(
            "h3. {message}\n\n*Logger name*: {{{{{logger}}}}}\n*Thread name*: {{{{{thread}}}}}\n\nh3. Stacktrace\n\n{{code}}\n{stack_trace}\n{{code}}"
        );

        Report::new(format!("[Phalanx] {logger}: {message}"), description, LABEL)
    }

    fn dashboard_query(&self, _entry: &LogEntry, normalized: &Normalized) -> Option<DashboardQuery> {
        let logger = normalized.derived.get_or_na("logger_name");

        Some(DashboardQuery::new(
            format!("{SEARCH_QUERY} AND logger_name: \"{logger}\""),
            &["@timestamp", "@source_host", "logger_name", "lvl", "@message", "stack_trace"],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fingerprint(message: &str, logger: &str) -> String {
        let entry = LogEntry::from_document(json!({"@message": message, "logger_name": logger}));
        PhalanxSource.normalize(&entry).unwrap().fingerprint
    }

    #[test]
    fn test_normalize() {
        assert_eq!(fingerprint("foo", "logger"), "Phalanx-logger-foo-Production");
        assert_eq!(
            fingerprint(
                "Could not notify node phalanx-r4: com.twitter.util.TimeoutException: 10.seconds",
                "sendNotify"
            ),
            "Phalanx-sendNotify-Could not notify node phalanx-*: com.twitter.util.TimeoutException: 10.seconds-Production"
        );
        assert_eq!(
            fingerprint("Request(\"GET /foo\", from /10.14.30.130:48933)", "UnknownRequestPath"),
            "Phalanx-UnknownRequestPath-Request(\"GET /foo\", from /x.x.x.x:x)-Production"
        );
        assert_eq!(
            fingerprint(
                "Request failed X-Request-Id: be0babcc-86da-4b27-bc1f-9025d314f745",
                "Http"
            ),
            "Phalanx-Http-Request failed-Production"
        );
        assert_eq!(
            fingerprint("Connection refused: ip-10-14-30-130:48933", "Http"),
            "Phalanx-Http-Connection refused: ip-x.x.x.x:x-Production"
        );
    }

    #[test]
    fn test_limit_is_capped() {
        assert_eq!(PhalanxSource.limit(&QueryDescriptor::default()), 10_000);
        assert_eq!(PhalanxSource.limit(&QueryDescriptor::default().with_limit(500)), 500);
    }

    #[test]
    fn test_report() {
        let entry = LogEntry::from_document(json!({
            "@message": "Could not notify node phalanx-r4",
            "logger_name": "sendNotify",
            "thread_name": "finagle/netty3-1",
            "stack_trace": "com.twitter.util.TimeoutException\n\tat Foo.bar()\n"
        }));
        let normalized = PhalanxSource.normalize(&entry).unwrap();
        let report = PhalanxSource.build_report(&entry, &normalized);

        assert_eq!(report.summary, "[Phalanx] sendNotify: Could not notify node phalanx-r4");
        assert!(report.description.starts_with("h3. Could not notify node phalanx-r4\n\n*Logger name*: {{sendNotify}}"));
        assert!(report.description.contains("*Thread name*: {{finagle/netty3-1}}"));
        assert!(report.description.ends_with("{code}\ncom.twitter.util.TimeoutException\n\tat Foo.bar()\n{code}"));
    }

    #[test]
    fn test_dashboard_query() {
        let entry = LogEntry::from_document(json!({"@message": "x", "logger_name": "sendNotify"}));
        let normalized = PhalanxSource.normalize(&entry).unwrap();
        let query = PhalanxSource.dashboard_query(&entry, &normalized).unwrap();

        assert_eq!(
            query.query,
            "appname: \"phalanx\" AND -lvl: \"INFO\" AND logger_name: \"sendNotify\""
        );
        assert_eq!(query.columns.len(), 6);
    }
}
