//! Failed assertions reported through `Wikia\Util\AssertionException`.

use super::{Derived, IssueSource, Normalized};
use crate::backend::SearchExpression;
use crate::domain::{LogEntry, QueryDescriptor};
use crate::normalizer::{Rule, RuleChain, RuleSet};
use crate::origin;
use crate::report::{DashboardQuery, DescriptionBuilder, NOT_AVAILABLE, Report, backtrace_list};
use std::sync::LazyLock;

pub const LABEL: &str = "PHPAssertion";

pub const ASSERTION_CLASS: &str = r"Wikia\Util\AssertionException";

static ASSERTION_RULES: RuleSet = RuleSet::new(
    "php_assertions",
    &[
        // curl_getinfo() dumps appended to timeouts, `: a:26:{s:3:"url";...}`
        Rule::new("serialized_payload", r"(?s): a:[0-9]+:\{.*$", ""),
        Rule::new("api_path", r"API call to /[0-9]+", "API call to /X"),
        Rule::new(
            "missing_attribute",
            r"Attribute \w+ not found for user [0-9]+",
            "Attribute X not found for user N",
        ),
        Rule::new("address", r"[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+:[0-9]+", "N.N.N.N:N"),
        Rule::new("user_attribute", r"/user/[0-9]+/attr/\w+", "/user/N/attr/X"),
        Rule::new("error_id", r"Error ID: \w+", "Error ID: X"),
        Rule::new("duration", r"[0-9]+ milliseconds", "N milliseconds"),
        Rule::new("byte_count", r"[0-9]+ bytes", "N bytes"),
    ],
);

static MESSAGE_CHAIN: LazyLock<RuleChain> =
    LazyLock::new(|| RuleChain::new("php_assertions").then(&ASSERTION_RULES).trimmed());

pub fn normalize_message(message: &str) -> String {
    MESSAGE_CHAIN.apply(message)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PhpAssertionsSource;

impl PhpAssertionsSource {
    pub fn new() -> Self {
        Self
    }
}

impl IssueSource for PhpAssertionsSource {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn search(&self, _descriptor: &QueryDescriptor) -> SearchExpression {
        SearchExpression::matching("@exception.class", ASSERTION_CLASS)
    }

    fn filter(&self, entry: &LogEntry, _descriptor: &QueryDescriptor) -> bool {
        origin::is_main_datacenter(entry.source_host())
    }

    fn normalize(&self, entry: &LogEntry) -> Option<Normalized> {
        let exception = entry.exception();
        let message = normalize_message(exception.message()?);
        let class = exception.class().unwrap_or(NOT_AVAILABLE);
        let env = origin::environment_of(entry);

        Some(
            Normalized::new(format!("{class}-{message}-{env}"))
                .with_derived(Derived::new().with("message", message)),
        )
    }

    fn build_report(&self, entry: &LogEntry, normalized: &Normalized) -> Report {
        let exception = entry.exception();
        let assertion = exception.message().unwrap_or(NOT_AVAILABLE);

        let full_message = format!(
            "h1. {assertion}\n\nh5. Backtrace\n{}",
            backtrace_list(&exception.trace())
        );
        let description = DescriptionBuilder::new(entry)
            .full_message(full_message)
            .without_context()
            .build();

        Report::new(
            format!("[Assertion failed] {}", normalized.derived.get_or_na("message")),
            description,
            LABEL,
        )
    }

    fn dashboard_query(&self, _entry: &LogEntry, _normalized: &Normalized) -> Option<DashboardQuery> {
        Some(DashboardQuery::new(
            format!("@exception.class: \"{}\"", ASSERTION_CLASS.replace('\\', "\\\\")),
            &["@timestamp", "@source_host", "@exception.message", "@fields.http_url"],
        ))
    }
}
