//! PHP fatals, warnings and notices, grouped by message.

use super::{Derived, IssueSource, Normalized};
use crate::backend::SearchExpression;
use crate::domain::{LogEntry, QueryDescriptor};
use crate::normalizer::rules::{RELEASE_PATH, TEMP_FILES, URLS};
use crate::normalizer::{Rule, RuleChain, RuleSet};
use crate::origin;
use crate::report::{DashboardQuery, DescriptionBuilder, Report};
use regex::Regex;
use std::sync::LazyLock;

pub const LABEL: &str = "PHPErrors";

/// `Exception from line 141 of /includes/wikia/nirvana/WikiaView.class.php:`
static EXCEPTION_PREFIX: RuleSet = RuleSet::new(
    "php_exception_prefix",
    &[Rule::new(
        "exception_prefix",
        r"Exception from line [0-9]+ of [^:]+:",
        "Exception:",
    )],
);

static ERROR_DETAILS: RuleSet = RuleSet::new(
    "php_error_details",
    &[
        Rule::new(
            "xml_tag",
            r"Tag \w+ invalid in Entity, line: [0-9]+",
            "Tag X invalid in Entity, line: N",
        ),
        Rule::new("popen", r"popen\([^)]+\)", "popen(X)"),
        Rule::new("fork", r"Unable to fork \[[^\]]+\]", "Unable to fork [X]"),
    ],
);

static ERROR_COUNTERS: RuleSet = RuleSet::new(
    "php_error_counters",
    &[
        Rule::new("byte_count", r"[0-9]+ bytes", "N bytes"),
        Rule::new("regex_modifier", r"Unknown modifier '\w+'", "Unknown modifier X"),
        Rule::new(
            "regex_offset",
            r"Compilation failed: unmatched parentheses at offset [0-9]+",
            "Compilation failed: unmatched parentheses at offset N",
        ),
    ],
);

// Line numbers are kept: they tell two errors in the same file apart.
static MESSAGE_CHAIN: LazyLock<RuleChain> = LazyLock::new(|| {
    RuleChain::new("php_errors")
        .then(&EXCEPTION_PREFIX)
        .then(&URLS)
        .then(&RELEASE_PATH)
        .then(&ERROR_DETAILS)
        .then(&TEMP_FILES)
        .then(&ERROR_COUNTERS)
        .trimmed()
});

static ON_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"on line [0-9]+")
        .map_err(|e| tracing::warn!(error = %e, "line context pattern failed to compile"))
        .ok()
});

static MESSAGE_LOCATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(.*) in /usr/wikia/slot1/[0-9]+(.*)$")
        .map_err(|e| tracing::warn!(error = %e, "message location pattern failed to compile"))
        .ok()
});

/// Canonical form of a PHP error message.
///
/// `PHP Fatal Error: ... in /usr/wikia/slot1/3006/src/includes/api/ApiParse.php on line 20`
/// becomes `PHP Fatal Error: ... in /includes/api/ApiParse.php on line 20`.
pub fn normalize_message(message: &str) -> String {
    MESSAGE_CHAIN.apply(message)
}

/// Messages starting with the descriptor's query, e.g. `PHP Fatal Error`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhpErrorsSource;

impl PhpErrorsSource {
    pub fn new() -> Self {
        Self
    }
}

impl IssueSource for PhpErrorsSource {
    fn label(&self) -> &'static str {
        LABEL
    }

    fn search(&self, descriptor: &QueryDescriptor) -> SearchExpression {
        SearchExpression::query_string(format!("@message:\"^{}\"", descriptor.query))
    }

    fn filter(&self, entry: &LogEntry, descriptor: &QueryDescriptor) -> bool {
        let Some(message) = entry.message() else {
            return false;
        };

        if !message.starts_with(descriptor.query.as_str()) {
            return false;
        }

        if !origin::is_main_datacenter(entry.source_host()) {
            return false;
        }

        // errors without a clear context are not actionable
        match ON_LINE.as_ref() {
            Some(pattern) => pattern.is_match(message),
            None => true,
        }
    }

    fn normalize(&self, entry: &LogEntry) -> Option<Normalized> {
        let message = normalize_message(entry.message()?);
        let env = origin::environment_of(entry);

        Some(
            Normalized::new(format!("PHP-{message}-{env}"))
                .with_derived(Derived::new().with("message", message)),
        )
    }

    fn build_report(&self, entry: &LogEntry, normalized: &Normalized) -> Report {
        let summary = normalized
            .derived
            .get("message")
            .or_else(|| entry.message())
            .unwrap_or_default();

        Report::new(summary, DescriptionBuilder::new(entry).build(), LABEL)
    }

    fn dashboard_query(&self, entry: &LogEntry, _normalized: &Normalized) -> Option<DashboardQuery> {
        let message = entry.message()?;
        let captures = MESSAGE_LOCATION.as_ref()?.captures(message)?;
        let text = captures.get(1)?.as_str().replace(',', "");
        let file = captures.get(2)?.as_str();

        let host = origin::host_role_wildcard(Some(entry.source_host()).filter(|h| !h.is_empty()));

        Some(DashboardQuery::new(
            format!("@source_host: {host} AND \"{text}\" AND \"{file}\""),
            &["@timestamp", "@message", "@fields.url", "@source_host"],
        ))
    }
}
