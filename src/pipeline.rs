//! Grouping and threshold engine.
//!
//! One [`IssuePipeline::query`] call is one pass over one category:
//! fetch, filter, fingerprint, aggregate, threshold, report.

use crate::backend::{BackendError, FetchRequest, LogBackend};
use crate::domain::{LogEntry, QueryDescriptor};
use crate::report::{DashboardLink, Report};
use crate::source::{Derived, IssueSource, Normalized};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Fetching entries for {source_label} failed: {error}")]
    Fetch {
        source_label: &'static str,
        #[source]
        error: BackendError,
    },
}

/// All filtered entries sharing one fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub fingerprint: String,
    pub count: u64,
    /// First entry seen with this fingerprint.
    pub representative: LogEntry,
    pub derived: Derived,
}

/// Group entries by fingerprint, keeping first-seen order.
///
/// Entries whose fingerprint is `None` are dropped. Memory is one record per
/// distinct fingerprint plus an index entry for it.
pub fn aggregate<I, F>(entries: I, mut normalize: F) -> Vec<Group>
where
    I: IntoIterator<Item = LogEntry>,
    F: FnMut(&LogEntry) -> Option<Normalized>,
{
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let Some(normalized) = normalize(&entry) else {
            continue;
        };

        match index.get(&normalized.fingerprint) {
            Some(&position) => groups[position].count += 1,
            None => {
                index.insert(normalized.fingerprint.clone(), groups.len());
                groups.push(Group {
                    fingerprint: normalized.fingerprint,
                    count: 1,
                    representative: entry,
                    derived: normalized.derived,
                });
            }
        }
    }

    groups
}

/// Runs categories against one backend.
pub struct IssuePipeline<'a> {
    backend: &'a dyn LogBackend,
    dashboard: Option<DashboardLink>,
}

impl<'a> IssuePipeline<'a> {
    pub fn new(backend: &'a dyn LogBackend) -> Self {
        Self {
            backend,
            dashboard: None,
        }
    }

    /// Append "still valid?" dashboard links to reports of categories that
    /// provide a dashboard query.
    #[must_use]
    pub fn with_dashboard(mut self, dashboard: DashboardLink) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    /// Reports for every group of `source` with at least `threshold`
    /// occurrences, in the order the groups were first seen.
    ///
    /// A backend failure aborts this call only.
    pub fn query(
        &self,
        source: &dyn IssueSource,
        descriptor: &QueryDescriptor,
        threshold: u64,
    ) -> Result<Vec<Report>, PipelineError> {
        let label = source.label();
        let request = FetchRequest {
            expression: source.search(descriptor),
            limit: source.limit(descriptor),
            period: descriptor.period,
        };

        tracing::info!(
            source = label,
            query = %descriptor.query,
            limit = request.limit,
            "Querying backend"
        );

        let entries = self
            .backend
            .fetch(&request)
            .map_err(|error| PipelineError::Fetch {
                source_label: label,
                error,
            })?;
        let fetched = entries.len();

        let filtered: Vec<LogEntry> = entries
            .into_iter()
            .filter(|entry| source.filter(entry, descriptor))
            .collect();

        tracing::info!(
            source = label,
            fetched = fetched,
            filtered = filtered.len(),
            "Got entries after filtering"
        );

        let groups = aggregate(filtered, |entry| source.normalize(entry));
        tracing::debug!(source = label, groups = groups.len(), "Grouped entries");

        let mut reports = Vec::new();

        for group in groups {
            let normalized = Normalized {
                fingerprint: group.fingerprint,
                derived: group.derived,
            };
            let report = source.build_report(&group.representative, &normalized);

            if group.count < threshold {
                tracing::info!(
                    source = label,
                    summary = %report.summary,
                    count = group.count,
                    threshold = threshold,
                    "Skipped group below threshold"
                );
                continue;
            }

            let mut report = report.with_occurrences(group.count, &normalized.fingerprint);

            let dashboard_url = self.dashboard.as_ref().and_then(|dashboard| {
                source
                    .dashboard_query(&group.representative, &normalized)
                    .map(|query| dashboard.url_for(&query, descriptor.period))
            });
            if let Some(url) = dashboard_url {
                report.append_dashboard_link(&url);
            }

            reports.push(report);
        }

        tracing::info!(
            source = label,
            reports = reports.len(),
            threshold = threshold,
            "Returning reports"
        );
        for report in &reports {
            tracing::info!(
                source = label,
                summary = %report.summary,
                counter = report.counter,
                "Report"
            );
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockLogBackend, SearchExpression};
    use crate::report::{DashboardQuery, fingerprint_id};
    use serde_json::json;
    use tracing_test::traced_test;

    const SKIP_ME: &str = "Skip me!";

    /// Groups by message with spaces turned into dashes.
    struct DashSource;

    impl IssueSource for DashSource {
        fn label(&self) -> &'static str {
            "Dash"
        }

        fn search(&self, descriptor: &QueryDescriptor) -> SearchExpression {
            SearchExpression::query_string(descriptor.query.clone())
        }

        fn filter(&self, entry: &LogEntry, _descriptor: &QueryDescriptor) -> bool {
            entry.message().is_some()
        }

        fn normalize(&self, entry: &LogEntry) -> Option<Normalized> {
            let message = entry.message()?;
            if message == SKIP_ME {
                return None;
            }
            Some(Normalized::new(message.replace(' ', "-")))
        }

        fn build_report(&self, entry: &LogEntry, _normalized: &Normalized) -> Report {
            Report::new(
                format!("[Error] {}", entry.message().unwrap_or_default()),
                entry.get("context").map(ToString::to_string).unwrap_or_default(),
                self.label(),
            )
        }

        fn dashboard_query(&self, entry: &LogEntry, _normalized: &Normalized) -> Option<DashboardQuery> {
            entry
                .message()
                .map(|message| DashboardQuery::new(format!("\"{message}\""), &["@message"]))
        }
    }

    fn entries(values: Vec<serde_json::Value>) -> Vec<LogEntry> {
        values.into_iter().map(LogEntry::from_value).collect()
    }

    fn backend_returning(values: Vec<serde_json::Value>) -> MockLogBackend {
        let mut backend = MockLogBackend::new();
        let entries = entries(values);
        backend
            .expect_fetch()
            .returning(move |_| Ok(entries.clone()));
        backend
    }

    fn flow_entries() -> Vec<serde_json::Value> {
        vec![
            json!({"message": "Foo Bar", "context": [123, "foo"]}),
            json!({"message": "test"}),
            json!({"message": "Foo-Bar", "context": [456, "foo"]}),
            json!({"foo": "bar"}),
            json!({"message": SKIP_ME}),
        ]
    }

    #[test]
    fn test_query_flow() {
        let backend = backend_returning(flow_entries());
        let pipeline = IssuePipeline::new(&backend);

        let reports = pipeline
            .query(&DashSource, &QueryDescriptor::new("foo"), 2)
            .unwrap();

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.counter, 2);
        // built from the first entry of the group
        assert_eq!(report.summary, "[Error] Foo Bar");
        assert_eq!(report.description, "[123,\"foo\"]");
        assert_eq!(report.unique_id, fingerprint_id("Foo-Bar"));
        assert_eq!(report.unique_id, "40d4c859274ec7f5e66d09723b2d11be");
    }

    #[test]
    fn test_threshold_boundary() {
        let pipeline_at = |threshold| {
            let backend = backend_returning(flow_entries());
            IssuePipeline::new(&backend)
                .query(&DashSource, &QueryDescriptor::default(), threshold)
                .unwrap()
                .len()
        };

        assert_eq!(pipeline_at(2), 1);
        assert_eq!(pipeline_at(3), 0);
        assert_eq!(pipeline_at(1), 2);
        assert_eq!(pipeline_at(0), 2);
    }

    #[test]
    fn test_reports_in_first_seen_order() {
        let backend = backend_returning(vec![
            json!({"message": "b"}),
            json!({"message": "a"}),
            json!({"message": "b"}),
            json!({"message": "c"}),
        ]);

        let reports = IssuePipeline::new(&backend)
            .query(&DashSource, &QueryDescriptor::default(), 1)
            .unwrap();
        let summaries: Vec<_> = reports.iter().map(|r| r.summary.as_str()).collect();

        assert_eq!(summaries, vec!["[Error] b", "[Error] a", "[Error] c"]);
        assert_eq!(reports[0].counter, 2);
    }

    #[test]
    fn test_fetch_request_uses_source_hooks() {
        let mut backend = MockLogBackend::new();
        backend
            .expect_fetch()
            .withf(|request: &FetchRequest| {
                request.expression == SearchExpression::query_string("PHP Warning")
                    && request.limit == 42
                    && request.period.as_secs() == 600
            })
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let descriptor = QueryDescriptor::new("PHP Warning")
            .with_limit(42)
            .with_period(std::time::Duration::from_secs(600));
        let reports = IssuePipeline::new(&backend)
            .query(&DashSource, &descriptor, 1)
            .unwrap();

        assert!(reports.is_empty());
    }

    #[test]
    fn test_backend_failure_propagates() {
        let mut backend = MockLogBackend::new();
        backend.expect_fetch().returning(|_| {
            Err(BackendError::Status {
                status: 503,
                message: "unavailable".to_string(),
            })
        });

        let result = IssuePipeline::new(&backend).query(&DashSource, &QueryDescriptor::default(), 1);

        match result {
            Err(PipelineError::Fetch { source_label, error }) => {
                assert_eq!(source_label, "Dash");
                assert!(matches!(error, BackendError::Status { status: 503, .. }));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[test]
    fn test_dashboard_link_appended() {
        let backend = backend_returning(vec![json!({"message": "Foo Bar"})]);
        let dashboard = DashboardLink::new("https://kibana.example.com/").unwrap();

        let reports = IssuePipeline::new(&backend)
            .with_dashboard(dashboard)
            .query(&DashSource, &QueryDescriptor::default(), 1)
            .unwrap();

        assert!(reports[0]
            .description
            .contains("*Still valid?* Check [Kibana dashboard|https://kibana.example.com#/discover?"));
    }

    #[test]
    #[traced_test]
    fn test_skipped_groups_are_logged() {
        let backend = backend_returning(flow_entries());

        let reports = IssuePipeline::new(&backend)
            .query(&DashSource, &QueryDescriptor::default(), 2)
            .unwrap();
        assert_eq!(reports.len(), 1);

        assert!(logs_contain("Skipped group below threshold"));
        assert!(logs_contain("[Error] test"));
        assert!(logs_contain("fetched=5"));
        assert!(logs_contain("filtered=4"));
    }

    #[test]
    fn test_aggregate_counts_and_representatives() {
        let groups = aggregate(
            entries(vec![
                json!({"message": "x", "n": 1}),
                json!({"message": "y", "n": 2}),
                json!({"message": "x", "n": 3}),
                json!({"n": 4}),
            ]),
            |entry| entry.message().map(Normalized::new),
        );

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].fingerprint, "x");
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].representative.get("n"), Some(&json!(1)));
        assert_eq!(groups[1].count, 1);
    }

    #[test]
    fn test_environment_partition() {
        use crate::source::PhpErrorsSource;

        let message = "PHP Fatal Error: Call to undefined method in /includes/Foo.php on line 7";
        let backend = backend_returning(vec![
            json!({"message": message, "source_host": "staging-s3"}),
            json!({"message": message, "source_host": "ap-s10"}),
            json!({"message": message, "source_host": "ap-s11"}),
        ]);

        let reports = IssuePipeline::new(&backend)
            .query(&PhpErrorsSource, &QueryDescriptor::new("PHP Fatal Error"), 1)
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].counter, 1);
        assert_eq!(reports[1].counter, 2);
        assert_ne!(reports[0].unique_id, reports[1].unique_id);
    }
}
