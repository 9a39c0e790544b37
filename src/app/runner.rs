//! Runs the configured checks and hands their reports to a [`Reporter`].

use super::config::CheckConfig;
use crate::domain::QueryDescriptor;
use crate::pipeline::IssuePipeline;
use crate::report::Report;
use crate::source::SourceRegistry;
use crate::ticketing::Reporter;
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub checks: usize,
    pub failed_checks: usize,
    /// Reports produced by the checks.
    pub reports: usize,
    /// Reports the reporter actually filed.
    pub reported: usize,
}

impl RunSummary {
    pub fn all_checks_failed(&self) -> bool {
        self.checks > 0 && self.failed_checks == self.checks
    }
}

pub struct Runner<'a> {
    pipeline: IssuePipeline<'a>,
    registry: SourceRegistry,
    reporter: &'a dyn Reporter,
    defaults: QueryDescriptor,
}

impl<'a> Runner<'a> {
    pub fn new(pipeline: IssuePipeline<'a>, reporter: &'a dyn Reporter) -> Self {
        Self {
            pipeline,
            registry: SourceRegistry::with_defaults(),
            reporter,
            defaults: QueryDescriptor::default(),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: SourceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Limit and period every check starts from.
    #[must_use]
    pub fn with_defaults(mut self, defaults: QueryDescriptor) -> Self {
        self.defaults = defaults;
        self
    }

    fn descriptor(&self, check: &CheckConfig) -> QueryDescriptor {
        QueryDescriptor::new(check.query.clone())
            .with_limit(check.limit.unwrap_or(self.defaults.limit))
            .with_period(self.defaults.period)
    }

    /// Reports of one check. Errors are logged, not propagated.
    fn run_check(&self, check: &CheckConfig) -> Option<Vec<Report>> {
        let Some(source) = self.registry.get(&check.source) else {
            error!(source = %check.source, "No issue source registered");
            return None;
        };

        match self
            .pipeline
            .query(source.as_ref(), &self.descriptor(check), check.threshold)
        {
            Ok(reports) => Some(reports),
            Err(e) => {
                error!(
                    source = %check.source,
                    query = %check.query,
                    error = %e,
                    "Check failed"
                );
                None
            }
        }
    }

    pub fn run(&self, checks: &[CheckConfig]) -> RunSummary {
        let mut summary = RunSummary {
            checks: checks.len(),
            ..RunSummary::default()
        };
        let mut reports = Vec::new();

        for check in checks {
            match self.run_check(check) {
                Some(found) => reports.extend(found),
                None => summary.failed_checks += 1,
            }
        }
        summary.reports = reports.len();

        for report in &reports {
            match self.reporter.report(report) {
                Ok(true) => summary.reported += 1,
                Ok(false) => {}
                Err(e) => warn!(
                    summary = %report.summary,
                    unique_id = %report.unique_id,
                    error = %e,
                    "Failed to report issue"
                ),
            }
        }

        info!(
            checks = summary.checks,
            failed_checks = summary.failed_checks,
            reports = summary.reports,
            reported = summary.reported,
            "Run finished"
        );

        summary
    }
}
