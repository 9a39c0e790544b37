pub mod config;
pub mod logging;
pub mod runner;

pub use config::{
    BackendSettings, CheckConfig, Config, ConfigError, LogFormat, LogLevel, TicketingSettings,
};
pub use runner::{RunSummary, Runner};

use crate::backend::{ElasticsearchBackend, LogBackend, NdjsonBackend};
use crate::pipeline::IssuePipeline;
use crate::report::DashboardLink;
use crate::ticketing::{JiraReporter, Reporter, StdoutReporter};
use anyhow::Context;
use std::process::ExitCode;
use tracing::{error, info, warn};

fn backend(config: &Config) -> anyhow::Result<Box<dyn LogBackend>> {
    match config.backend() {
        BackendSettings::File {
            path,
            ignore_period,
        } => {
            info!(path = %path.display(), "Reading entries from file");
            let backend = NdjsonBackend::new(path);
            if ignore_period {
                Ok(Box::new(backend.ignoring_period()))
            } else {
                Ok(Box::new(backend))
            }
        }
        BackendSettings::Elasticsearch(es) => {
            let backend =
                ElasticsearchBackend::new(es).context("Failed to create Elasticsearch client")?;
            info!(url = %backend.search_url(), "Querying Elasticsearch");
            Ok(Box::new(backend))
        }
    }
}

fn reporter(config: &Config) -> anyhow::Result<Box<dyn Reporter>> {
    match config.ticketing() {
        TicketingSettings::Jira(jira) => Ok(Box::new(
            JiraReporter::new(jira).context("Failed to create Jira client")?,
        )),
        TicketingSettings::Stdout { dry_run } => {
            if !dry_run {
                warn!("Jira is not configured, printing reports instead");
            }
            Ok(Box::new(StdoutReporter::new()))
        }
    }
}

/// Run every configured check once.
pub fn run(config: &Config) -> anyhow::Result<RunSummary> {
    let checks = config.checks().context("Failed to load checks")?;
    let backend = backend(config)?;
    let reporter = reporter(config)?;

    let mut pipeline = IssuePipeline::new(backend.as_ref());
    if let Some(dashboard_url) = &config.dashboard_url {
        let dashboard = DashboardLink::new(dashboard_url)
            .with_context(|| format!("Invalid dashboard URL '{dashboard_url}'"))?;
        pipeline = pipeline.with_dashboard(dashboard);
    }

    let runner = Runner::new(pipeline, reporter.as_ref()).with_defaults(config.query_defaults());

    info!(
        checks = checks.len(),
        backend = backend.name(),
        period_secs = config.period_secs,
        limit = config.limit,
        dry_run = config.dry_run,
        "Starting rask-log-reporter v{}",
        crate::VERSION
    );

    Ok(runner.run(&checks))
}

pub fn main() -> ExitCode {
    let config = match Config::load(std::env::args_os()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    if let Err(e) = logging::init_tracing(config.log_level, config.log_format) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match run(&config) {
        Ok(summary) if summary.all_checks_failed() => {
            error!(checks = summary.checks, "Every check failed");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "Run aborted");
            ExitCode::FAILURE
        }
    }
}
