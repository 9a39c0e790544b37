//! Run configuration.
//!
//! Values are layered: the TOML file named by `--config-file`, then
//! environment variables, then command-line flags, each layer overriding the
//! previous one. The flat [`Config`] is split into the sections a run needs:
//! where entries come from ([`BackendSettings`]), where reports go
//! ([`TicketingSettings`]) and which checks run ([`checks`]).

pub mod checks;
mod cli;
pub mod serde_helpers;
mod validation;

use crate::backend::ElasticsearchConfig;
use crate::source::SourceRegistry;
use crate::ticketing::JiraConfig;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use checks::{CheckConfig, ChecksFile, default_checks};
pub use cli::Config;
pub use validation::validate_checks;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unknown source '{name}' (registered: {known})")]
    UnknownSource { name: String, known: String },
    #[error("Cannot read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

pub(crate) fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::File {
        path: path.to_path_buf(),
        source,
    })
}

/// Default verbosity when `RUST_LOG` is not set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event, for log shipping
    Json,
}

/// Where log entries are read from.
#[derive(Debug, Clone)]
pub enum BackendSettings {
    Elasticsearch(ElasticsearchConfig),
    /// NDJSON dump given with `--input`.
    File { path: PathBuf, ignore_period: bool },
}

/// Where reports are delivered.
#[derive(Debug, Clone)]
pub enum TicketingSettings {
    Jira(JiraConfig),
    /// JSON lines on stdout. `dry_run` is false when Jira is simply not configured.
    Stdout { dry_run: bool },
}

impl Config {
    pub fn backend(&self) -> BackendSettings {
        match &self.input {
            Some(path) => BackendSettings::File {
                path: path.clone(),
                ignore_period: self.ignore_period,
            },
            None => BackendSettings::Elasticsearch(ElasticsearchConfig {
                endpoint: self.es_endpoint.clone(),
                index: self.es_index.clone(),
                timeout: self.timeout,
                username: self.es_user.clone(),
                password: self.es_password.clone(),
                ..ElasticsearchConfig::default()
            }),
        }
    }

    /// `None` unless URL, user and token are all set.
    pub fn jira(&self) -> Option<JiraConfig> {
        let url = self.jira_url.clone()?;
        let user = self.jira_user.clone()?;
        let token = self.jira_token.clone()?;

        Some(JiraConfig {
            url,
            user,
            token,
            project: self.jira_project.clone(),
            issue_type: self.jira_issue_type.clone(),
            timeout: self.timeout,
            ..JiraConfig::default()
        })
    }

    pub fn ticketing(&self) -> TicketingSettings {
        if self.dry_run {
            return TicketingSettings::Stdout { dry_run: true };
        }

        self.jira()
            .map_or(TicketingSettings::Stdout { dry_run: false }, TicketingSettings::Jira)
    }

    /// Checks to run, each naming a category of `registry`.
    pub fn checks_for(&self, registry: &SourceRegistry) -> Result<Vec<CheckConfig>, ConfigError> {
        let checks = match &self.checks_file {
            Some(path) => ChecksFile::from_file(path)?.checks,
            None => default_checks(),
        };

        validate_checks(&checks, registry)?;
        Ok(checks)
    }

    /// [`Config::checks_for`] against the built-in categories.
    pub fn checks(&self) -> Result<Vec<CheckConfig>, ConfigError> {
        self.checks_for(&SourceRegistry::with_defaults())
    }
}
