use super::{ConfigError, LogFormat, LogLevel, read_file};
use crate::domain::QueryDescriptor;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Elasticsearch endpoint URL
    #[arg(long, env = "ES_ENDPOINT", default_value = "http://localhost:9200")]
    pub es_endpoint: String,

    /// Index pattern to search
    #[arg(long, env = "ES_INDEX", default_value = "logstash-*")]
    pub es_index: String,

    /// Elasticsearch basic auth user
    #[arg(long, env = "ES_USER")]
    pub es_user: Option<String>,

    /// Elasticsearch basic auth password
    #[arg(long, env = "ES_PASSWORD")]
    pub es_password: Option<String>,

    /// Only entries from the last N seconds are considered
    #[arg(long, env = "PERIOD_SECS", default_value = "3600")]
    pub period_secs: u64,

    /// Maximum number of entries fetched per check
    #[arg(long, env = "QUERY_LIMIT", default_value = "100000")]
    pub limit: usize,

    /// HTTP timeout in seconds
    #[arg(long, env = "TIMEOUT_SECS", default_value = "60")]
    pub timeout_secs: u64,

    /// Jira base URL
    #[arg(long, env = "JIRA_URL")]
    pub jira_url: Option<String>,

    /// Jira user
    #[arg(long, env = "JIRA_USER")]
    pub jira_user: Option<String>,

    /// Jira API token or password
    #[arg(long, env = "JIRA_TOKEN")]
    pub jira_token: Option<String>,

    /// Jira project key new issues are filed in
    #[arg(long, env = "JIRA_PROJECT", default_value = "ER")]
    pub jira_project: String,

    /// Jira issue type of new issues
    #[arg(long, env = "JIRA_ISSUE_TYPE", default_value = "Bug")]
    pub jira_issue_type: String,

    /// Kibana base URL; enables "still valid?" links in reports
    #[arg(long, env = "DASHBOARD_URL")]
    pub dashboard_url: Option<String>,

    /// TOML file with [[check]] entries (built-in checks if not provided)
    #[arg(long, env = "CHECKS_FILE")]
    pub checks_file: Option<PathBuf>,

    /// Read entries from an NDJSON file instead of Elasticsearch
    #[arg(long, env = "INPUT_FILE")]
    pub input: Option<PathBuf>,

    /// Keep file entries older than the period (replaying old dumps)
    #[arg(long, env = "IGNORE_PERIOD")]
    pub ignore_period: bool,

    /// Print reports as JSON lines instead of filing them
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log format (text or json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub period: Duration,

    #[serde(skip)]
    #[arg(skip)]
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            es_endpoint: "http://localhost:9200".to_string(),
            es_index: "logstash-*".to_string(),
            es_user: None,
            es_password: None,
            period_secs: 3600,
            limit: 100_000,
            timeout_secs: 60,
            jira_url: None,
            jira_user: None,
            jira_token: None,
            jira_project: "ER".to_string(),
            jira_issue_type: "Bug".to_string(),
            dashboard_url: None,
            checks_file: None,
            input: None,
            ignore_period: false,
            dry_run: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Text,
            config_file: None,
            period: Duration::from_secs(3600),
            timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);
        config.post_process();
        config.validate()?;
        Ok(config)
    }

    /// Parse the command line and environment, layered over the config
    /// file when one is named. A flag or variable that was actually given
    /// wins over the file.
    pub fn load<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Self::command().get_matches_from(args);
        let mut config = Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

        if let Some(path) = config.config_file.clone() {
            let file: Config = toml::from_str(&read_file(&path)?)?;
            config.fill_from(file, &matches);
        }

        config.post_process();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = read_file(path.as_ref())?;
        let mut config: Config = toml::from_str(&content)?;
        config.post_process();
        config.validate()?;
        Ok(config)
    }

    /// Take every value from `file` that was left at its default on the
    /// command line and in the environment.
    fn fill_from(&mut self, file: Config, matches: &ArgMatches) {
        macro_rules! unless_given {
            ($target:ident, $file:ident, $matches:ident; $($field:ident),+ $(,)?) => {
                $(
                    if !given($matches, stringify!($field)) {
                        $target.$field = $file.$field;
                    }
                )+
            };
        }

        let target = self;
        unless_given!(
            target, file, matches;
            es_endpoint,
            es_index,
            es_user,
            es_password,
            period_secs,
            limit,
            timeout_secs,
            jira_url,
            jira_user,
            jira_token,
            jira_project,
            jira_issue_type,
            dashboard_url,
            checks_file,
            input,
            ignore_period,
            dry_run,
            log_level,
            log_format,
        );
    }

    pub fn post_process(&mut self) {
        self.period = Duration::from_secs(self.period_secs);
        self.timeout = Duration::from_secs(self.timeout_secs);
    }

    /// Defaults every check starts from.
    pub fn query_defaults(&self) -> QueryDescriptor {
        QueryDescriptor::default()
            .with_limit(self.limit)
            .with_period(self.period)
    }
}

fn given(matches: &ArgMatches, id: &str) -> bool {
    matches!(
        matches.value_source(id),
        Some(ValueSource::CommandLine | ValueSource::EnvVariable)
    )
}
