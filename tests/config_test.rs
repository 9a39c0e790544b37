use rask_log_reporter::app::{Config, ConfigError, LogFormat, LogLevel};
use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use std::{env, path::PathBuf};
use tempfile::NamedTempFile;

// Helper function to clean all environment variables before and after tests
fn clean_all_env_vars() {
    let env_vars = [
        "ES_ENDPOINT",
        "ES_INDEX",
        "ES_USER",
        "ES_PASSWORD",
        "PERIOD_SECS",
        "QUERY_LIMIT",
        "TIMEOUT_SECS",
        "JIRA_URL",
        "JIRA_USER",
        "JIRA_TOKEN",
        "JIRA_PROJECT",
        "JIRA_ISSUE_TYPE",
        "DASHBOARD_URL",
        "CHECKS_FILE",
        "INPUT_FILE",
        "IGNORE_PERIOD",
        "DRY_RUN",
        "LOG_LEVEL",
        "LOG_FORMAT",
        "CONFIG_FILE",
    ];

    unsafe {
        for var in &env_vars {
            env::remove_var(var);
        }
    }
}

fn write_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_config_from_args() {
    clean_all_env_vars();

    let config = Config::from_args([
        "rask-log-reporter",
        "--es-endpoint",
        "http://es.internal:9200",
        "--period-secs",
        "900",
        "--limit",
        "5000",
        "--log-level",
        "debug",
        "--log-format",
        "json",
        "--dry-run",
    ])
    .unwrap();

    assert_eq!(config.es_endpoint, "http://es.internal:9200");
    assert_eq!(config.period, Duration::from_secs(900));
    assert_eq!(config.limit, 5000);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.log_format, LogFormat::Json);
    assert!(config.dry_run);
    assert_eq!(config.query_defaults().limit, 5000);
}

#[test]
#[serial]
fn test_config_from_env() {
    clean_all_env_vars();
    unsafe {
        env::set_var("ES_INDEX", "logstash-2015.03.*");
        env::set_var("QUERY_LIMIT", "20000");
        env::set_var("JIRA_URL", "https://jira.example.com");
        env::set_var("JIRA_USER", "bot");
        env::set_var("JIRA_TOKEN", "secret");
        env::set_var("LOG_LEVEL", "warn");
    }

    let config = Config::from_args(["rask-log-reporter"]).unwrap();

    assert_eq!(config.es_index, "logstash-2015.03.*");
    assert_eq!(config.limit, 20_000);
    assert_eq!(config.log_level, LogLevel::Warn);
    let jira = config.jira().unwrap();
    assert_eq!(jira.url, "https://jira.example.com");
    assert_eq!(jira.project, "ER");

    clean_all_env_vars();
}

#[test]
#[serial]
fn test_partial_jira_settings_from_env_rejected() {
    clean_all_env_vars();
    unsafe {
        env::set_var("JIRA_URL", "https://jira.example.com");
    }

    let result = Config::from_args(["rask-log-reporter"]);
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));

    clean_all_env_vars();
}

#[test]
#[serial]
fn test_config_from_file() {
    clean_all_env_vars();

    let file = write_file(
        r#"
es_endpoint = "http://es.internal:9200"
period_secs = 7200
dashboard_url = "https://kibana.example.com"
log_format = "json"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();

    assert_eq!(config.es_endpoint, "http://es.internal:9200");
    assert_eq!(config.period, Duration::from_secs(7200));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.es_index, "logstash-*");
    assert_eq!(config.log_format, LogFormat::Json);
    assert_eq!(
        config.dashboard_url.as_deref(),
        Some("https://kibana.example.com")
    );
}

#[test]
#[serial]
fn test_config_file_named_on_command_line() {
    clean_all_env_vars();

    let file = write_file("limit = 123\n");
    let path = file.path().to_str().unwrap().to_string();

    let config = Config::load(["rask-log-reporter", "--config-file", path.as_str()]).unwrap();

    assert_eq!(config.limit, 123);
}

#[test]
#[serial]
fn test_command_line_overrides_config_file() {
    clean_all_env_vars();

    let file = write_file("limit = 123\nperiod_secs = 7200\nes_index = \"logstash-web-*\"\n");
    let path = file.path().to_str().unwrap().to_string();

    let config = Config::load([
        "rask-log-reporter",
        "--config-file",
        path.as_str(),
        "--limit",
        "5",
    ])
    .unwrap();

    assert_eq!(config.limit, 5);
    assert_eq!(config.period, Duration::from_secs(7200));
    assert_eq!(config.es_index, "logstash-web-*");
}

#[test]
#[serial]
fn test_env_overrides_config_file() {
    clean_all_env_vars();
    unsafe {
        env::set_var("QUERY_LIMIT", "77");
    }

    let file = write_file("limit = 123\ntimeout_secs = 5\n");
    let path = file.path().to_str().unwrap().to_string();

    let config = Config::load(["rask-log-reporter", "--config-file", path.as_str()]).unwrap();

    assert_eq!(config.limit, 77);
    assert_eq!(config.timeout, Duration::from_secs(5));

    clean_all_env_vars();
}

#[test]
#[serial]
fn test_unknown_check_source_rejected() {
    clean_all_env_vars();

    let checks = write_file("[[check]]\nsource = \"php-notices\"\nthreshold = 1\n");
    let config = Config {
        checks_file: Some(checks.path().to_path_buf()),
        ..Config::default()
    };

    assert!(matches!(
        config.checks(),
        Err(ConfigError::UnknownSource { name, .. }) if name == "php-notices"
    ));
}

#[test]
#[serial]
fn test_invalid_config_file() {
    clean_all_env_vars();

    let file = write_file("limit = \"many\"\n");
    assert!(matches!(
        Config::from_file(file.path()),
        Err(ConfigError::ParseError(_))
    ));

    let file = write_file("limit = 0\n");
    assert!(matches!(
        Config::from_file(file.path()),
        Err(ConfigError::InvalidConfig(_))
    ));

    assert!(matches!(
        Config::from_file(PathBuf::from("/nonexistent/rask-log-reporter.toml")),
        Err(ConfigError::File { .. })
    ));
}

#[test]
#[serial]
fn test_checks_file() {
    clean_all_env_vars();

    let checks = write_file(
        r#"
[[check]]
source = "php-assertions"
threshold = 1

[[check]]
source = "php-errors"
query = "PHP Notice"
threshold = 500
"#,
    );

    let config = Config {
        checks_file: Some(checks.path().to_path_buf()),
        ..Config::default()
    };
    let loaded = config.checks().unwrap();

    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[1].query, "PHP Notice");
    assert_eq!(loaded[1].threshold, 500);
}
