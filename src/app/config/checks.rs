//! The list of checks a run executes.
//!
//! ```toml
//! [[check]]
//! source = "php-errors"
//! query = "PHP Fatal Error"
//! threshold = 5
//!
//! [[check]]
//! source = "db-no-limit"
//! threshold = 50
//! limit = 20000
//! ```

use super::ConfigError;
use crate::source::SourceKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One category run with its reporting threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Registry name of the category, e.g. `php-errors`.
    pub source: String,
    /// Message prefix for categories that search by query; ignored by the others.
    #[serde(default)]
    pub query: String,
    pub threshold: u64,
    /// Overrides the global fetch limit for this check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl CheckConfig {
    pub fn new(source: impl Into<String>, query: impl Into<String>, threshold: u64) -> Self {
        Self {
            source: source.into(),
            query: query.into(),
            threshold,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecksFile {
    #[serde(rename = "check", default)]
    pub checks: Vec<CheckConfig>,
}

impl ChecksFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = super::read_file(path.as_ref())?;
        let file: ChecksFile = toml::from_str(&content)?;

        if file.checks.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Checks file defines no [[check]] entries".to_string(),
            ));
        }

        if let Some(check) = file.checks.iter().find(|check| check.limit == Some(0)) {
            return Err(ConfigError::InvalidConfig(format!(
                "Check limit must be greater than 0 ({} '{}')",
                check.source, check.query
            )));
        }

        Ok(file)
    }
}

/// Checks run when no checks file is configured.
pub fn default_checks() -> Vec<CheckConfig> {
    let check = |kind: SourceKind, query: &str, threshold| CheckConfig::new(kind.as_str(), query, threshold);

    vec![
        check(SourceKind::PhpErrors, "PHP Fatal Error", 5),
        check(SourceKind::PhpErrors, "PHP Catchable Fatal", 5),
        check(SourceKind::PhpErrors, "PHP Warning", 50),
        check(SourceKind::PhpErrors, "PHP Strict Standards", 200),
        check(SourceKind::PhpExceptions, "", 50),
        check(SourceKind::DbErrors, "", 20),
        check(SourceKind::DbNoLimit, "", 50),
        check(SourceKind::PhpAssertions, "", 5),
        check(SourceKind::Phalanx, "", 5),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::validate_checks;
    use crate::source::SourceRegistry;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_checks(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_checks() {
        let checks = default_checks();

        assert_eq!(checks.len(), 9);
        assert_eq!(checks[0], CheckConfig::new("php-errors", "PHP Fatal Error", 5));
        assert_eq!(checks[3].threshold, 200);
        assert!(
            SourceKind::ALL
                .iter()
                .all(|kind| checks.iter().any(|check| check.source == kind.as_str()))
        );
        assert!(validate_checks(&checks, &SourceRegistry::with_defaults()).is_ok());
    }

    #[test]
    fn test_load_checks_file() {
        let file = write_checks(
            r#"
[[check]]
source = "php-errors"
query = "PHP Fatal Error"
threshold = 5

[[check]]
source = "db-no-limit"
threshold = 50
limit = 20000
"#,
        );

        let checks = ChecksFile::from_file(file.path()).unwrap().checks;

        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].query, "PHP Fatal Error");
        assert_eq!(checks[1].source, "db-no-limit");
        assert_eq!(checks[1].query, "");
        assert_eq!(checks[1].limit, Some(20_000));
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let file = write_checks("[[check]]\nsource = \"php-notices\"\nthreshold = 1\n");
        let checks = ChecksFile::from_file(file.path()).unwrap().checks;

        match validate_checks(&checks, &SourceRegistry::with_defaults()) {
            Err(ConfigError::UnknownSource { name, known }) => {
                assert_eq!(name, "php-notices");
                assert!(known.contains("php-errors"));
            }
            other => panic!("expected unknown source, got {other:?}"),
        }
    }

    #[test]
    fn test_source_registered_by_name_is_accepted() {
        let mut registry = SourceRegistry::new();
        registry.register_arc("php-timeouts", SourceKind::PhpErrors.build());

        let checks = vec![CheckConfig::new("php-timeouts", "PHP Fatal Error:  Maximum execution time", 1)];
        assert!(validate_checks(&checks, &registry).is_ok());
        assert!(validate_checks(&checks, &SourceRegistry::with_defaults()).is_err());
    }

    #[test]
    fn test_empty_and_zero_limit_are_rejected() {
        let empty = write_checks("");
        assert!(matches!(
            ChecksFile::from_file(empty.path()),
            Err(ConfigError::InvalidConfig(_))
        ));

        let zero = write_checks("[[check]]\nsource = \"phalanx\"\nthreshold = 5\nlimit = 0\n");
        assert!(matches!(
            ChecksFile::from_file(zero.path()),
            Err(ConfigError::InvalidConfig(_))
        ));
    }
}
