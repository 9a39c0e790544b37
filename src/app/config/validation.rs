use super::checks::CheckConfig;
use super::{Config, ConfigError};
use crate::source::SourceRegistry;
use url::Url;

/// Every check must name a category present in `registry`.
pub fn validate_checks(checks: &[CheckConfig], registry: &SourceRegistry) -> Result<(), ConfigError> {
    match checks.iter().find(|check| !registry.contains(&check.source)) {
        Some(check) => Err(ConfigError::UnknownSource {
            name: check.source.clone(),
            known: registry.names().join(", "),
        }),
        None => Ok(()),
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // The Elasticsearch endpoint is unused when reading from a file
        if self.input.is_none() {
            Url::parse(&self.es_endpoint).map_err(|e| {
                ConfigError::InvalidUrl(format!(
                    "Invalid Elasticsearch URL '{}': {}",
                    self.es_endpoint, e
                ))
            })?;

            if self.es_index.trim().is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "Elasticsearch index must not be empty".to_string(),
                ));
            }
        }

        if let Some(dashboard_url) = &self.dashboard_url {
            Url::parse(dashboard_url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid dashboard URL '{dashboard_url}': {e}"))
            })?;
        }

        if self.limit == 0 {
            return Err(ConfigError::InvalidConfig(
                "Query limit must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.period_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Period must be greater than 0".to_string(),
            ));
        }

        // Jira settings come as a set
        let jira = [
            ("jira-url", self.jira_url.is_some()),
            ("jira-user", self.jira_user.is_some()),
            ("jira-token", self.jira_token.is_some()),
        ];
        let supplied = jira.iter().filter(|(_, set)| *set).count();
        if supplied > 0 && supplied < jira.len() {
            let missing: Vec<&str> = jira
                .iter()
                .filter(|(_, set)| !*set)
                .map(|(name, _)| *name)
                .collect();
            return Err(ConfigError::InvalidConfig(format!(
                "Incomplete Jira settings, missing: {}",
                missing.join(", ")
            )));
        }

        if let Some(jira_url) = &self.jira_url {
            Url::parse(jira_url).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid Jira URL '{jira_url}': {e}"))
            })?;
        }

        Ok(())
    }
}
