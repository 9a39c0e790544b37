use super::{Reporter, TicketError};
use crate::report::Report;
use reqwest::blocking::{Client, ClientBuilder, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

/// Jira rejects longer summaries.
pub const SUMMARY_MAX_CHARS: usize = 255;

#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub url: String,
    pub user: String,
    pub token: String,
    pub project: String,
    pub issue_type: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            user: String::new(),
            token: String::new(),
            project: "ER".to_string(),
            issue_type: "Bug".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: format!("rask-log-reporter/{}", crate::VERSION),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<IssueRef>,
}

#[derive(Debug, Deserialize)]
struct IssueRef {
    key: String,
}

/// Files one issue per report, skipping reports whose `unique_id` is
/// already present in an issue of the project.
#[derive(Debug, Clone)]
pub struct JiraReporter {
    client: Client,
    search_url: Url,
    issue_url: Url,
    config: JiraConfig,
}

/// Cut `summary` to at most [`SUMMARY_MAX_CHARS`] characters.
pub fn truncate_summary(summary: &str) -> String {
    summary.chars().take(SUMMARY_MAX_CHARS).collect()
}

impl JiraReporter {
    pub fn new(config: JiraConfig) -> Result<Self, TicketError> {
        let base: Url = config
            .url
            .parse()
            .map_err(|e| TicketError::InvalidConfiguration(format!("Invalid Jira URL: {e}")))?;

        if config.project.trim().is_empty() {
            return Err(TicketError::InvalidConfiguration(
                "Jira project key must not be empty".to_string(),
            ));
        }

        let search_url = api_url(&base, "search");
        let issue_url = api_url(&base, "issue");

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            search_url,
            issue_url,
            config,
        })
    }

    fn post(&self, url: &Url, body: &Value) -> RequestBuilder {
        self.client
            .post(url.clone())
            .basic_auth(&self.config.user, Some(&self.config.token))
            .json(body)
    }

    fn send(&self, builder: RequestBuilder) -> Result<Value, TicketError> {
        let response = builder.send()?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(TicketError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .map_err(|e| TicketError::UnexpectedResponse(e.to_string()))
    }

    /// Key of an existing issue carrying `unique_id`.
    pub fn find_existing(&self, unique_id: &str) -> Result<Option<String>, TicketError> {
        let body = json!({
            "jql": format!("project = \"{}\" AND description ~ \"{unique_id}\"", self.config.project),
            "maxResults": 1,
            "fields": ["key"]
        });

        let response = self.send(self.post(&self.search_url, &body))?;
        let parsed: SearchResponse = serde_json::from_value(response)
            .map_err(|e| TicketError::UnexpectedResponse(e.to_string()))?;

        Ok(parsed.issues.into_iter().next().map(|issue| issue.key))
    }

    fn issue_body(&self, report: &Report) -> Value {
        let description = format!(
            "{}\n\n*Occurrences*: {}\n*Unique ID*: {}",
            report.description, report.counter, report.unique_id
        );

        json!({
            "fields": {
                "project": { "key": self.config.project },
                "summary": truncate_summary(&report.summary),
                "description": description,
                "issuetype": { "name": self.config.issue_type },
                "labels": [report.label]
            }
        })
    }

    pub fn create(&self, report: &Report) -> Result<String, TicketError> {
        let response = self.send(self.post(&self.issue_url, &self.issue_body(report)))?;

        response
            .get("key")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| TicketError::UnexpectedResponse("created issue has no key".to_string()))
    }
}

fn api_url(base: &Url, resource: &str) -> Url {
    let mut url = base.clone();
    let path = format!("{}/rest/api/2/{resource}", base.path().trim_end_matches('/'));
    url.set_path(&path);
    url
}

impl Reporter for JiraReporter {
    fn report(&self, report: &Report) -> Result<bool, TicketError> {
        if let Some(key) = self.find_existing(&report.unique_id)? {
            tracing::info!(
                key = %key,
                unique_id = %report.unique_id,
                summary = %report.summary,
                "Issue already reported"
            );
            return Ok(false);
        }

        let key = self.create(report)?;
        tracing::info!(
            key = %key,
            label = %report.label,
            counter = report.counter,
            summary = %report.summary,
            "Reported issue"
        );

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter() -> JiraReporter {
        JiraReporter::new(JiraConfig {
            url: "https://jira.example.com/jira/".to_string(),
            user: "bot".to_string(),
            token: "secret".to_string(),
            ..JiraConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_api_urls() {
        let reporter = reporter();
        assert_eq!(
            reporter.search_url.as_str(),
            "https://jira.example.com/jira/rest/api/2/search"
        );
        assert_eq!(
            reporter.issue_url.as_str(),
            "https://jira.example.com/jira/rest/api/2/issue"
        );
    }

    #[test]
    fn test_truncate_summary_respects_char_boundaries() {
        let long = "奔".repeat(300);
        let truncated = truncate_summary(&long);

        assert_eq!(truncated.chars().count(), SUMMARY_MAX_CHARS);
        assert_eq!(truncate_summary("short"), "short");
    }

    #[test]
    fn test_issue_body() {
        let report = Report::new("x".repeat(400), "body", "PHPErrors").with_occurrences(12, "fp");
        let body = reporter().issue_body(&report);

        assert_eq!(body["fields"]["project"]["key"], "ER");
        assert_eq!(body["fields"]["issuetype"]["name"], "Bug");
        assert_eq!(body["fields"]["labels"][0], "PHPErrors");
        assert_eq!(body["fields"]["summary"].as_str().unwrap().len(), 255);
        assert_eq!(
            body["fields"]["description"],
            format!("body\n\n*Occurrences*: 12\n*Unique ID*: {}", report.unique_id)
        );
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            JiraReporter::new(JiraConfig {
                url: "jira".to_string(),
                ..JiraConfig::default()
            }),
            Err(TicketError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            JiraReporter::new(JiraConfig {
                project: " ".to_string(),
                ..JiraConfig::default()
            }),
            Err(TicketError::InvalidConfiguration(_))
        ));
    }
}
