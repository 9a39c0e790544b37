use super::{BackendError, FetchRequest, LogBackend};
use crate::domain::LogEntry;
use reqwest::blocking::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

/// Elasticsearch caps `from + size` at 10k by default; larger results are paged.
pub const MAX_PAGE_SIZE: usize = 10_000;

#[derive(Debug, Clone)]
pub struct ElasticsearchConfig {
    pub endpoint: String,
    pub index: String,
    pub timeout: Duration,
    pub page_size: usize,
    pub username: Option<String>,
    pub password: Option<String>,
    pub user_agent: String,
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9200".to_string(),
            index: "logstash-*".to_string(),
            timeout: Duration::from_secs(60),
            page_size: MAX_PAGE_SIZE,
            username: None,
            password: None,
            user_agent: format!("rask-log-reporter/{}", crate::VERSION),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: Value,
    #[serde(default)]
    sort: Option<Value>,
}

/// Blocking `_search` client, oldest entries first, paged with `search_after`.
#[derive(Debug, Clone)]
pub struct ElasticsearchBackend {
    client: Client,
    search_url: Url,
    config: ElasticsearchConfig,
}

impl ElasticsearchBackend {
    pub fn new(config: ElasticsearchConfig) -> Result<Self, BackendError> {
        let mut search_url: Url = config.endpoint.parse().map_err(|e| {
            BackendError::InvalidConfiguration(format!("Invalid endpoint URL: {e}"))
        })?;

        let index = config.index.trim_matches('/');
        if index.is_empty() {
            return Err(BackendError::InvalidConfiguration(
                "Index pattern must not be empty".to_string(),
            ));
        }
        if config.page_size == 0 || config.page_size > MAX_PAGE_SIZE {
            return Err(BackendError::InvalidConfiguration(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let path = format!("{}/{}/_search", search_url.path().trim_end_matches('/'), index);
        search_url.set_path(&path);

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        tracing::debug!(url = %search_url, "Elasticsearch backend configured");

        Ok(Self {
            client,
            search_url,
            config,
        })
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    fn search_body(&self, request: &FetchRequest, size: usize, cursor: Option<&Value>) -> Value {
        let mut body = json!({
            "size": size,
            "query": {
                "bool": {
                    "must": [request.expression.to_query_dsl()],
                    "filter": [{
                        "range": {
                            "@timestamp": { "gte": format!("now-{}s", request.period.as_secs()) }
                        }
                    }]
                }
            },
            // _doc orders entries sharing a timestamp
            "sort": [
                { "@timestamp": { "order": "asc" } },
                { "_doc": { "order": "asc" } }
            ]
        });

        if let Some(cursor) = cursor {
            body["search_after"] = cursor.clone();
        }

        body
    }

    fn search_page(&self, body: &Value) -> Result<SearchResponse, BackendError> {
        let mut builder = self.client.post(self.search_url.clone()).json(body);
        if let Some(username) = &self.config.username {
            builder = builder.basic_auth(username, self.config.password.as_ref());
        }

        let response = builder.send()?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<SearchResponse>()
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))
    }
}

impl LogBackend for ElasticsearchBackend {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<LogEntry>, BackendError> {
        let mut entries = Vec::new();
        let mut cursor: Option<Value> = None;
        let mut pages = 0usize;

        while entries.len() < request.limit {
            let size = (request.limit - entries.len()).min(self.config.page_size);
            let body = self.search_body(request, size, cursor.as_ref());
            let page = self.search_page(&body)?;
            pages += 1;

            let returned = page.hits.hits.len();
            let next_cursor = page.hits.hits.last().and_then(|hit| hit.sort.clone());

            entries.extend(
                page.hits
                    .hits
                    .into_iter()
                    .map(|hit| LogEntry::from_document(hit.source)),
            );

            if returned < size {
                break;
            }
            match next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        entries.truncate(request.limit);

        tracing::debug!(
            index = %self.config.index,
            pages = pages,
            entries = entries.len(),
            "Fetched entries from Elasticsearch"
        );

        Ok(entries)
    }

    fn name(&self) -> &str {
        "elasticsearch"
    }
}
