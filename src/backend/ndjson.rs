use super::{BackendError, FetchRequest, LogBackend};
use crate::domain::LogEntry;
use chrono::Utc;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Replays newline-delimited JSON documents from a file.
///
/// `Match` expressions and the recency window are applied locally; query
/// strings are not interpreted. Blank lines are skipped, a line that is not
/// valid JSON fails the whole fetch.
#[derive(Debug, Clone)]
pub struct NdjsonBackend {
    path: PathBuf,
    /// Ignore the recency window, useful when replaying old dumps.
    ignore_period: bool,
}

impl NdjsonBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ignore_period: false,
        }
    }

    #[must_use]
    pub fn ignoring_period(mut self) -> Self {
        self.ignore_period = true;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn within_period(&self, entry: &LogEntry, request: &FetchRequest) -> bool {
        if self.ignore_period {
            return true;
        }

        // Entries without a timestamp cannot be placed in time; keep them.
        match entry.timestamp() {
            Some(timestamp) => {
                let age = Utc::now().signed_duration_since(timestamp);
                age.num_seconds() <= i64::try_from(request.period.as_secs()).unwrap_or(i64::MAX)
            }
            None => true,
        }
    }
}

impl LogBackend for NdjsonBackend {
    fn fetch(&self, request: &FetchRequest) -> Result<Vec<LogEntry>, BackendError> {
        let file = File::open(&self.path).map_err(|source| BackendError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut entries = Vec::new();

        for (index, line) in BufReader::new(file).lines().enumerate() {
            if entries.len() >= request.limit {
                break;
            }

            let line = line.map_err(|source| BackendError::Io {
                path: self.path.clone(),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let document: Value =
                serde_json::from_str(&line).map_err(|source| BackendError::Json {
                    path: self.path.clone(),
                    line: index + 1,
                    source,
                })?;
            let entry = LogEntry::from_document(document);

            if request.expression.matches(&entry) && self.within_period(&entry, request) {
                entries.push(entry);
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "Read entries from NDJSON file"
        );

        Ok(entries)
    }

    fn name(&self) -> &str {
        "ndjson"
    }
}
