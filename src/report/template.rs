//! Jira wiki-markup description bodies.

use crate::domain::LogEntry;
use crate::origin;

pub const NOT_AVAILABLE: &str = "n/a";

/// Request URL the entry was logged for, `http://<fields.server><fields.url>`.
pub fn url_from_entry(entry: &LogEntry) -> Option<String> {
    let server = entry.field_str("server").filter(|server| !server.is_empty())?;
    let url = entry.field_str("url").filter(|url| !url.is_empty())?;
    Some(format!("http://{server}{url}"))
}

/// Bulleted stack frames, `n/a` for an empty trace.
pub fn backtrace_list(frames: &[&str]) -> String {
    if frames.is_empty() {
        return format!("* {NOT_AVAILABLE}");
    }

    frames
        .iter()
        .map(|frame| format!("* {frame}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shared report body: the message, request URL, environment and a code
/// block with the raw host, context and fields.
#[derive(Debug, Clone)]
pub struct DescriptionBuilder<'a> {
    entry: &'a LogEntry,
    full_message: String,
    include_context: bool,
}

impl<'a> DescriptionBuilder<'a> {
    pub fn new(entry: &'a LogEntry) -> Self {
        Self {
            entry,
            full_message: entry.message().unwrap_or_default().to_string(),
            include_context: true,
        }
    }

    /// Replace the default heading (the raw message).
    #[must_use]
    pub fn full_message(mut self, message: impl Into<String>) -> Self {
        self.full_message = message.into();
        self
    }

    #[must_use]
    pub fn without_context(mut self) -> Self {
        self.include_context = false;
        self
    }

    pub fn build(&self) -> String {
        let url = url_from_entry(self.entry).unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let source_host = match self.entry.source_host() {
            "" => NOT_AVAILABLE,
            host => host,
        };

        let mut code = format!("@source_host = {source_host}\n\n");
        if self.include_context {
            code.push_str(&format!("@context = {}\n\n", self.entry.pretty_json("context")));
        }
        code.push_str(&format!("@fields = {}", self.entry.pretty_json("fields")));

        format!(
            "{message}\n\n*URL*: {url}\n*Env*: {env}\n\n{{code}}\n{code}\n{{code}}",
            message = self.full_message,
            env = origin::environment_of(self.entry),
        )
        .trim()
        .to_string()
    }
}
