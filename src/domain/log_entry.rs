//! Raw log record as returned by the search backend.
//!
//! Every accessor is defensive: a missing or mistyped field yields `None`
//! (or an empty default), never an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One raw record, an opaque nested mapping from string keys to values.
///
/// Expected (optional) shape:
/// `message`, `source_host`, `context`, `fields`, `timestamp` and
/// `exception: {class, message, trace: [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntry(Map<String, Value>);

/// Borrowed view of the `exception` object of an entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionView<'a> {
    object: Option<&'a Map<String, Value>>,
}

impl LogEntry {
    /// Wrap a JSON value. Anything other than an object becomes an empty entry.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Build an entry from a logstash-style document.
    ///
    /// Top-level keys lose their leading `@` (`@message` becomes `message`),
    /// nested keys are kept as they are.
    pub fn from_document(value: Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };

        let map = map
            .into_iter()
            .map(|(key, value)| match key.strip_prefix('@') {
                Some(stripped) => (stripped.to_string(), value),
                None => (key, value),
            })
            .collect();

        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of a top-level key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.get_str("message")
    }

    /// Host the entry originated from, `""` when absent.
    pub fn source_host(&self) -> &str {
        self.get_str("source_host").unwrap_or_default()
    }

    pub fn context(&self) -> Option<&Map<String, Value>> {
        self.0.get("context").and_then(Value::as_object)
    }

    pub fn fields(&self) -> Option<&Map<String, Value>> {
        self.0.get("fields").and_then(Value::as_object)
    }

    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context()
            .and_then(|context| context.get(key))
            .and_then(Value::as_str)
    }

    /// Integer value from `context`, accepting numeric strings as well.
    pub fn context_i64(&self, key: &str) -> Option<i64> {
        self.context()
            .and_then(|context| context.get(key))
            .and_then(value_as_i64)
    }

    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields()
            .and_then(|fields| fields.get(key))
            .and_then(Value::as_str)
    }

    pub fn exception(&self) -> ExceptionView<'_> {
        ExceptionView {
            object: self.0.get("exception").and_then(Value::as_object),
        }
    }

    /// Event time, when the backend supplied a parseable RFC 3339 timestamp.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.get_str("timestamp")?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Pretty-printed JSON of a top-level key, `{}` when absent.
    pub fn pretty_json(&self, key: &str) -> String {
        let empty = Value::Object(Map::new());
        let value = self.0.get(key).unwrap_or(&empty);
        serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<Value> for LogEntry {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl<'a> ExceptionView<'a> {
    pub fn is_present(&self) -> bool {
        self.object.is_some()
    }

    pub fn class(&self) -> Option<&'a str> {
        self.object?.get("class").and_then(Value::as_str)
    }

    pub fn message(&self) -> Option<&'a str> {
        self.object?.get("message").and_then(Value::as_str)
    }

    /// Stack frames in order. Non-string frames are skipped.
    pub fn trace(&self) -> Vec<&'a str> {
        self.object
            .and_then(|object| object.get("trace"))
            .and_then(Value::as_array)
            .map(|frames| frames.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_fields_degrade_to_defaults() {
        let entry = LogEntry::default();

        assert_eq!(entry.message(), None);
        assert_eq!(entry.source_host(), "");
        assert!(entry.context().is_none());
        assert_eq!(entry.context_i64("errno"), None);
        assert!(!entry.exception().is_present());
        assert!(entry.exception().trace().is_empty());
        assert_eq!(entry.pretty_json("fields"), "{}");
    }

    #[test]
    fn test_mistyped_fields_are_ignored() {
        let entry = LogEntry::from_value(json!({
            "message": 42,
            "context": "not an object",
            "exception": {"class": ["array"], "trace": ["#0 foo()", 7, "#1 bar()"]}
        }));

        assert_eq!(entry.message(), None);
        assert!(entry.context().is_none());
        assert_eq!(entry.exception().class(), None);
        assert_eq!(entry.exception().trace(), vec!["#0 foo()", "#1 bar()"]);
    }

    #[test]
    fn test_non_object_value_becomes_empty_entry() {
        assert_eq!(LogEntry::from_value(json!([1, 2, 3])), LogEntry::default());
        assert_eq!(LogEntry::from_document(json!("text")), LogEntry::default());
    }

    #[test]
    fn test_from_document_strips_top_level_at_prefix() {
        let entry = LogEntry::from_document(json!({
            "@message": "PHP Warning: foo",
            "@source_host": "ap-s10",
            "@context": {"@nested": 1},
            "logger_name": "sendNotify"
        }));

        assert_eq!(entry.message(), Some("PHP Warning: foo"));
        assert_eq!(entry.source_host(), "ap-s10");
        assert_eq!(entry.get_str("logger_name"), Some("sendNotify"));
        assert!(entry.context().unwrap().contains_key("@nested"));
    }

    #[test]
    fn test_context_integer_accepts_strings() {
        let entry = LogEntry::from_value(json!({
            "context": {"errno": "1213", "num_rows": 4500}
        }));

        assert_eq!(entry.context_i64("errno"), Some(1213));
        assert_eq!(entry.context_i64("num_rows"), Some(4500));
    }

    #[test]
    fn test_timestamp_parsing() {
        let entry = LogEntry::from_value(json!({
            "timestamp": "2015-01-08T09:23:00.091+00:00"
        }));
        let ts = entry.timestamp().unwrap();
        assert_eq!(ts.to_rfc3339(), "2015-01-08T09:23:00.091+00:00");

        let broken = LogEntry::from_value(json!({"timestamp": "yesterday"}));
        assert!(broken.timestamp().is_none());
    }
}
