mod log_entry;
mod query;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use log_entry::{ExceptionView, LogEntry};
pub use query::{DEFAULT_LIMIT, DEFAULT_PERIOD, QueryDescriptor};

/// Environment bucket an entry originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    Preview,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Preview => "Preview",
            Environment::Production => "Production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
