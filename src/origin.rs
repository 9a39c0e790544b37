//! Host name classification.
//!
//! Hosts follow the `<role>-<dc><n>` naming scheme, e.g. `ap-s10` is an
//! application server in the main (`s`) datacenter and `staging-s3` is the
//! preview host.

use crate::domain::{Environment, LogEntry};
use regex::Regex;
use std::sync::LazyLock;

/// Host serving the preview (pre-release) environment.
pub const PREVIEW_HOST: &str = "staging-s3";

static MAIN_DATACENTER_HOST: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(ap|task|cron|liftium|staging)-s")
        .map_err(|e| tracing::warn!(error = %e, "main datacenter host pattern failed to compile"))
        .ok()
});

/// Map a host identifier to its environment bucket. Total: unknown hosts are production.
pub fn classify(host: &str) -> Environment {
    if host == PREVIEW_HOST {
        Environment::Preview
    } else {
        Environment::Production
    }
}

/// Environment of the host an entry came from.
pub fn environment_of(entry: &LogEntry) -> Environment {
    classify(entry.source_host())
}

/// Whether the host belongs to the main datacenter (application, task, cron,
/// ad-serving and staging roles).
pub fn is_main_datacenter(host: &str) -> bool {
    match MAIN_DATACENTER_HOST.as_ref() {
        Some(pattern) => pattern.is_match(host),
        None => false,
    }
}

/// Kibana wildcard covering every host of the same role, `ap-s42` -> `ap-s*`.
pub fn host_role_wildcard(host: Option<&str>) -> String {
    let role = host
        .and_then(|host| host.split('-').next())
        .filter(|role| !role.is_empty())
        .unwrap_or("ap");
    format!("{role}-s*")
}
