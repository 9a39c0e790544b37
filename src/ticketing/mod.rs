//! Ticketing collaborators.

pub mod jira;
pub mod stdout;

use crate::report::Report;
use thiserror::Error;

#[cfg(test)]
use mockall::automock;

pub use jira::{JiraConfig, JiraReporter};
pub use stdout::StdoutReporter;

#[derive(Error, Debug)]
pub enum TicketError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: {status} - {message}")]
    Status { status: u16, message: String },
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg_attr(test, automock)]
pub trait Reporter: Send + Sync {
    /// File the report. `Ok(false)` when an issue with the same
    /// `unique_id` already exists.
    fn report(&self, report: &Report) -> Result<bool, TicketError>;
}
