#![warn(rust_2018_idioms)]
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
#![allow(
    clippy::cast_possible_truncation, // Row counts and limits stay far below u32::MAX
    clippy::cast_sign_loss,           // Counters are never negative
    clippy::missing_errors_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. BackendError in backend module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod backend;
pub mod domain;
pub mod normalizer;
pub mod origin;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod ticketing;

// Re-export main types for easy access
pub use domain::{Environment, LogEntry, QueryDescriptor};
pub use pipeline::{IssuePipeline, PipelineError};
pub use report::Report;
pub use source::{IssueSource, SourceKind, SourceRegistry};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
