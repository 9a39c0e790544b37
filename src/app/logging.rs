use super::config::serde_helpers::env_non_empty;
use super::config::{LogFormat, LogLevel};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `RUST_LOG` when set, else the configured level.
pub fn env_filter(level: LogLevel) -> EnvFilter {
    env_non_empty("RUST_LOG")
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(level.as_filter().into()))
}

/// Initialize the tracing subscriber. Diagnostics go to stderr so stdout
/// stays free for dry-run reports.
pub fn init_tracing(level: LogLevel, format: LogFormat) -> anyhow::Result<()> {
    let filter = env_filter(level);

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .try_init()?,
    }

    Ok(())
}
