use super::{Reporter, TicketError};
use crate::report::Report;
use std::io::{self, Write};
use std::sync::Mutex;

/// Writes every report as one JSON line. Used for dry runs, where nothing
/// is deduplicated and every report counts as filed.
pub struct StdoutReporter {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Default for StdoutReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StdoutReporter {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }
}

impl Reporter for StdoutReporter {
    fn report(&self, report: &Report) -> Result<bool, TicketError> {
        let line = serde_json::to_string(report)
            .map_err(|e| TicketError::UnexpectedResponse(e.to_string()))?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| TicketError::Io(io::Error::other("report writer poisoned")))?;
        writeln!(writer, "{line}")?;
        writer.flush()?;

        Ok(true)
    }
}

impl std::fmt::Debug for StdoutReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdoutReporter").finish_non_exhaustive()
    }
}
