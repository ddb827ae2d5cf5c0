use chrono::{DateTime, Utc};
use tracing::warn;

use crate::console::ConsoleSink;
use crate::file::DailyFileSink;

/// Owns the console and file sinks for one access logger.
///
/// Write failures are reported through `tracing` and otherwise dropped: emitting an
/// access-log line must never fail the exchange it describes.
#[derive(Debug, Default)]
pub struct SinkManager {
    console: Option<ConsoleSink>,
    file: Option<DailyFileSink>,
}

impl SinkManager {
    pub fn from_parts(console: Option<ConsoleSink>, file: Option<DailyFileSink>) -> Self {
        Self { console, file }
    }

    pub fn console_enabled(&self) -> bool {
        self.console.is_some()
    }

    pub fn file_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn console_sink(&self) -> Option<&ConsoleSink> {
        self.console.as_ref()
    }

    pub fn file_sink(&self) -> Option<&DailyFileSink> {
        self.file.as_ref()
    }

    pub fn write_console(&self, plain_line: &str, styled_line: &str) {
        if let Some(ref console) = self.console {
            if let Err(e) = console.write(plain_line, styled_line) {
                warn!(error = %e, "failed to write access log line to console");
            }
        }
    }

    pub fn write_file(&self, time: &DateTime<Utc>, line: &str) {
        if let Some(ref file) = self.file {
            if let Err(e) = file.write(time, line) {
                warn!(
                    error = %e,
                    folder = %file.folder().display(),
                    "failed to append access log line"
                );
            }
        }
    }

    /// Flush and close the file stream, if one is open.
    pub fn close(&self) {
        if let Some(ref file) = self.file {
            if let Err(e) = file.close() {
                warn!(error = %e, "failed to flush access log file");
            }
        }
    }
}
