use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::Mutex;

/// Standard stream used by the console sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

impl std::str::FromStr for ConsoleTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stdout" => Ok(ConsoleTarget::Stdout),
            "stderr" => Ok(ConsoleTarget::Stderr),
            _ => Err(format!("Unknown console target: {}", s)),
        }
    }
}

/// Console sink. Writes the styled line unless constructed in plain mode.
pub struct ConsoleSink {
    writer: Mutex<Box<dyn Write + Send>>,
    target: Option<ConsoleTarget>,
    plain: bool,
}

impl ConsoleSink {
    pub fn new(target: ConsoleTarget, plain: bool) -> Self {
        let writer: Box<dyn Write + Send> = match target {
            ConsoleTarget::Stdout => Box::new(io::stdout()),
            ConsoleTarget::Stderr => Box::new(io::stderr()),
        };
        Self {
            target: Some(target),
            ..Self::from_writer(writer, plain)
        }
    }

    /// Create a console sink over an arbitrary writer (a pipe, a buffer in tests).
    pub fn from_writer(writer: Box<dyn Write + Send>, plain: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            target: None,
            plain,
        }
    }

    pub fn is_plain(&self) -> bool {
        self.plain
    }

    /// Standard stream behind this sink; `None` for a custom writer.
    pub fn target(&self) -> Option<ConsoleTarget> {
        self.target
    }

    /// Write one line, choosing the plain or styled rendering.
    pub fn write(&self, plain_line: &str, styled_line: &str) -> io::Result<()> {
        let line = if self.plain { plain_line } else { styled_line };
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("console writer lock poisoned"))?;
        writeln!(writer, "{}", line)?;
        writer.flush()
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("target", &self.target)
            .field("plain", &self.plain)
            .finish_non_exhaustive()
    }
}
