//! # reqlog-logging
//!
//! Output sinks for rendered access-log lines.
//!
//! ## Key Types
//!
//! - [`SinkManager`] - Fans a finalized exchange out to the console and file sinks
//! - [`ConsoleSink`] - Writes styled or plain lines to stdout, stderr or any writer
//! - [`DailyFileSink`] - Appends plain lines to `<folder>/<YYYY-MM-DD>.log`, rotating on UTC date change
//! - [`ConsoleTarget`] - Which standard stream the console sink writes to
//!
//! The crate also owns [`init_tracing`], which installs the subscriber used for the
//! crate family's own diagnostics (not for access-log lines).

mod console;
mod file;
mod sink;

pub use console::{ConsoleSink, ConsoleTarget};
pub use file::DailyFileSink;
pub use sink::SinkManager;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize diagnostic tracing for the application.
///
/// `RUST_LOG` takes precedence over `level`. Does nothing if a global subscriber is
/// already installed.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
