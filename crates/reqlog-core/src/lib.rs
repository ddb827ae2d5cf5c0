//! # reqlog-core
//!
//! Access-log rendering and completion tracking.
//!
//! ## Key Types
//!
//! - [`AccessLogger`] - Resolves item lists once and emits one line per finalized exchange
//! - [`Formatter`] / [`FormatterRegistry`] - Named field renderers with per-instance overrides
//! - [`Item`] - A configured formatter reference, by name or inline
//! - [`CompletionTracker`] - Single-fire finalization across completion signals and a timeout
//! - [`AccessLogConfig`] - Construction-time options, from code or a TOML/JSON file
//!
//! ## Built-in items
//!
//! `local`, `localTime`, `localDate`, `iso`, `isoTime`, `isoDate`, `timestamp`,
//! `responseTime`, `method`, `statusCode`, `path`, `url`, `host`, `ip`, `ua`,
//! `referer`, `depth`. Unknown names render as `?`.

mod config;
mod error;
mod exchange;
mod formatter;
mod items;
mod logger;
mod render;
mod tracker;

pub use config::{AccessLogConfig, DEFAULT_FORCE_LOG_MS, DEFAULT_SEP};
pub use error::ConfigError;
pub use exchange::{Env, Exchange};
pub use formatter::{
    builtin_names, Formatter, FormatterRegistry, Token, MISSING_FIELD, MISSING_STATUS,
    UNKNOWN_TOKEN,
};
pub use items::{resolve_items, select_items, Item, DEFAULT_CONSOLE_ITEMS, DEFAULT_FILE_ITEMS};
pub use logger::AccessLogger;
pub use render::{render, Rendered};
pub use tracker::{CompletionTracker, FinalizeHandle, Trigger};

pub use reqlog_logging::ConsoleTarget;
