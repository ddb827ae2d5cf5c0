use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use reqlog_logging::{ConsoleSink, DailyFileSink, SinkManager};

use crate::config::AccessLogConfig;
use crate::exchange::{Env, Exchange};
use crate::formatter::Formatter;
use crate::items::{resolve_items, select_items, DEFAULT_CONSOLE_ITEMS, DEFAULT_FILE_ITEMS};
use crate::render::{render, Rendered};
use crate::tracker::CompletionTracker;

/// Renders and emits one access-log line per finalized exchange.
///
/// Item lists are resolved once here. Console and file output are rendered
/// separately, each from its own item list.
#[derive(Debug)]
pub struct AccessLogger {
    console_items: Vec<Formatter>,
    file_items: Vec<Formatter>,
    sep: String,
    force_log: Duration,
    sinks: SinkManager,
}

impl AccessLogger {
    /// Build a logger writing to the console target and folder named in `config`.
    pub fn new(config: AccessLogConfig) -> Self {
        let console = (!config.disable_console_log)
            .then(|| ConsoleSink::new(config.console_target, config.plain_console_log));
        let file = config.folder.as_ref().map(DailyFileSink::new);
        let sinks = SinkManager::from_parts(console, file);
        Self::with_sinks(config, sinks)
    }

    /// Build a logger over caller-supplied sinks. Sink-related options in `config`
    /// are ignored.
    pub fn with_sinks(config: AccessLogConfig, sinks: SinkManager) -> Self {
        let registry = config.registry();
        let console = select_items(
            config.console_items.as_deref(),
            config.file_items.as_deref(),
            DEFAULT_CONSOLE_ITEMS,
        );
        let file = select_items(
            config.file_items.as_deref(),
            config.console_items.as_deref(),
            DEFAULT_FILE_ITEMS,
        );

        Self {
            console_items: resolve_items(&registry, &console),
            file_items: resolve_items(&registry, &file),
            sep: config.sep().to_string(),
            force_log: config.force_log(),
            sinks,
        }
    }

    pub fn force_log(&self) -> Duration {
        self.force_log
    }

    pub fn sinks(&self) -> &SinkManager {
        &self.sinks
    }

    /// Arm completion tracking for an exchange. The returned tracker emits the
    /// line when it finalizes.
    pub fn arm(self: &Arc<Self>, exchange: Arc<Exchange>, env: Env) -> CompletionTracker {
        let logger = Arc::clone(self);
        CompletionTracker::arm(self.force_log, move |_trigger| {
            logger.log(&Utc::now(), &env, &exchange);
        })
    }

    pub fn render_console(&self, time: &DateTime<Utc>, env: &Env, exchange: &Exchange) -> Rendered {
        render(time, env, exchange, &self.console_items)
    }

    pub fn render_file(&self, time: &DateTime<Utc>, env: &Env, exchange: &Exchange) -> Rendered {
        render(time, env, exchange, &self.file_items)
    }

    /// Render and write the line for a finalized exchange.
    pub fn log(&self, time: &DateTime<Utc>, env: &Env, exchange: &Exchange) {
        if self.sinks.console_enabled() {
            let line = self.render_console(time, env, exchange);
            self.sinks
                .write_console(&line.plain_line(&self.sep), &line.styled_line());
        }
        if self.sinks.file_enabled() {
            let line = self.render_file(time, env, exchange);
            self.sinks.write_file(time, &line.plain_line(&self.sep));
        }
    }

    /// Flush and close the file stream. Later writes reopen it.
    pub fn close(&self) {
        self.sinks.close();
    }
}
