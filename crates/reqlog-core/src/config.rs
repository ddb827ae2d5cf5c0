//! Access logger configuration.
//!
//! Can be built in code or loaded from a TOML or JSON file:
//!
//! ```toml
//! consoleItems = ["localTime", "statusCode", "method", "url"]
//! fileItems = ["iso", "statusCode", "method", "url", "ip", "ua", "responseTime"]
//! plainConsoleLog = false
//! sep = " "
//! folder = "logs"
//! forceLog = 10000
//! ```
//!
//! Formatter overrides are closures and can only be registered in code with
//! [`AccessLogConfig::with_formatter`]. An `itemRegistery` table in a file is
//! accepted and ignored with a warning.

use serde::de::IgnoredAny;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqlog_logging::ConsoleTarget;
use tracing::warn;

use crate::error::ConfigError;
use crate::formatter::{Formatter, FormatterRegistry};
use crate::items::Item;

/// Milliseconds before an exchange is finalized by the timeout backstop.
pub const DEFAULT_FORCE_LOG_MS: u64 = 10_000;
/// Plain-line token separator.
pub const DEFAULT_SEP: &str = " ";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccessLogConfig {
    /// Formatter overrides by item name. Code-only, formatters are closures.
    #[serde(skip)]
    pub item_registry: HashMap<String, Formatter>,
    pub console_items: Option<Vec<Item>>,
    pub file_items: Option<Vec<Item>>,
    #[serde(default)]
    pub disable_console_log: bool,
    #[serde(default)]
    pub plain_console_log: bool,
    pub sep: Option<String>,
    /// Folder for the daily file sink; `None` disables it
    pub folder: Option<PathBuf>,
    /// Timeout backstop in milliseconds
    pub force_log: Option<u64>,
    #[serde(default)]
    pub console_target: ConsoleTarget,
    #[serde(default, rename = "itemRegistery")]
    file_registry: Option<IgnoredAny>,
}

impl AccessLogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file. `.json` files are parsed as JSON,
    /// everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Self = if is_json {
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            toml::from_str(&content).map_err(|source| ConfigError::Toml {
                path: path.to_path_buf(),
                source,
            })?
        };

        if config.file_registry.is_some() {
            warn!(
                path = %path.display(),
                "itemRegistery ignored, register formatters with AccessLogConfig::with_formatter"
            );
        }
        Ok(config)
    }

    pub fn with_formatter(mut self, name: impl Into<String>, formatter: Formatter) -> Self {
        self.item_registry.insert(name.into(), formatter);
        self
    }

    pub fn with_console_items<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Item>,
    {
        self.console_items = Some(items.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_file_items<I, T>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Item>,
    {
        self.file_items = Some(items.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_console_disabled(mut self, disabled: bool) -> Self {
        self.disable_console_log = disabled;
        self
    }

    pub fn with_plain_console(mut self, plain: bool) -> Self {
        self.plain_console_log = plain;
        self
    }

    pub fn with_sep(mut self, sep: impl Into<String>) -> Self {
        self.sep = Some(sep.into());
        self
    }

    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn with_force_log(mut self, force_log: Duration) -> Self {
        self.force_log = Some(u64::try_from(force_log.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_console_target(mut self, target: ConsoleTarget) -> Self {
        self.console_target = target;
        self
    }

    /// Separator for plain lines.
    pub fn sep(&self) -> &str {
        self.sep.as_deref().unwrap_or(DEFAULT_SEP)
    }

    /// Timeout backstop.
    pub fn force_log(&self) -> Duration {
        Duration::from_millis(self.force_log.unwrap_or(DEFAULT_FORCE_LOG_MS))
    }

    pub fn registry(&self) -> FormatterRegistry {
        FormatterRegistry::new(self.item_registry.clone())
    }
}
