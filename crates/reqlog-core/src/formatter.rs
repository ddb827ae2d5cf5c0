//! Formatters and the registry that maps item names to them.
//!
//! A [`Formatter`] renders one field of an access-log line into a [`Token`] holding a
//! plain and an ANSI-styled form. Built-in formatters live in an immutable,
//! process-wide map; a [`FormatterRegistry`] layers per-instance overrides on top.

use chrono::{DateTime, Local, Utc};
use colored::{ColoredString, Colorize};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::exchange::{Env, Exchange};
use crate::items::Item;

/// Token produced by a formatter that could not be resolved.
pub const UNKNOWN_TOKEN: &str = "?";
/// Status token used when no response status was produced.
pub const MISSING_STATUS: &str = "---";
/// Token used for absent address and header fields.
pub const MISSING_FIELD: &str = "-";

/// One rendered field in both output representations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub plain: String,
    pub styled: String,
}

impl Token {
    pub fn new(plain: impl Into<String>, styled: impl Into<String>) -> Self {
        Self {
            plain: plain.into(),
            styled: styled.into(),
        }
    }

    fn colored(plain: String, styled: ColoredString) -> Self {
        Self {
            plain,
            styled: styled.to_string(),
        }
    }
}

type FormatFn = dyn Fn(&DateTime<Utc>, &Env, &Exchange) -> Token + Send + Sync;

/// Renders one field from the `(time, env, exchange)` snapshot.
#[derive(Clone)]
pub struct Formatter(Arc<FormatFn>);

impl Formatter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&DateTime<Utc>, &Env, &Exchange) -> Token + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn format(&self, time: &DateTime<Utc>, env: &Env, exchange: &Exchange) -> Token {
        (self.0)(time, env, exchange)
    }

    /// Placeholder used for names that resolve to nothing.
    pub fn unknown() -> Self {
        UNKNOWN.clone()
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Formatter(..)")
    }
}

lazy_static! {
    static ref UNKNOWN: Formatter =
        Formatter::new(|_, _, _| Token::new(UNKNOWN_TOKEN, UNKNOWN_TOKEN));

    static ref DEFAULT_REGISTRY: HashMap<&'static str, Formatter> = {
        let mut m: HashMap<&'static str, Formatter> = HashMap::new();
        m.insert("local", Formatter::new(|t, _, _| time_token(local(t, "%Y-%m-%d %H:%M:%S"))));
        m.insert("localTime", Formatter::new(|t, _, _| time_token(local(t, "%H:%M:%S"))));
        m.insert("localDate", Formatter::new(|t, _, _| time_token(local(t, "%Y-%m-%d"))));
        m.insert("iso", Formatter::new(|t, _, _| {
            time_token(t.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
        }));
        m.insert("isoTime", Formatter::new(|t, _, _| {
            time_token(t.format("%H:%M:%S%.3fZ").to_string())
        }));
        m.insert("isoDate", Formatter::new(|t, _, _| time_token(t.format("%Y-%m-%d").to_string())));
        m.insert("timestamp", Formatter::new(|t, _, _| {
            let ms = t.timestamp_millis().to_string();
            Token::colored(ms.clone(), ms.bright_black())
        }));
        m.insert("responseTime", Formatter::new(response_time));
        m.insert("method", Formatter::new(method));
        m.insert("statusCode", Formatter::new(status_code));
        m.insert("path", Formatter::new(|_, _, ex| white(ex.path.clone())));
        m.insert("url", Formatter::new(|_, _, ex| white(format!("{}{}", ex.host, ex.url))));
        m.insert("host", Formatter::new(|_, _, ex| white(ex.host.clone())));
        m.insert("ip", Formatter::new(|_, _, ex| {
            gray(ex.remote_addr.clone().unwrap_or_else(|| MISSING_FIELD.to_string()))
        }));
        m.insert("ua", Formatter::new(|_, _, ex| {
            gray(match ex.user_agent {
                Some(ref ua) => format!("\"{}\"", ua),
                None => MISSING_FIELD.to_string(),
            })
        }));
        m.insert("referer", Formatter::new(|_, _, ex| {
            gray(ex.referer.clone().unwrap_or_else(|| MISSING_FIELD.to_string()))
        }));
        m.insert("depth", Formatter::new(|_, env, _| {
            let depth = format!("@{}", env.depth);
            Token::colored(depth.clone(), depth.cyan())
        }));
        m
    };
}

fn local(time: &DateTime<Utc>, fmt: &str) -> String {
    time.with_timezone(&Local).format(fmt).to_string()
}

/// Time formats are bracketed and gray.
fn time_token(text: String) -> Token {
    let text = format!("[{}]", text);
    Token::colored(text.clone(), text.bright_black())
}

fn gray(text: String) -> Token {
    Token::colored(text.clone(), text.bright_black())
}

fn white(text: String) -> Token {
    Token::colored(text.clone(), text.white())
}

fn response_time(time: &DateTime<Utc>, _: &Env, ex: &Exchange) -> Token {
    let ms = (*time - ex.start).num_milliseconds().max(0);
    let text = format!("{}ms", ms);
    let styled = match ms {
        0..=99 => text.green(),
        100..=499 => text.yellow(),
        _ => text.red(),
    };
    Token::colored(text, styled)
}

fn method(_: &DateTime<Utc>, _: &Env, ex: &Exchange) -> Token {
    let method = if ex.method.is_empty() {
        "GET".to_string()
    } else {
        ex.method.clone()
    };
    Token::colored(method.clone(), method.magenta())
}

fn status_code(_: &DateTime<Utc>, _: &Env, ex: &Exchange) -> Token {
    match ex.status() {
        None => Token::colored(MISSING_STATUS.to_string(), MISSING_STATUS.white()),
        Some(code) => {
            let text = code.to_string();
            let styled = match code {
                500..=u16::MAX => text.red(),
                400..=499 => text.yellow(),
                300..=399 => text.cyan(),
                _ => text.green(),
            };
            Token::colored(text, styled)
        }
    }
}

/// Names of the built-in formatters.
pub fn builtin_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = DEFAULT_REGISTRY.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Formatter lookup: instance overrides first, then the built-in set, then the
/// `?` placeholder. Read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct FormatterRegistry {
    overrides: HashMap<String, Formatter>,
}

impl FormatterRegistry {
    pub fn new(overrides: HashMap<String, Formatter>) -> Self {
        Self { overrides }
    }

    /// Look a name up without falling back to the placeholder.
    pub fn get(&self, name: &str) -> Option<Formatter> {
        self.overrides
            .get(name)
            .or_else(|| DEFAULT_REGISTRY.get(name))
            .cloned()
    }

    pub fn resolve(&self, item: &Item) -> Formatter {
        match item {
            Item::Named(name) => self.get(name).unwrap_or_else(Formatter::unknown),
            Item::Inline(formatter) => formatter.clone(),
        }
    }
}
