use serde::Deserialize;
use std::fmt;

use crate::formatter::{Formatter, FormatterRegistry};

/// Console items used when neither list is configured.
pub const DEFAULT_CONSOLE_ITEMS: &[&str] = &[
    "localTime",
    "statusCode",
    "method",
    "url",
    "ip",
    "responseTime",
];

/// File items used when neither list is configured.
pub const DEFAULT_FILE_ITEMS: &[&str] = &[
    "iso",
    "statusCode",
    "method",
    "url",
    "ip",
    "ua",
    "responseTime",
];

/// A configured reference to a formatter.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub enum Item {
    /// Looked up in the registry by name
    Named(String),
    /// Used as-is
    Inline(Formatter),
}

impl Item {
    pub fn inline(formatter: Formatter) -> Self {
        Item::Inline(formatter)
    }
}

impl From<String> for Item {
    fn from(name: String) -> Self {
        Item::Named(name)
    }
}

impl From<&str> for Item {
    fn from(name: &str) -> Self {
        Item::Named(name.to_string())
    }
}

impl From<Formatter> for Item {
    fn from(formatter: Formatter) -> Self {
        Item::Inline(formatter)
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Named(name) => write!(f, "Named({:?})", name),
            Item::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

/// Resolve an item list into formatters, once, at configuration time.
pub fn resolve_items(registry: &FormatterRegistry, items: &[Item]) -> Vec<Formatter> {
    items.iter().map(|item| registry.resolve(item)).collect()
}

/// Pick the effective list for one sink.
/// Priority: own list > other sink's list > `defaults`
pub fn select_items(own: Option<&[Item]>, other: Option<&[Item]>, defaults: &[&str]) -> Vec<Item> {
    match own.or(other) {
        Some(items) => items.to_vec(),
        None => defaults.iter().map(|name| Item::from(*name)).collect(),
    }
}
