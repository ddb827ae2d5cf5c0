use chrono::{DateTime, Utc};

use crate::exchange::{Env, Exchange};
use crate::formatter::Formatter;

/// Plain and styled token sequences for one line. Both always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    pub plain: Vec<String>,
    pub styled: Vec<String>,
}

impl Rendered {
    pub fn len(&self) -> usize {
        self.plain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty()
    }

    /// Plain tokens joined by the configured separator.
    pub fn plain_line(&self, sep: &str) -> String {
        self.plain.join(sep)
    }

    /// Styled tokens, always joined by a single space.
    pub fn styled_line(&self) -> String {
        self.styled.join(" ")
    }
}

/// Run every formatter in order against the same snapshot.
pub fn render(time: &DateTime<Utc>, env: &Env, exchange: &Exchange, items: &[Formatter]) -> Rendered {
    let mut out = Rendered {
        plain: Vec::with_capacity(items.len()),
        styled: Vec::with_capacity(items.len()),
    };
    for formatter in items {
        let token = formatter.format(time, env, exchange);
        out.plain.push(token.plain);
        out.styled.push(token.styled);
    }
    out
}
