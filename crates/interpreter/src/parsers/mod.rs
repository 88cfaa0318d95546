use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::shape::{Interpretation, ResultShape};

pub mod key_value;
pub mod plain;
pub mod progress;
pub mod table;

pub use key_value::KeyValueParser;
pub use plain::PlainTextParser;
pub use progress::ProgressBarParser;
pub use table::TableParser;

static WIDE_GAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}|\t").expect("wide gap regex must compile"));

/// Output parser - one strategy for turning command text into rows.
pub trait OutputParser: Send + Sync {
    /// Shape this parser produces
    fn shape(&self) -> ResultShape;

    /// Parse the output lines. `None` when the strategy does not apply or
    /// yields no rows.
    fn parse(&self, lines: &[&str], columns: &[String]) -> Option<Interpretation>;
}

/// Ordered parser chain - the first non-empty parse wins
pub struct ParserChain {
    parsers: Vec<Box<dyn OutputParser>>,
}

impl ParserChain {
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// KeyValue, Table, ProgressBar, then PlainText as the catch-all.
    pub fn standard() -> Self {
        let mut chain = Self::new();
        chain.register(Box::new(KeyValueParser));
        chain.register(Box::new(TableParser));
        chain.register(Box::new(ProgressBarParser));
        chain.register(Box::new(PlainTextParser));
        chain
    }

    pub fn register(&mut self, parser: Box<dyn OutputParser>) {
        self.parsers.push(parser);
    }

    pub fn for_shape(&self, shape: ResultShape) -> Option<&dyn OutputParser> {
        self.parsers
            .iter()
            .find(|p| p.shape() == shape)
            .map(|p| &**p)
    }

    /// Parse with the hinted strategy, or infer by trying each in order.
    /// Falls back to plain text, and to an empty plain-text result when even
    /// that yields nothing.
    pub fn interpret(
        &self,
        raw: &str,
        hint: Option<ResultShape>,
        columns: &[String],
    ) -> Interpretation {
        let lines: Vec<&str> = raw.lines().collect();

        let parsed = match hint {
            Some(ResultShape::Blocked) => return Interpretation::empty(ResultShape::Blocked),
            Some(shape) => self
                .for_shape(shape)
                .and_then(|parser| parser.parse(&lines, columns)),
            None => self
                .parsers
                .iter()
                .find_map(|parser| parser.parse(&lines, columns)),
        };

        match parsed {
            Some(interpretation) => {
                debug!(
                    "Parsed {} rows as {}",
                    interpretation.rows.len(),
                    interpretation.shape
                );
                interpretation
            }
            None => PlainTextParser
                .parse(&lines, columns)
                .unwrap_or_else(|| Interpretation::empty(ResultShape::PlainText)),
        }
    }
}

impl Default for ParserChain {
    fn default() -> Self {
        Self::standard()
    }
}

static STANDARD_CHAIN: Lazy<ParserChain> = Lazy::new(ParserChain::standard);

/// Interpret raw command output with the standard chain.
pub fn interpret(raw: &str, hint: Option<ResultShape>, columns: &[String]) -> Interpretation {
    STANDARD_CHAIN.interpret(raw, hint, columns)
}

/// Split on runs of two or more whitespace characters, or a tab.
pub(crate) fn split_wide(line: &str) -> Vec<String> {
    WIDE_GAP
        .split(line)
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

pub(crate) fn non_blank<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    lines
        .iter()
        .copied()
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// A line is a header when any of its tokens names an expected column.
pub(crate) fn is_header(line: &str, columns: &[String]) -> bool {
    if columns.is_empty() {
        return false;
    }
    let wide = split_wide(line);
    wide.iter()
        .map(String::as_str)
        .chain(line.split_whitespace())
        .any(|token| columns.iter().any(|col| col.eq_ignore_ascii_case(token)))
}

pub(crate) fn owned_columns(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| c.to_string()).collect()
}
