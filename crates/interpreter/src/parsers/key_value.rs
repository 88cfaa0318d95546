use once_cell::sync::Lazy;
use regex::Regex;

use super::{is_header, non_blank, owned_columns, OutputParser};
use crate::shape::{Interpretation, ResultShape};

static ASSIGNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=").expect("assignment regex must compile"));

const DEFAULT_COLUMNS: &[&str] = &["KEY", "VALUE"];

/// `KEY=VALUE` listings such as `env` or `printenv`.
pub struct KeyValueParser;

impl KeyValueParser {
    fn split_pair(line: &str) -> Option<Vec<String>> {
        let trimmed = line.trim();
        // Annotation lines like "[... more variables omitted]".
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            return None;
        }
        // Only the first '=' separates; values such as PATH keep theirs.
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(vec![key.to_string(), value.to_string()])
    }
}

impl OutputParser for KeyValueParser {
    fn shape(&self) -> ResultShape {
        ResultShape::KeyValue
    }

    fn parse(&self, lines: &[&str], columns: &[String]) -> Option<Interpretation> {
        let inferred = columns.is_empty();
        let columns = match columns.len() {
            0 => owned_columns(DEFAULT_COLUMNS),
            2 => columns.to_vec(),
            _ => return None,
        };

        let lines = non_blank(lines);
        let start = match lines.first() {
            Some(first) if is_header(first, &columns) && !first.contains('=') => 1,
            _ => 0,
        };
        let data = &lines[start..];

        let first = data.first()?;
        let applies = if inferred {
            ASSIGNMENT.is_match(first.trim_start())
        } else {
            first.contains('=')
        };
        if !applies {
            return None;
        }

        let rows: Vec<Vec<String>> = data.iter().filter_map(|line| Self::split_pair(line)).collect();
        if rows.is_empty() {
            return None;
        }

        Some(Interpretation {
            shape: ResultShape::KeyValue,
            columns,
            rows,
        })
    }
}
