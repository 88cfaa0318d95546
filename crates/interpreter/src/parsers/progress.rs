use once_cell::sync::Lazy;
use regex::Regex;

use super::{non_blank, owned_columns, OutputParser};
use crate::shape::{Interpretation, ResultShape};

static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)%").expect("percent regex must compile"));
static BARE_PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+%$").expect("bare percent regex must compile"));

const COLUMNS: &[&str] = &["LABEL", "PERCENT", "DETAIL"];

/// Percentage-bearing lines, e.g. `df -h` use ratios.
pub struct ProgressBarParser;

impl ProgressBarParser {
    fn percent_of(line: &str) -> Option<u32> {
        PERCENT
            .captures(line)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// First token plus mount point style last token.
    fn label_of(line: &str) -> String {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.as_slice() {
            [first, .., last] if BARE_PERCENT.is_match(last) => first.to_string(),
            [first, .., last] => format!("{} → {}", first, last),
            _ => line.trim().to_string(),
        }
    }
}

impl OutputParser for ProgressBarParser {
    fn shape(&self) -> ResultShape {
        ResultShape::ProgressBar
    }

    fn parse(&self, lines: &[&str], _columns: &[String]) -> Option<Interpretation> {
        let rows: Vec<Vec<String>> = non_blank(lines)
            .into_iter()
            .filter_map(|line| {
                let percent = Self::percent_of(line)?;
                Some(vec![
                    Self::label_of(line),
                    percent.to_string(),
                    line.trim().to_string(),
                ])
            })
            .collect();
        if rows.is_empty() {
            return None;
        }

        Some(Interpretation {
            shape: ResultShape::ProgressBar,
            columns: owned_columns(COLUMNS),
            rows,
        })
    }
}
