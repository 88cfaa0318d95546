use super::{owned_columns, OutputParser};
use crate::shape::{Interpretation, ResultShape};

const COLUMNS: &[&str] = &["LINE", "TEXT"];

/// Catch-all: one row per line, numbered from 1.
pub struct PlainTextParser;

impl OutputParser for PlainTextParser {
    fn shape(&self) -> ResultShape {
        ResultShape::PlainText
    }

    fn parse(&self, lines: &[&str], _columns: &[String]) -> Option<Interpretation> {
        if lines.is_empty() {
            return None;
        }
        let rows = lines
            .iter()
            .enumerate()
            .map(|(idx, line)| vec![(idx + 1).to_string(), line.to_string()])
            .collect();

        Some(Interpretation {
            shape: ResultShape::PlainText,
            columns: owned_columns(COLUMNS),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_every_line() {
        let parsed = PlainTextParser
            .parse(&["Linux host", "", "up 3 days"], &[])
            .unwrap();
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[2], vec!["3", "up 3 days"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(PlainTextParser.parse(&[], &[]).is_none());
    }
}
