use super::{is_header, non_blank, split_wide, OutputParser};
use crate::shape::{Interpretation, ResultShape};

/// Columnar output such as `ps aux`, `df -h` or `free`.
pub struct TableParser;

impl TableParser {
    /// Split one data line into exactly `width` cells, or drop it.
    fn split_row(line: &str, width: usize) -> Option<Vec<String>> {
        if width == 1 {
            return Some(vec![line.trim().to_string()]);
        }

        let cells = split_wide(line);
        if let Some(row) = Self::align(cells, width) {
            return Some(row);
        }

        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if let Some(row) = Self::align(tokens.clone(), width) {
            return Some(row);
        }
        if tokens.len() > width {
            // Free-text trailing column, e.g. a process command line.
            let mut row: Vec<String> = tokens[..width - 1].to_vec();
            row.push(tokens[width - 1..].join(" "));
            return Some(row);
        }
        None
    }

    /// Exact fit, or one extra leading `Label:` cell as in `free` output.
    fn align(cells: Vec<String>, width: usize) -> Option<Vec<String>> {
        if cells.len() == width {
            return Some(cells);
        }
        if cells.len() == width + 1 && cells[0].ends_with(':') {
            return Some(cells[1..].to_vec());
        }
        None
    }

    /// Header for output parsed without expected columns: two or more
    /// tokens, none of them numeric.
    fn infer_header(line: &str) -> Option<Vec<String>> {
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if tokens.len() < 2 || tokens.iter().any(|t| t.parse::<f64>().is_ok()) {
            return None;
        }
        Some(tokens)
    }
}

impl OutputParser for TableParser {
    fn shape(&self) -> ResultShape {
        ResultShape::Table
    }

    fn parse(&self, lines: &[&str], columns: &[String]) -> Option<Interpretation> {
        let lines = non_blank(lines);
        let first = lines.first()?;

        let (columns, data) = if columns.is_empty() {
            (Self::infer_header(first)?, &lines[1..])
        } else if is_header(first, columns) {
            (columns.to_vec(), &lines[1..])
        } else {
            (columns.to_vec(), &lines[..])
        };

        let width = columns.len();
        let rows: Vec<Vec<String>> = data
            .iter()
            .filter_map(|line| Self::split_row(line, width))
            .collect();
        if rows.is_empty() {
            return None;
        }

        Some(Interpretation {
            shape: ResultShape::Table,
            columns,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::owned_columns;

    const PS_COLUMNS: &[&str] = &[
        "USER", "PID", "%CPU", "%MEM", "VSZ", "RSS", "TTY", "STAT", "START", "TIME", "COMMAND",
    ];

    const PS_OUTPUT: &str = "USER       PID  %CPU %MEM    VSZ   RSS TTY      STAT START   TIME COMMAND
root         1   0.0  0.1 169324 13212 ?        Ss   08:00   0:03 /sbin/init
www-data  1024   2.1  3.4 524288 34560 ?        Sl   08:01   1:24 nginx: worker
node      2048   4.2  8.1 892416 81920 ?        Sl   08:02   2:15 node server.js";

    fn parse(text: &str, columns: &[&str]) -> Option<Interpretation> {
        let lines: Vec<&str> = text.lines().collect();
        TableParser.parse(&lines, &owned_columns(columns))
    }

    #[test]
    fn test_ps_header_skipped_and_command_merged() {
        let parsed = parse(PS_OUTPUT, PS_COLUMNS).unwrap();
        assert_eq!(parsed.rows.len(), 3);
        assert!(parsed.rows.iter().all(|row| row.len() == PS_COLUMNS.len()));
        assert_eq!(parsed.rows[1][0], "www-data");
        assert_eq!(parsed.rows[1][10], "nginx: worker");
        assert_eq!(parsed.rows[2][10], "node server.js");
    }

    #[test]
    fn test_free_row_label_dropped() {
        let parsed = parse("Mem:  16384  11000  5384", &["total", "used", "free"]).unwrap();
        assert_eq!(parsed.rows, vec![vec!["16384", "11000", "5384"]]);
    }

    #[test]
    fn test_short_rows_dropped_not_misaligned() {
        let text = "               total        used        free      shared  buff/cache   available
Mem:           15Gi        11Gi       1.2Gi       1.0Gi       3.4Gi       3.9Gi
Swap:         2.0Gi          0B       2.0Gi";
        let parsed = parse(
            text,
            &["total", "used", "free", "shared", "buff/cache", "available"],
        )
        .unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0][0], "15Gi");
        assert_eq!(parsed.rows[0][5], "3.9Gi");
    }

    #[test]
    fn test_inferred_header_without_columns() {
        let parsed = parse(PS_OUTPUT, &[]).unwrap();
        assert_eq!(parsed.columns.len(), 11);
        assert_eq!(parsed.columns[0], "USER");
        assert_eq!(parsed.rows.len(), 3);
    }

    #[test]
    fn test_numeric_first_line_is_not_a_header() {
        assert!(parse("MemTotal: 16384000 kB\nMemFree: 4096000 kB", &[]).is_none());
    }

    #[test]
    fn test_single_line_without_columns_yields_nothing() {
        assert!(parse("Linux host 6.1.0 x86_64", &[]).is_none());
    }

    #[test]
    fn test_tab_separated() {
        let parsed = parse("a\tb c\tc", &["x", "y", "z"]).unwrap();
        assert_eq!(parsed.rows, vec![vec!["a", "b c", "c"]]);
    }
}
