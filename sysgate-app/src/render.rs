//! Terminal rendering of structured results.

use sysgate_core::{CatalogEntry, MetricReport};
use sysgate_interpreter::{ResultShape, StructuredResult, SummaryData};

const BAR_WIDTH: usize = 30;
const CRITICAL_PERCENT: u32 = 90;
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn result(&self, result: &StructuredResult) -> String {
        let mut out = match result.result_shape {
            ResultShape::Blocked => return self.blocked(result),
            ResultShape::Table => table(&result.columns, &result.rows),
            ResultShape::ProgressBar => self.progress(&result.rows),
            ResultShape::KeyValue => key_value(&result.rows),
            ResultShape::PlainText => numbered(&result.rows),
        };
        if !result.note.is_empty() {
            out.push_str(&format!("({})\n", result.note));
        }
        out
    }

    pub fn metric(&self, report: &MetricReport) -> String {
        let mut out = String::new();
        if let Some(summary) = &report.summary {
            out.push_str(&summary_line(summary));
            out.push('\n');
        }
        out.push_str(&self.result(&report.result));
        out
    }

    fn blocked(&self, result: &StructuredResult) -> String {
        let title = if self.color {
            format!("{}COMMAND BLOCKED{}", RED, RESET)
        } else {
            "COMMAND BLOCKED".to_string()
        };
        format!(
            "{}\n  command: {}\n  reason:  {}\n",
            title, result.command, result.blocked_reason
        )
    }

    fn progress(&self, rows: &[Vec<String>]) -> String {
        let label_width = rows
            .iter()
            .map(|row| cell(row, 0).chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for row in rows {
            let percent = cell(row, 1).parse::<u32>().unwrap_or(0).min(100);
            let filled = percent as usize * BAR_WIDTH / 100;
            let bar = format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled));
            let marker = match (percent > CRITICAL_PERCENT, self.color) {
                (true, true) => format!(" {}!{}", RED, RESET),
                (true, false) => " !".to_string(),
                (false, _) => String::new(),
            };
            out.push_str(&format!(
                "{:<width$}  [{}] {:>3}%{}\n",
                cell(row, 0),
                bar,
                percent,
                marker,
                width = label_width
            ));
        }
        out
    }
}

fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}

fn table(columns: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in rows {
        for (i, value) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(value.chars().count());
            }
        }
    }

    let mut out = format_row(columns.iter().map(String::as_str), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("  ")));
    for row in rows {
        out.push_str(&format_row(row.iter().map(String::as_str), &widths));
    }
    out
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths.iter())
        .map(|(value, width)| format!("{:<width$}", value, width = *width))
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

fn key_value(rows: &[Vec<String>]) -> String {
    let width = rows
        .iter()
        .map(|row| cell(row, 0).chars().count())
        .max()
        .unwrap_or(0);
    rows.iter()
        .map(|row| format!("{:<width$} = {}\n", cell(row, 0), cell(row, 1), width = width))
        .collect()
}

fn numbered(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| format!("{:>4}  {}\n", cell(row, 0), cell(row, 1)))
        .collect()
}

pub fn summary_line(summary: &SummaryData) -> String {
    format!(
        "CPU {} | MEMORY {} | DISK {} | UPTIME {}",
        summary.cpu, summary.memory, summary.disk, summary.uptime
    )
}

pub fn catalog<'a>(entries: impl Iterator<Item = &'a CatalogEntry>) -> String {
    let rows: Vec<Vec<String>> = entries
        .map(|entry| {
            vec![
                entry.name.to_string(),
                entry.category.to_string(),
                entry.shape.to_string(),
                entry.command.to_string(),
            ]
        })
        .collect();
    let columns: Vec<String> = ["NAME", "CATEGORY", "SHAPE", "COMMAND"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    table(&columns, &rows)
}

/// Resolve `:sort` column arguments: a 1-based index or a column name.
pub fn column_index(columns: &[String], arg: &str) -> Option<usize> {
    if let Ok(n) = arg.parse::<usize>() {
        return (n >= 1 && n <= columns.len()).then(|| n - 1);
    }
    columns.iter().position(|c| c.eq_ignore_ascii_case(arg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sysgate_interpreter::interpret;

    fn result(raw: &str, shape: Option<ResultShape>, columns: &[&str]) -> StructuredResult {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        StructuredResult::from_interpretation("q", "cmd", "system", raw, interpret(raw, shape, &columns))
    }

    #[test]
    fn test_table_alignment() {
        let rendered = Renderer::new(false).result(&result(
            "Mem:  16384  11000  5384",
            Some(ResultShape::Table),
            &["total", "used", "free"],
        ));
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "total  used   free");
        assert_eq!(lines[1], "-----  -----  ----");
        assert_eq!(lines[2], "16384  11000  5384");
    }

    #[test]
    fn test_progress_bar_and_critical_marker() {
        let rendered = Renderer::new(false).result(&result(
            "/dev/sda1  50G  32G  18G  50% /\n/dev/sdb1  10G  9.5G  0.5G  95% /data",
            Some(ResultShape::ProgressBar),
            &[],
        ));
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].contains(&format!("[{}{}]", "#".repeat(15), ".".repeat(15))));
        assert!(lines[0].ends_with(" 50%"));
        assert!(lines[1].ends_with(" 95% !"));
    }

    #[test]
    fn test_colored_marker() {
        let rendered = Renderer::new(true).result(&result("cache  99%", None, &[]));
        assert!(rendered.contains(RED));
    }

    #[test]
    fn test_blocked_notice() {
        let blocked = StructuredResult::blocked("q", "sudo ls", "Blocked: sudo");
        let rendered = Renderer::new(false).result(&blocked);
        assert!(rendered.starts_with("COMMAND BLOCKED\n"));
        assert!(rendered.contains("sudo ls"));
        assert!(rendered.contains("Blocked: sudo"));
    }

    #[test]
    fn test_plain_text_numbered_with_note() {
        let rendered = Renderer::new(false).result(&result("up 3 days", None, &[]));
        assert_eq!(rendered, "   1  up 3 days\n");
        let empty = Renderer::new(false).result(&result("", None, &[]));
        assert_eq!(empty, "(No data rows parsed)\n");
    }

    #[test]
    fn test_column_index() {
        let columns: Vec<String> = ["USER", "PID", "%MEM"].iter().map(|c| c.to_string()).collect();
        assert_eq!(column_index(&columns, "3"), Some(2));
        assert_eq!(column_index(&columns, "%mem"), Some(2));
        assert_eq!(column_index(&columns, "0"), None);
        assert_eq!(column_index(&columns, "CMD"), None);
    }
}
