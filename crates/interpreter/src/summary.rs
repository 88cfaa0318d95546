//! Numeric parsers behind the dashboard health cards.
//!
//! Each parser degrades to `None` on unexpected input; [`SummaryData`] turns
//! that into a `-- %` / `--` placeholder rather than an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sort::leading_number;

static PERCENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)%").expect("percent regex must compile"));
static UP_SINCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"up\s+(.+)").expect("uptime regex must compile"));
static DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*days?\s*").expect("days regex must compile"));
static HOURS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*hours?\s*").expect("hours regex must compile"));
static MINUTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*minutes?\s*").expect("minutes regex must compile"));

const PERCENT_PLACEHOLDER: &str = "-- %";
const UPTIME_PLACEHOLDER: &str = "--";

/// Busy share of CPU time from the aggregate `cpu` line of `/proc/stat`.
pub fn cpu_percent(stat: &str) -> Option<f64> {
    let line = stat.lines().next()?;
    if !line.starts_with("cpu") {
        return None;
    }
    let fields: Vec<f64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|field| field.parse().ok())
        .collect();
    let idle = fields.get(3).copied().unwrap_or(0.0);
    let total: f64 = fields.iter().sum();
    if total > 0.0 {
        Some((1.0 - idle / total) * 100.0)
    } else {
        None
    }
}

/// Used over total from the `Mem:` line of `free` output.
pub fn memory_percent(free: &str) -> Option<f64> {
    let line = free.lines().find(|line| line.starts_with("Mem:"))?;
    let parts: Vec<&str> = line.split_whitespace().collect();
    let total = leading_number(parts.get(1)?)?;
    let used = leading_number(parts.get(2)?)?;
    if total > 0.0 {
        Some(used / total * 100.0)
    } else {
        None
    }
}

/// Use percentage of the root filesystem from `df` output.
pub fn disk_percent(df: &str) -> Option<u32> {
    df.lines()
        .filter(|line| line.contains('/'))
        .filter(|line| line.contains("/ ") || line.trim_end().ends_with('/'))
        .find_map(|line| {
            PERCENT
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
}

/// Compact uptime from either `uptime -p` ("up 2 hours, 37 minutes") or the
/// traditional form ("10:00:00 up 14 days,  6:32,  2 users, ...").
pub fn normalize_uptime(uptime: &str) -> Option<String> {
    let caps = UP_SINCE.captures(uptime)?;
    let mut up = caps.get(1)?.as_str().trim().to_string();

    if up.contains("user") {
        if let Some(idx) = up.find(',').filter(|idx| *idx > 0) {
            up = up[..idx].trim().to_string();
        }
    }

    let up = DAYS.replace(&up, "d ");
    let up = HOURS.replace(&up, "h ");
    let up = MINUTES.replace(&up, "m ");
    let compact = up.replace(',', "");
    let compact = compact.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        None
    } else {
        Some(compact)
    }
}

/// Health card values, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryData {
    pub cpu: String,
    pub memory: String,
    pub disk: String,
    pub uptime: String,
}

impl SummaryData {
    /// Build from raw probe outputs; a missing probe yields its placeholder.
    pub fn from_probes(
        stat: Option<&str>,
        free: Option<&str>,
        df: Option<&str>,
        uptime: Option<&str>,
    ) -> Self {
        Self {
            cpu: format_percent(stat.and_then(cpu_percent)),
            memory: format_percent(free.and_then(memory_percent)),
            disk: disk_percent_display(df.and_then(disk_percent)),
            uptime: uptime
                .and_then(normalize_uptime)
                .unwrap_or_else(|| UPTIME_PLACEHOLDER.to_string()),
        }
    }
}

fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1} %", v),
        None => PERCENT_PLACEHOLDER.to_string(),
    }
}

fn disk_percent_display(value: Option<u32>) -> String {
    match value {
        Some(v) => format!("{} %", v),
        None => PERCENT_PLACEHOLDER.to_string(),
    }
}
