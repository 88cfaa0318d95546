//! In-memory request history for the interactive session. Lost on exit.

use chrono::{DateTime, Utc};
use std::str::FromStr;
use sysgate_interpreter::{interpret, ResultShape, StructuredResult};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub result: StructuredResult,
}

impl HistoryEntry {
    pub fn new(result: StructuredResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            result,
        }
    }

    /// A request that ended in an error rather than a result.
    pub fn failed(query: &str, command: &str, message: &str) -> Self {
        let mut result = StructuredResult::from_interpretation(
            query,
            command,
            "error",
            message,
            interpret(message, Some(ResultShape::PlainText), &[]),
        );
        result.is_safe = false;
        Self::new(result)
    }

    pub fn status(&self) -> HistoryFilter {
        if self.result.is_blocked() {
            HistoryFilter::Blocked
        } else if self.result.is_safe {
            HistoryFilter::Success
        } else {
            HistoryFilter::Error
        }
    }

    fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.result.query.to_lowercase().contains(&needle)
            || self.result.command.to_lowercase().contains(&needle)
            || self.result.category.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFilter {
    All,
    Success,
    Error,
    Blocked,
}

impl HistoryFilter {
    pub fn label(&self) -> &'static str {
        match self {
            HistoryFilter::All => "ALL",
            HistoryFilter::Success => "OK",
            HistoryFilter::Error => "WARN",
            HistoryFilter::Blocked => "BLOCKED",
        }
    }
}

impl FromStr for HistoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(HistoryFilter::All),
            "success" | "ok" => Ok(HistoryFilter::Success),
            "error" | "warn" => Ok(HistoryFilter::Error),
            "blocked" => Ok(HistoryFilter::Blocked),
            other => Err(format!("Unknown history filter: {}", other)),
        }
    }
}

/// Newest first.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn latest_mut(&mut self) -> Option<&mut HistoryEntry> {
        self.entries.first_mut()
    }

    pub fn filter(&self, filter: HistoryFilter, search: Option<&str>) -> Vec<&HistoryEntry> {
        self.entries
            .iter()
            .filter(|entry| filter == HistoryFilter::All || entry.status() == filter)
            .filter(|entry| search.map_or(true, |needle| entry.mentions(needle)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
