use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::sort::{sort_rows, SortDirection};

/// Marker attached to a result whose output produced no rows.
pub const NO_DATA_PARSED: &str = "No data rows parsed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    Table,
    ProgressBar,
    KeyValue,
    #[serde(rename = "text", alias = "plain_text")]
    PlainText,
    Blocked,
}

impl ResultShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultShape::Table => "table",
            ResultShape::ProgressBar => "progress_bar",
            ResultShape::KeyValue => "key_value",
            ResultShape::PlainText => "text",
            ResultShape::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ResultShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(ResultShape::Table),
            "progress" | "progress_bar" => Ok(ResultShape::ProgressBar),
            "kv" | "key_value" | "keyvalue" => Ok(ResultShape::KeyValue),
            "text" | "plain" | "plain_text" => Ok(ResultShape::PlainText),
            "blocked" => Ok(ResultShape::Blocked),
            other => Err(format!("Unknown result shape: {}", other)),
        }
    }
}

/// What a parser produced: the shape it settled on plus aligned rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub shape: ResultShape,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Interpretation {
    pub fn empty(shape: ResultShape) -> Self {
        Self {
            shape,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The renderer-agnostic result handed to any consumer.
///
/// Serialized as a flat mapping of strings, booleans and string arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResult {
    pub query: String,
    pub command: String,
    pub is_safe: bool,
    pub category: String,
    #[serde(rename = "result_type")]
    pub result_shape: ResultShape,
    #[serde(rename = "result")]
    pub raw_text: String,
    pub blocked_reason: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
    #[serde(default)]
    pub note: String,
    /// Deny pattern that blocked the command, when the policy gate did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_pattern: Option<String>,
}

impl StructuredResult {
    pub fn blocked(
        query: impl Into<String>,
        command: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            command: command.into(),
            is_safe: false,
            category: "blocked".to_string(),
            result_shape: ResultShape::Blocked,
            raw_text: String::new(),
            blocked_reason: reason.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            note: String::new(),
            matched_pattern: None,
        }
    }

    pub fn with_matched_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.matched_pattern = Some(pattern.into());
        self
    }

    pub fn from_interpretation(
        query: impl Into<String>,
        command: impl Into<String>,
        category: impl Into<String>,
        raw_text: impl Into<String>,
        interpretation: Interpretation,
    ) -> Self {
        let note = if interpretation.is_empty() {
            NO_DATA_PARSED.to_string()
        } else {
            String::new()
        };
        Self {
            query: query.into(),
            command: command.into(),
            is_safe: true,
            category: category.into(),
            result_shape: interpretation.shape,
            raw_text: raw_text.into(),
            blocked_reason: String::new(),
            columns: interpretation.columns,
            rows: interpretation.rows,
            note,
            matched_pattern: None,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.result_shape == ResultShape::Blocked
    }

    /// Stable sort of the rows by one column.
    pub fn sort_by_column(&mut self, column: usize, direction: SortDirection) {
        sort_rows(&mut self.rows, column, direction);
    }
}
