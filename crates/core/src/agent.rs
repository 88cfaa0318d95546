//! Extraction of a command from the translation agent's response envelope.
//!
//! The agent is best-effort: its structured answer may arrive as a JSON
//! string inside `raw_response`, as `response.result` (object, string, or a
//! `text` member holding either), or as `response.message`. Each location
//! is tried in turn; when none carries a command the translation degrades
//! to plain text with [`UNPARSEABLE_COMMAND`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sysgate_interpreter::ResultShape;
use tracing::debug;

use crate::gateway::FreeFormRequest;

pub const UNPARSEABLE_COMMAND: &str = "N/A — could not parse agent response";

const DEFAULT_CATEGORY: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTranslation {
    pub query: String,
    pub command: String,
    pub is_safe: bool,
    pub category: String,
    /// Shape the agent expects; `None` lets the interpreter infer one.
    pub result_shape: Option<ResultShape>,
    /// Text the agent supplied itself, shown when nothing is executed.
    pub result: String,
    pub blocked_reason: String,
    pub columns: Vec<String>,
}

impl AgentTranslation {
    pub fn extract(query: &str, envelope: &Value) -> Self {
        // A raw_response without command or category still yields to
        // response.result, and is kept only when that has nothing better.
        let parsed = match from_raw_response(envelope) {
            Some(fields) if has_any(&fields, &["command", "category"]) => fields,
            raw => from_result(query, envelope).or(raw).unwrap_or_default(),
        };
        let parsed = with_message(parsed, envelope);

        if !truthy(parsed.get("result")) && !truthy(parsed.get("command")) {
            debug!("Agent envelope carried no command or result");
            return Self::unparseable(query, fallback_text(envelope));
        }
        Self::from_fields(query, &parsed)
    }

    pub fn unparseable(query: &str, text: String) -> Self {
        Self {
            query: query.to_string(),
            command: UNPARSEABLE_COMMAND.to_string(),
            is_safe: true,
            category: DEFAULT_CATEGORY.to_string(),
            result_shape: Some(ResultShape::PlainText),
            result: text,
            blocked_reason: String::new(),
            columns: Vec::new(),
        }
    }

    pub fn is_unparseable(&self) -> bool {
        self.command == UNPARSEABLE_COMMAND
    }

    /// The agent refused the request itself.
    pub fn is_flagged_blocked(&self) -> bool {
        !self.is_safe || self.result_shape == Some(ResultShape::Blocked)
    }

    pub fn into_request(self) -> FreeFormRequest {
        FreeFormRequest {
            query: self.query,
            command: self.command,
            category: self.category,
            shape_hint: self.result_shape,
            columns: self.columns,
        }
    }

    fn from_fields(query: &str, fields: &Map<String, Value>) -> Self {
        let text = |key: &str| -> Option<String> {
            match fields.get(key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
                Some(Value::Null) | Some(Value::String(_)) | None => None,
                Some(other) => Some(other.to_string()),
            }
        };

        let columns = match fields.get("columns") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            query: text("query").unwrap_or_else(|| query.to_string()),
            command: text("command").unwrap_or_default(),
            is_safe: fields.get("is_safe") != Some(&Value::Bool(false)),
            category: text("category").unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            result_shape: text("result_type").and_then(|s| s.parse().ok()),
            result: text("result").unwrap_or_default(),
            blocked_reason: text("blocked_reason").unwrap_or_default(),
            columns,
        }
    }
}

/// JavaScript-style truthiness of an optional JSON value.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn has_any(fields: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|key| truthy(fields.get(*key)))
}

/// A string that holds JSON becomes that JSON; anything else is kept.
fn decode(value: &Value) -> Value {
    match value {
        Value::String(s) => serde_json::from_str(s).unwrap_or_else(|_| value.clone()),
        other => other.clone(),
    }
}

fn from_raw_response(envelope: &Value) -> Option<Map<String, Value>> {
    let raw = envelope.get("raw_response").filter(|v| truthy(Some(*v)))?;
    let outer = match raw {
        Value::String(s) => serde_json::from_str::<Value>(s).ok()?,
        other => other.clone(),
    };
    let inner = match outer.get("response") {
        Some(response) if !response.is_null() => decode(response),
        _ => outer,
    };
    match inner {
        Value::Object(fields) if has_any(&fields, &["command", "category", "result_type"]) => {
            debug!("Agent command found in raw_response");
            Some(fields)
        }
        _ => None,
    }
}

fn from_result(query: &str, envelope: &Value) -> Option<Map<String, Value>> {
    let result = envelope.pointer("/response/result").map(decode)?;
    let Value::Object(fields) = result else {
        return None;
    };
    if has_any(&fields, &["command", "category", "result_type"]) {
        debug!("Agent command found in response.result");
        return Some(fields);
    }

    let text = fields.get("text")?.as_str()?;
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(inner)) if has_any(&inner, &["command", "category"]) => Some(inner),
        Ok(_) => None,
        Err(_) => Some(plain_body(query, text)),
    }
}

/// `response.message` either holds the structured answer or, as plain
/// text, the result body.
fn with_message(mut parsed: Map<String, Value>, envelope: &Value) -> Map<String, Value> {
    if truthy(parsed.get("command")) || truthy(parsed.get("result")) {
        return parsed;
    }
    let Some(message) = envelope.pointer("/response/message").and_then(Value::as_str) else {
        return parsed;
    };
    if message.is_empty() {
        return parsed;
    }

    match serde_json::from_str::<Value>(message) {
        Ok(Value::Object(fields)) if has_any(&fields, &["command", "category"]) => fields,
        Ok(_) => parsed,
        Err(_) => {
            parsed.insert("result".to_string(), Value::String(message.to_string()));
            if !truthy(parsed.get("result_type")) {
                parsed.insert("result_type".to_string(), Value::String("text".to_string()));
            }
            parsed
        }
    }
}

fn plain_body(query: &str, text: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("query".to_string(), Value::String(query.to_string()));
    fields.insert("command".to_string(), Value::String(String::new()));
    fields.insert("category".to_string(), Value::String(DEFAULT_CATEGORY.to_string()));
    fields.insert("result_type".to_string(), Value::String("text".to_string()));
    fields.insert("result".to_string(), Value::String(text.to_string()));
    fields
}

fn fallback_text(envelope: &Value) -> String {
    let candidate = envelope
        .pointer("/response/message")
        .filter(|v| truthy(Some(*v)))
        .or_else(|| envelope.pointer("/response/result/text"));
    match candidate {
        Some(Value::String(s)) => s.clone(),
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_default(),
        None => String::new(),
    }
}
