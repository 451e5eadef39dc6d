//! Classifier response parsing.
//!
//! The external model returns loosely-typed JSON. This module reads it into
//! a [`ClassificationResult`] whose `metadata` is a closed record of the
//! documented keys. Parsing is lenient per field: a value of the wrong shape
//! is treated as absent instead of failing the whole response. Only a body
//! that is not a JSON object at all (or that reports an error) is rejected.
//!
//! Enum-like fields (`entry_type`, `status`, `priority`, `period_type`) are
//! kept as the raw strings the model produced; [`crate::normalize`] decides
//! what they mean.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::ChecklistItem;

/// Why a classifier body could not be used.
#[derive(Debug, Error)]
pub enum MalformedResponse {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("classifier reported an error: {0}")]
    Reported(String),
}

/// The model's structured guess for one capture. Never trusted as-is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationResult {
    pub category_slug: Option<String>,
    pub entry_type: Option<String>,
    pub status: Option<String>,
    pub metadata: ClassificationMetadata,
}

/// Documented metadata keys. Anything else the model sends is dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationMetadata {
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub emoji: Option<String>,
    pub target: Option<f64>,
    pub unit: Option<String>,
    pub period_type: Option<String>,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub checklist: Vec<ChecklistItem>,
}

impl ClassificationResult {
    /// Parse a raw HTTP response body.
    ///
    /// Accepts a JSON object, or a JSON string holding an object (some
    /// function runtimes return the model's text verbatim), optionally
    /// wrapped in Markdown code fences.
    pub fn from_body(body: &str) -> Result<Self, MalformedResponse> {
        let value: Value = serde_json::from_str(strip_code_fences(body))?;
        match value {
            Value::String(inner) => {
                let nested: Value = serde_json::from_str(strip_code_fences(&inner))?;
                Self::from_value(&nested)
            }
            other => Self::from_value(&other),
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, MalformedResponse> {
        let obj = value.as_object().ok_or(MalformedResponse::NotAnObject)?;

        if let Some(err) = obj.get("error").filter(|e| !e.is_null()) {
            let message = err
                .as_str()
                .map(str::to_string)
                .or_else(|| {
                    err.get("message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| err.to_string());
            return Err(MalformedResponse::Reported(message));
        }

        let empty = Map::new();
        let meta = obj
            .get("metadata")
            .and_then(|m| m.as_object())
            .unwrap_or(&empty);

        let metadata = ClassificationMetadata {
            summary: string_field(meta, "summary"),
            tags: string_list(meta, "tags"),
            emoji: string_field(meta, "emoji"),
            target: number_field(meta, "target"),
            unit: string_field(meta, "unit"),
            period_type: string_field(meta, "period_type"),
            due_date: string_field(meta, "due_date"),
            // Some prompts put priority at the top level.
            priority: string_field(meta, "priority").or_else(|| string_field(obj, "priority")),
            checklist: checklist_field(meta, "checklist"),
        };

        Ok(Self {
            category_slug: string_field(obj, "category_slug"),
            entry_type: string_field(obj, "entry_type"),
            status: string_field(obj, "status"),
            metadata,
        })
    }
}

fn strip_code_fences(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn number_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number_text(s),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Read a number the model wrote as text, such as `"2,5"`, `"1,000"`,
/// `"1.000,5"` or `"10 km"`.
///
/// When both separators appear, the last one is the decimal mark. A lone
/// comma is a thousands separator if every group after it has three
/// digits, otherwise a single comma is the decimal mark. Anything else is
/// ambiguous and reads as absent. A trailing unit is dropped.
fn parse_number_text(text: &str) -> Option<f64> {
    let text = text.trim();
    let end = text
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+')))
        .unwrap_or(text.len());
    let (number, unit) = text.split_at(end);
    if number.is_empty() || unit.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let canonical = match (number.rfind(','), number.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => number.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => number.replace(',', ""),
        (Some(_), None) => {
            let groups: Vec<&str> = number.split(',').collect();
            if groups[1..].iter().all(|g| g.len() == 3) {
                number.replace(',', "")
            } else if groups.len() == 2 {
                number.replace(',', ".")
            } else {
                return None;
            }
        }
        (None, _) => number.to_string(),
    };
    canonical.parse().ok()
}

fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn checklist_field(obj: &Map<String, Value>, key: &str) -> Vec<ChecklistItem> {
    let Some(items) = obj.get(key).and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(ChecklistItem {
                text: text.trim().to_string(),
                done: false,
            }),
            Value::Object(fields) => Some(ChecklistItem {
                text: string_field(fields, "text")?,
                done: match fields.get("done") {
                    Some(Value::Bool(b)) => *b,
                    Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
                    _ => false,
                },
            }),
            _ => None,
        })
        .filter(|item| !item.text.is_empty())
        .collect()
}
