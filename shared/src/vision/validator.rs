//! Strict JSON out of free text.
//!
//! Three stages, each usable on its own:
//! `normalize` (strip fences) -> `parse` (JSON object) -> `check` (fields, types, ranges).
//! `validate` runs all three. Nothing here logs or allocates state; the same text
//! always gives the same answer.

use roadscan_atoms::assessments::{AnalysisResult, Severity};
use serde_json::{Map, Value};

use super::error::ContractError;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

pub const REQUIRED_FIELDS: [&str; 4] = [
    "crack_percentage",
    "pothole_probability",
    "severity",
    "condition_score",
];

/// Trim, then drop one leading "```json" and one trailing "```", then trim again.
/// Not recursive: a doubly fenced reply keeps its inner fence.
pub fn normalize(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix(FENCE_OPEN) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(FENCE_CLOSE) {
        text = rest;
    }

    text.trim()
}

/// Parse normalized text as a JSON object.
pub fn parse(text: &str) -> Result<Map<String, Value>, ContractError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ContractError::Parse {
        reason: e.to_string(),
        raw: text.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ContractError::NotAnObject),
    }
}

fn number_in(value: &Value, min: f64, max: f64) -> Option<f64> {
    value.as_f64().filter(|n| (min..=max).contains(n))
}

/// Field checks, in order: presence, crack_percentage, pothole_probability,
/// severity, condition_score. First failure wins.
pub fn check(object: &Map<String, Value>) -> Result<AnalysisResult, ContractError> {
    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            return Err(ContractError::MissingField(field));
        }
    }

    let invalid = |field: &'static str| ContractError::InvalidField {
        field,
        value: object[field].clone(),
    };

    let crack_percentage =
        number_in(&object["crack_percentage"], 0.0, 100.0)
            .ok_or_else(|| invalid("crack_percentage"))?;

    let pothole_probability =
        number_in(&object["pothole_probability"], 0.0, 1.0)
            .ok_or_else(|| invalid("pothole_probability"))?;

    let severity = object["severity"]
        .as_str()
        .and_then(|s| s.parse::<Severity>().ok())
        .ok_or_else(|| invalid("severity"))?;

    // Integers only: 50.0 and 50.5 are both rejected
    let condition_score = object["condition_score"]
        .as_i64()
        .filter(|n| (0..=100).contains(n))
        .map(|n| n as u32)
        .ok_or_else(|| invalid("condition_score"))?;

    Ok(AnalysisResult {
        crack_percentage,
        pothole_probability,
        severity,
        condition_score,
    })
}

/// normalize -> parse -> check
pub fn validate(raw: &str) -> Result<AnalysisResult, ContractError> {
    let object = parse(normalize(raw))?;
    check(&object)
}
