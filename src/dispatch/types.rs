//! Type definitions for the dispatch path.
//!
//! These types form the shared vocabulary between routing, request building,
//! specialist invocation, and response normalization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::NormalizeError;

/// JSON object used for decision payloads and response `data`/`entities`.
pub type JsonMap = Map<String, Value>;

/// Outcome tag of a [`CanonicalResponse`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Ok => f.write_str("ok"),
            ResponseStatus::Error => f.write_str("error"),
        }
    }
}

impl FromStr for ResponseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(ResponseStatus::Ok),
            "error" => Ok(ResponseStatus::Error),
            other => Err(format!("expected `ok` or `error`, got `{other}`")),
        }
    }
}

/// Outcome of classifying a query: which specialist to call and the context
/// it needs. Read-only once produced.
#[derive(Clone, Debug)]
pub struct RoutingDecision {
    specialist: String,
    payload: JsonMap,
}

impl RoutingDecision {
    pub fn new(specialist: impl Into<String>, payload: JsonMap) -> Self {
        Self {
            specialist: specialist.into(),
            payload,
        }
    }

    pub fn specialist(&self) -> &str {
        &self.specialist
    }

    pub fn payload(&self) -> &JsonMap {
        &self.payload
    }
}

/// The text sent to a specialist. Built once and consumed by value by the
/// invocation.
#[derive(Debug, PartialEq, Eq)]
pub struct SpecialistRequest {
    specialist: String,
    text: String,
}

impl SpecialistRequest {
    pub(crate) fn new(specialist: String, text: String) -> Self {
        Self { specialist, text }
    }

    pub fn specialist(&self) -> &str {
        &self.specialist
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// A specialist reply, classified by shape.
#[derive(Clone, Debug, PartialEq)]
pub enum SpecialistResult {
    /// Text that may itself encode a structured record.
    Text(String),
    /// An already-structured record.
    Structured(JsonMap),
}

impl TryFrom<Value> for SpecialistResult {
    type Error = NormalizeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(SpecialistResult::Text(text)),
            Value::Object(record) => Ok(SpecialistResult::Structured(record)),
            Value::Null => Err(NormalizeError::UnsupportedShape { shape: "null" }),
            Value::Bool(_) => Err(NormalizeError::UnsupportedShape { shape: "bool" }),
            Value::Number(_) => Err(NormalizeError::UnsupportedShape { shape: "number" }),
            Value::Array(_) => Err(NormalizeError::UnsupportedShape { shape: "array" }),
        }
    }
}

/// The single response shape returned to callers, whatever the specialist
/// replied with. `response` is display text and is never re-parsed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResponse {
    pub status: ResponseStatus,
    pub response: Option<String>,
    #[serde(default)]
    pub data: JsonMap,
    #[serde(default)]
    pub entities: JsonMap,
}

impl CanonicalResponse {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            response: Some(summary.into()),
            data: JsonMap::new(),
            entities: JsonMap::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_text_and_objects() {
        assert_eq!(
            SpecialistResult::try_from(json!("hi")).unwrap(),
            SpecialistResult::Text("hi".to_string())
        );
        assert!(matches!(
            SpecialistResult::try_from(json!({"response": "x"})).unwrap(),
            SpecialistResult::Structured(_)
        ));
    }

    #[test]
    fn rejects_other_shapes() {
        for (value, shape) in [
            (json!(42), "number"),
            (json!([1, 2]), "array"),
            (json!(null), "null"),
            (json!(true), "bool"),
        ] {
            match SpecialistResult::try_from(value) {
                Err(NormalizeError::UnsupportedShape { shape: got }) => assert_eq!(got, shape),
                other => panic!("expected UnsupportedShape, got {other:?}"),
            }
        }
    }

    #[test]
    fn canonical_response_serializes_all_keys() {
        let value = serde_json::to_value(CanonicalResponse {
            status: ResponseStatus::Ok,
            response: None,
            data: JsonMap::new(),
            entities: JsonMap::new(),
        })
        .unwrap();

        assert_eq!(
            value,
            json!({"status": "ok", "response": null, "data": {}, "entities": {}})
        );
    }

    #[test]
    fn status_parses_from_cli_text() {
        assert_eq!("error".parse::<ResponseStatus>().unwrap(), ResponseStatus::Error);
        assert!("maybe".parse::<ResponseStatus>().is_err());
    }
}
