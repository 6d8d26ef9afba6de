//! Specialist reply normalization.
//!
//! Specialists reply either with text (which may encode a JSON record) or
//! with an already-structured record. [`ResponseNormalizer`] turns both into
//! a [`CanonicalResponse`]. Text that is not a JSON object is never rejected:
//! it is surfaced verbatim as the response, with empty `data` and `entities`.
//!
//! Only the outermost shape is parsed. A `response` field that itself holds
//! a JSON document is passed through as display text, not unwrapped.

use serde_json::Value;

use super::types::{CanonicalResponse, JsonMap, ResponseStatus, SpecialistResult};
use crate::error::NormalizeError;

#[derive(Clone, Copy, Debug)]
pub struct ResponseNormalizer {
    /// Status used when a text reply is not a structured record.
    degraded_status: ResponseStatus,
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new(ResponseStatus::Ok)
    }
}

impl ResponseNormalizer {
    pub fn new(degraded_status: ResponseStatus) -> Self {
        Self { degraded_status }
    }

    /// Normalize a raw specialist reply.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::UnsupportedShape`] if the reply is neither
    /// text nor a JSON object.
    pub fn normalize(&self, raw: Value) -> Result<CanonicalResponse, NormalizeError> {
        let result = SpecialistResult::try_from(raw)?;
        Ok(self.normalize_result(result))
    }

    /// Normalize an already-classified reply. Infallible.
    pub fn normalize_result(&self, result: SpecialistResult) -> CanonicalResponse {
        match result {
            SpecialistResult::Text(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(record)) => from_record(record),
                Ok(_) => {
                    tracing::debug!("Specialist text is JSON but not a record, using verbatim");
                    self.verbatim(text)
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Specialist text is not JSON, using verbatim");
                    self.verbatim(text)
                }
            },
            SpecialistResult::Structured(record) => from_record(record),
        }
    }

    fn verbatim(&self, text: String) -> CanonicalResponse {
        CanonicalResponse {
            status: self.degraded_status,
            response: Some(text),
            data: JsonMap::new(),
            entities: JsonMap::new(),
        }
    }
}

/// Build a canonical response from a structured record. Missing fields map
/// to `None` / empty objects.
fn from_record(mut record: JsonMap) -> CanonicalResponse {
    let status = match record.get("status").and_then(Value::as_str) {
        Some("error") => ResponseStatus::Error,
        _ => ResponseStatus::Ok,
    };

    CanonicalResponse {
        status,
        response: display_text(record.remove("response")),
        data: object_field("data", record.remove("data")),
        entities: object_field("entities", record.remove("entities")),
    }
}

fn display_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(text) => Some(text),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => {
            tracing::warn!(
                kind = if other.is_array() { "array" } else { "object" },
                "Specialist `response` is not display text, dropping it"
            );
            None
        }
    }
}

fn object_field(key: &str, value: Option<Value>) -> JsonMap {
    match value {
        None | Some(Value::Null) => JsonMap::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            tracing::warn!(field = key, "Specialist field is not an object, using empty");
            JsonMap::new()
        }
    }
}
