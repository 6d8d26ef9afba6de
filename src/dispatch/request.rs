//! Specialist request assembly.
//!
//! A request is the specialist's system message followed by the user's
//! verbatim query, separated by a fixed `---` line.

use serde_json::Value;

use super::types::{JsonMap, RoutingDecision, SpecialistRequest};
use crate::error::RequestError;

/// Separator line between the system message and the user's query.
pub const REQUEST_SEPARATOR: &str = "---";

/// Prefix placed directly before the verbatim user query.
pub const QUERY_PREFIX: &str = "User's original query: ";

/// Payload key holding the user's query.
pub const USER_QUERY_KEY: &str = "user_query";

#[derive(Clone, Copy, Debug, Default)]
pub struct RequestBuilder;

impl RequestBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Assemble the text sent to the decision's specialist.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::MissingField`] if the payload has no text
    /// `user_query`.
    pub fn build(&self, decision: &RoutingDecision) -> Result<SpecialistRequest, RequestError> {
        let payload = decision.payload();
        let query = payload
            .get(USER_QUERY_KEY)
            .and_then(Value::as_str)
            .ok_or_else(|| RequestError::MissingField(USER_QUERY_KEY.to_string()))?;

        let system = build_specialist_system_message(payload);
        let text = format!("{system}\n\n{REQUEST_SEPARATOR}\n\n{QUERY_PREFIX}{query}");

        Ok(SpecialistRequest::new(decision.specialist().to_string(), text))
    }
}

/// Build the specialist's system message from a decision payload.
///
/// Recognised keys: `specialist`, `description`, `instructions`, and a
/// `context` object rendered as a bullet list. Every other key is ignored.
pub fn build_specialist_system_message(payload: &JsonMap) -> String {
    let mut message = String::with_capacity(512);

    match payload.get("specialist").and_then(Value::as_str) {
        Some(name) => message.push_str(&format!(
            "You are the `{name}` specialist, called by a coordinator on behalf of a user.\n"
        )),
        None => message.push_str("You are a specialist called by a coordinator on behalf of a user.\n"),
    }

    if let Some(description) = payload.get("description").and_then(Value::as_str) {
        message.push_str("\n## Your Role\n\n");
        message.push_str(description);
        message.push('\n');
    }

    if let Some(Value::Object(context)) = payload.get("context") {
        if !context.is_empty() {
            message.push_str("\n## Context\n\n");
            for (key, value) in context {
                match value {
                    Value::String(s) => message.push_str(&format!("- **{key}**: {s}\n")),
                    other => message.push_str(&format!("- **{key}**: {other}\n")),
                }
            }
        }
    }

    if let Some(instructions) = payload.get("instructions").and_then(Value::as_str) {
        message.push_str("\n## Instructions\n\n");
        message.push_str(instructions);
        message.push('\n');
    }

    message.push_str(
        "\n## Reply Format\n\n\
         Reply with a JSON object with the optional keys `response` (final display \
         text), `data` (object) and `entities` (object). Put display text directly \
         in `response`; do not nest another JSON document inside it. Plain text \
         replies are accepted and shown as-is.",
    );

    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test payloads are objects"),
        }
    }

    #[test]
    fn system_message_includes_role_and_instructions() {
        let message = build_specialist_system_message(&payload(json!({
            "specialist": "payroll",
            "description": "Answers salary questions",
            "instructions": "Always show currency.",
        })));

        assert!(message.contains("`payroll` specialist"));
        assert!(message.contains("Answers salary questions"));
        assert!(message.contains("Always show currency."));
        assert!(message.contains("## Reply Format"));
    }

    #[test]
    fn system_message_renders_context_entries() {
        let message = build_specialist_system_message(&payload(json!({
            "context": {"employee_id": "E-17", "month": 3},
        })));

        assert!(message.contains("- **employee_id**: E-17"));
        assert!(message.contains("- **month**: 3"));
    }

    #[test]
    fn system_message_omits_empty_sections() {
        let message = build_specialist_system_message(&payload(json!({"context": {}})));
        assert!(!message.contains("## Context"));
        assert!(!message.contains("## Instructions"));
        assert!(!message.contains("## Your Role"));
    }

    #[test]
    fn request_layout_is_system_separator_query() {
        let decision = RoutingDecision::new(
            "payroll",
            payload(json!({"specialist": "payroll", "user_query": "hi"})),
        );
        let request = RequestBuilder::new().build(&decision).unwrap();
        let system = build_specialist_system_message(decision.payload());

        assert_eq!(
            request.text(),
            format!("{system}\n\n---\n\nUser's original query: hi")
        );
        assert_eq!(request.specialist(), "payroll");
    }

    #[test]
    fn non_text_user_query_is_missing() {
        let decision = RoutingDecision::new("payroll", payload(json!({"user_query": 7})));
        let err = RequestBuilder::new().build(&decision).unwrap_err();
        assert!(matches!(err, RequestError::MissingField(field) if field == "user_query"));
    }
}
