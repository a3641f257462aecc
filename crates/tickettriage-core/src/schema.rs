//! JSON Schema contract for structured model output
//!
//! The schema mirrors [`crate::types::TicketClassification`] exactly and is
//! sent to the provider as a strict `response_format` constraint, so a
//! conforming provider can only return parseable output. Parsing and the
//! confidence bound are still re-checked locally; the schema is a constraint
//! on the provider, not a substitute for validation.

use serde_json::{json, Value};

/// Name under which the schema is registered with the provider
pub const SCHEMA_NAME: &str = "ticket_classification";

/// Build the strict JSON Schema for a classification result
pub fn classification_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "category": {
                "type": "string",
                "enum": [
                    "order_issue",
                    "account_access",
                    "product_inquiry",
                    "technical_support",
                    "billing",
                    "other"
                ]
            },
            "urgency": {
                "type": "string",
                "enum": ["low", "medium", "high", "critical"]
            },
            "sentiment": {
                "type": "string",
                "enum": ["angry", "frustrated", "neutral", "satisfied"]
            },
            "confidence": {
                "type": "number",
                "minimum": 0,
                "maximum": 1
            },
            "key_information": {
                "type": "array",
                "items": { "type": "string" }
            },
            "suggested_action": {
                "type": "string"
            }
        },
        "required": [
            "category",
            "urgency",
            "sentiment",
            "confidence",
            "key_information",
            "suggested_action"
        ],
        "additionalProperties": false
    })
}

/// Wrap the schema in the provider's `response_format` envelope
pub fn response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": SCHEMA_NAME,
            "strict": true,
            "schema": classification_schema()
        }
    })
}
