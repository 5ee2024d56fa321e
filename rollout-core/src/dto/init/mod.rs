//! Init DTOs
//!
//! The raw body accepted by `POST /init`. It is deserialized as-is and only
//! becomes a [`RolloutRequest`](crate::domain::request::RolloutRequest) after
//! validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Request to initiate a rollout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitRequest {
    pub metadata: RolloutMetadata,

    /// Chat history to complete. Absent and empty are both rejected.
    #[serde(default)]
    pub messages: Option<Vec<Message>>,

    /// Provider parameters spread into the completion call (model, temperature, ...)
    #[serde(default)]
    pub completion_params: Map<String, JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<JsonValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_base_url: Option<String>,
}

/// Correlation ids supplied by the evaluation framework
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolloutMetadata {
    pub rollout_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_id: Option<String>,
}

impl RolloutMetadata {
    pub fn new(rollout_id: impl Into<String>) -> Self {
        Self {
            rollout_id: rollout_id.into(),
            ..Self::default()
        }
    }

    /// Metadata with a freshly generated rollout id
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

/// A chat message in OpenAI format
///
/// Only `role` and `content` are modelled; everything else (`tool_calls`,
/// `tool_call_id`, `name`, ...) is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,

    /// `null` for assistant turns that only carry tool calls
    #[serde(default)]
    pub content: Option<JsonValue>,

    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(JsonValue::String(content.into())),
            extra: Map::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_request() {
        let req: InitRequest = serde_json::from_str(
            r#"{"metadata": {"rollout_id": "r-1"}, "messages": [{"role": "user", "content": "hi"}]}"#,
        )
        .unwrap();

        assert_eq!(req.metadata.rollout_id, "r-1");
        assert_eq!(req.messages.unwrap()[0], Message::user("hi"));
        assert!(req.completion_params.is_empty());
        assert!(req.tools.is_none());
        assert!(req.model_base_url.is_none());
    }

    #[test]
    fn test_message_keeps_unknown_fields() {
        let raw = serde_json::json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{"id": "call_1", "type": "function"}]
        });
        let msg: Message = serde_json::from_value(raw).unwrap();

        assert_eq!(msg.role, "assistant");
        assert!(msg.extra.contains_key("tool_calls"));

        let back = serde_json::to_value(&msg).unwrap();
        assert_eq!(back["tool_calls"][0]["id"], "call_1");
        assert_eq!(back.get("content"), Some(&JsonValue::Null));
    }

    #[test]
    fn test_generated_metadata_ids_differ() {
        let a = RolloutMetadata::generate();
        let b = RolloutMetadata::generate();
        assert!(!a.rollout_id.is_empty());
        assert_ne!(a.rollout_id, b.rollout_id);
    }
}
