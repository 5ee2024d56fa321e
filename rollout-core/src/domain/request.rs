//! Validated rollout request

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::dto::init::{InitRequest, Message};

/// Reasons a raw init request is rejected before any work starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("metadata.rollout_id is required")]
    MissingRolloutId,

    #[error("messages is required")]
    MissingMessages,

    #[error("model is required in completion_params")]
    MissingModel,
}

/// A rollout request that passed validation
///
/// Owns exactly what a worker needs; the raw request is consumed.
#[derive(Debug, Clone)]
pub struct RolloutRequest {
    pub rollout_id: String,
    pub messages: Vec<Message>,
    pub completion_params: Map<String, JsonValue>,
    pub tools: Option<Vec<JsonValue>>,
    pub model_base_url: Option<String>,
    model: String,
}

impl RolloutRequest {
    /// Checks the invariants of a raw request
    ///
    /// Rejects an empty rollout id, missing or empty `messages`, and a
    /// `completion_params.model` that is absent, null, empty or not a string.
    pub fn validate(raw: InitRequest) -> Result<Self, ValidationError> {
        if raw.metadata.rollout_id.trim().is_empty() {
            return Err(ValidationError::MissingRolloutId);
        }

        let messages = match raw.messages {
            Some(messages) if !messages.is_empty() => messages,
            _ => return Err(ValidationError::MissingMessages),
        };

        let model = match raw.completion_params.get("model") {
            Some(JsonValue::String(model)) if !model.is_empty() => model.clone(),
            _ => return Err(ValidationError::MissingModel),
        };

        Ok(Self {
            rollout_id: raw.metadata.rollout_id,
            messages,
            completion_params: raw.completion_params,
            tools: raw.tools,
            model_base_url: raw.model_base_url,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Builds the body of the completion call
    ///
    /// `messages` goes in first and `completion_params` is spread over it, so
    /// a `messages` key in the params takes precedence. `tools` is added only
    /// when non-empty.
    pub fn completion_kwargs(&self) -> Result<Map<String, JsonValue>, serde_json::Error> {
        let mut kwargs = Map::new();
        kwargs.insert("messages".to_string(), serde_json::to_value(&self.messages)?);

        for (key, value) in &self.completion_params {
            kwargs.insert(key.clone(), value.clone());
        }

        if let Some(tools) = self.tools.as_ref().filter(|tools| !tools.is_empty()) {
            kwargs.insert("tools".to_string(), JsonValue::Array(tools.clone()));
        }

        Ok(kwargs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::init::RolloutMetadata;
    use serde_json::json;

    fn raw_request(messages: Option<Vec<Message>>, params: JsonValue) -> InitRequest {
        InitRequest {
            metadata: RolloutMetadata::new("r-1"),
            messages,
            completion_params: params.as_object().cloned().unwrap_or_default(),
            tools: None,
            model_base_url: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        let req = RolloutRequest::validate(raw_request(
            Some(vec![Message::user("hi")]),
            json!({ "model": "m" }),
        ))
        .unwrap();

        assert_eq!(req.rollout_id, "r-1");
        assert_eq!(req.model(), "m");
        assert_eq!(req.messages.len(), 1);
    }

    #[test]
    fn test_validate_missing_messages() {
        let err = RolloutRequest::validate(raw_request(None, json!({ "model": "m" }))).unwrap_err();
        assert_eq!(err, ValidationError::MissingMessages);

        let err =
            RolloutRequest::validate(raw_request(Some(vec![]), json!({ "model": "m" }))).unwrap_err();
        assert_eq!(err, ValidationError::MissingMessages);
    }

    #[test]
    fn test_validate_missing_model() {
        let messages = Some(vec![Message::user("hi")]);

        for params in [
            json!({}),
            json!({ "model": null }),
            json!({ "model": "" }),
            json!({ "model": 7 }),
            json!({ "temperature": 0.2 }),
        ] {
            let err = RolloutRequest::validate(raw_request(messages.clone(), params)).unwrap_err();
            assert_eq!(err, ValidationError::MissingModel);
        }
    }

    #[test]
    fn test_validate_missing_rollout_id() {
        let mut raw = raw_request(Some(vec![Message::user("hi")]), json!({ "model": "m" }));
        raw.metadata.rollout_id = "  ".to_string();

        let err = RolloutRequest::validate(raw).unwrap_err();
        assert_eq!(err, ValidationError::MissingRolloutId);
    }

    #[test]
    fn test_messages_checked_before_model() {
        let err = RolloutRequest::validate(raw_request(Some(vec![]), json!({}))).unwrap_err();
        assert_eq!(err, ValidationError::MissingMessages);
    }

    #[test]
    fn test_completion_kwargs_merge() {
        let mut raw = raw_request(
            Some(vec![Message::user("hi")]),
            json!({ "model": "m", "temperature": 0.5, "max_tokens": 64 }),
        );
        raw.tools = Some(vec![json!({ "type": "function", "function": { "name": "lookup" } })]);

        let kwargs = RolloutRequest::validate(raw).unwrap().completion_kwargs().unwrap();

        assert_eq!(kwargs["model"], "m");
        assert_eq!(kwargs["temperature"], 0.5);
        assert_eq!(kwargs["max_tokens"], 64);
        assert_eq!(kwargs["messages"], json!([{ "role": "user", "content": "hi" }]));
        assert_eq!(kwargs["tools"][0]["function"]["name"], "lookup");
    }

    #[test]
    fn test_completion_kwargs_params_override_messages() {
        let raw = raw_request(
            Some(vec![Message::user("hi")]),
            json!({ "model": "m", "messages": [{ "role": "system", "content": "x" }] }),
        );

        let kwargs = RolloutRequest::validate(raw).unwrap().completion_kwargs().unwrap();
        assert_eq!(kwargs["messages"][0]["role"], "system");
    }

    #[test]
    fn test_completion_kwargs_skips_empty_tools() {
        let mut raw = raw_request(Some(vec![Message::user("hi")]), json!({ "model": "m" }));
        raw.tools = Some(vec![]);

        let kwargs = RolloutRequest::validate(raw).unwrap().completion_kwargs().unwrap();
        assert!(!kwargs.contains_key("tools"));
    }

    #[test]
    fn test_completion_kwargs_keeps_null_content() {
        let messages: Vec<Message> = serde_json::from_value(json!([
            { "role": "user", "content": "weather?" },
            {
                "role": "assistant",
                "content": null,
                "tool_calls": [{ "id": "call_1", "type": "function" }]
            }
        ]))
        .unwrap();
        let raw = raw_request(Some(messages), json!({ "model": "m" }));

        let kwargs = RolloutRequest::validate(raw).unwrap().completion_kwargs().unwrap();
        assert_eq!(
            kwargs["messages"][1],
            json!({
                "role": "assistant",
                "content": null,
                "tool_calls": [{ "id": "call_1", "type": "function" }]
            })
        );
    }
}
