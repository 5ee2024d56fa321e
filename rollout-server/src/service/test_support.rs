//! Scripted completion backend for unit tests

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::service::completion::{CompletionBackend, CompletionError, CompletionTarget};

pub enum Script {
    Respond(JsonValue),
    Fail(u16, &'static str),
    Panic,
    /// Blocks until the notify fires, then responds with `{}`
    WaitFor(Arc<Notify>),
}

pub struct ScriptedBackend {
    script: Script,
    calls: Mutex<Vec<(CompletionTarget, Map<String, JsonValue>)>>,
}

impl ScriptedBackend {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(CompletionTarget, Map<String, JsonValue>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn create(
        &self,
        target: &CompletionTarget,
        kwargs: &Map<String, JsonValue>,
    ) -> Result<JsonValue, CompletionError> {
        self.calls
            .lock()
            .unwrap()
            .push((target.clone(), kwargs.clone()));

        match &self.script {
            Script::Respond(value) => Ok(value.clone()),
            Script::Fail(status, body) => Err(CompletionError::Api {
                status: *status,
                body: body.to_string(),
            }),
            Script::Panic => panic!("scripted panic"),
            Script::WaitFor(notify) => {
                notify.notified().await;
                Ok(JsonValue::Object(Map::new()))
            }
        }
    }
}
