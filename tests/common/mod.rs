//! Shared test doubles.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use meraki_assistant::{ApiGateway, ErrorPayload, GatewayResult, Method};

/// In-memory gateway answering from a path -> result table.
///
/// Unknown paths answer `HTTP 404`. Every request path is recorded in order.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: HashMap<String, GatewayResult>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, path: &str, value: Value) -> Self {
        self.responses.insert(path.to_string(), Ok(value));
        self
    }

    pub fn fail(mut self, path: &str, payload: ErrorPayload) -> Self {
        self.responses.insert(path.to_string(), Err(payload));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ApiGateway for ScriptedGateway {
    async fn request(&self, _method: Method, path: &str, _body: Option<Value>) -> GatewayResult {
        self.calls.lock().unwrap().push(path.to_string());
        self.responses
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(ErrorPayload::http(404, "Not Found")))
    }
}
