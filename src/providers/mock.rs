/*!
 * Scripted mock backend for testing.
 *
 * Replies are queued up front and handed out in order, one per `invoke`:
 * - `push_completion` - a successful completion carrying the given text
 * - `push_error` - a transport or API failure
 * - `with_default_reply` - what to answer once the queue is empty
 *
 * Every request and model load is recorded for later assertions.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::VecDeque;

use crate::errors::ProviderError;
use crate::providers::Backend;

/// A request the mock received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Endpoint it was sent to
    pub endpoint: String,
    /// Full JSON payload
    pub payload: Value,
}

impl RecordedRequest {
    /// The prompt text, whichever endpoint shape was used
    pub fn prompt(&self) -> Option<&str> {
        if let Some(prompt) = self.payload.get("prompt").and_then(Value::as_str) {
            return Some(prompt);
        }
        self.payload
            .get("messages")
            .and_then(Value::as_array)
            .and_then(|messages| messages.last())
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
    }
}

/// Mock backend replaying scripted replies
#[derive(Debug, Default)]
pub struct MockBackend {
    /// Model the mock reports as loaded
    loaded: Mutex<Option<String>>,
    /// Scripted replies, consumed front first
    replies: Mutex<VecDeque<Result<Value, ProviderError>>>,
    /// Reply used once the script is exhausted
    default_reply: Option<String>,
    /// Whether model loads fail
    fail_loads: bool,
    /// Requests received so far
    requests: Mutex<Vec<RecordedRequest>>,
    /// Models loaded so far, in order
    loads: Mutex<Vec<String>>,
}

impl MockBackend {
    /// Create a mock with an empty script and no model loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `model` as already loaded
    pub fn with_loaded_model(self, model: &str) -> Self {
        *self.loaded.lock() = Some(model.to_string());
        self
    }

    /// Answer with `text` whenever the script is empty
    pub fn with_default_reply(mut self, text: &str) -> Self {
        self.default_reply = Some(text.to_string());
        self
    }

    /// Make every model load fail
    pub fn failing_loads(mut self) -> Self {
        self.fail_loads = true;
        self
    }

    /// Build a completion body that satisfies both the chat and the plain endpoint shape
    pub fn completion_body(text: &str) -> Value {
        json!({
            "choices": [{
                "text": text,
                "message": {"role": "assistant", "content": text}
            }]
        })
    }

    /// Queue a successful completion
    pub fn push_completion(&self, text: &str) -> &Self {
        self.replies.lock().push_back(Ok(Self::completion_body(text)));
        self
    }

    /// Queue a raw JSON body
    pub fn push_raw(&self, body: Value) -> &Self {
        self.replies.lock().push_back(Ok(body));
        self
    }

    /// Queue a failure
    pub fn push_error(&self, error: ProviderError) -> &Self {
        self.replies.lock().push_back(Err(error));
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    /// Number of `invoke` calls so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Models loaded so far, in load order
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().clone()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn current_model(&self) -> Result<Option<String>, ProviderError> {
        Ok(self.loaded.lock().clone())
    }

    async fn load_model(&self, model_name: &str, _args: Option<Value>) -> Result<(), ProviderError> {
        if self.fail_loads {
            return Err(ProviderError::ModelLoad {
                model: model_name.to_string(),
                message: "mock load failure".to_string(),
            });
        }
        self.loads.lock().push(model_name.to_string());
        *self.loaded.lock() = Some(model_name.to_string());
        Ok(())
    }

    async fn invoke(&self, endpoint: &str, payload: Value) -> Result<Value, ProviderError> {
        self.requests.lock().push(RecordedRequest {
            endpoint: endpoint.to_string(),
            payload,
        });

        if let Some(reply) = self.replies.lock().pop_front() {
            return reply;
        }

        match &self.default_reply {
            Some(text) => Ok(Self::completion_body(text)),
            None => Err(ProviderError::ConnectionError("mock script exhausted".to_string())),
        }
    }
}
