//! Model client port
//!
//! Used only by the resample loop to ask the model for a new response.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use toolwarden_domain::Message;

/// Errors that can occur while calling a model provider
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: set {0}")]
    MissingApiKey(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Arguments of one model invocation.
///
/// `params` holds everything besides the conversation (model name, tools,
/// temperature, ...) exactly as the caller passed them to the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRequest {
    pub messages: Vec<Message>,
    pub params: Map<String, Value>,
}

impl ModelRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            params: Map::new(),
        }
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Split a raw request payload into its messages and the other params.
    ///
    /// Messages that do not parse are dropped.
    pub fn from_payload(payload: &Value) -> Self {
        let mut params = payload.as_object().cloned().unwrap_or_default();
        let messages = params
            .remove("messages")
            .and_then(|m| serde_json::from_value::<Vec<Value>>(m).ok())
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| serde_json::from_value(m).ok())
            .collect();
        Self { messages, params }
    }

    /// The request as one JSON object, as it is logged to the registry.
    pub fn to_payload(&self) -> Value {
        let mut payload = self.params.clone();
        payload.insert(
            "messages".to_string(),
            serde_json::to_value(&self.messages).unwrap_or(Value::Array(Vec::new())),
        );
        Value::Object(payload)
    }
}

/// Port for invoking a model
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the request and return the provider-native response.
    async fn create(&self, request: &ModelRequest) -> Result<Value, ModelError>;
}
