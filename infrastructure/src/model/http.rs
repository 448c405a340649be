//! HTTP model client
//!
//! Speaks the three supported provider APIs directly over `reqwest`:
//!
//! | Provider  | Endpoint                                   | Auth header     |
//! |-----------|--------------------------------------------|-----------------|
//! | OpenAI    | `POST /v1/chat/completions`                | `Authorization` |
//! | Anthropic | `POST /v1/messages`                        | `x-api-key`     |
//! | Gemini    | `POST /v1beta/models/{model}:generateContent` | `x-goog-api-key` |

use crate::providers::ProviderKind;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value, json};
use std::time::Duration;
use toolwarden_application::{ModelClient, ModelError, ModelRequest};
use toolwarden_domain::{Message, Role};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_DEFAULT_MAX_TOKENS: u64 = 1024;

/// Model client for one provider.
#[derive(Debug, Clone)]
pub struct HttpModelClient {
    client: Client,
    kind: ProviderKind,
    base_url: String,
    api_key: String,
    model: Option<String>,
}

impl HttpModelClient {
    pub fn new(
        kind: ProviderKind,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client,
            kind,
            base_url: kind.default_base_url().to_string(),
            api_key: api_key.into(),
            model: None,
        })
    }

    /// Read the API key from `api_key_env`.
    pub fn from_env(kind: ProviderKind, api_key_env: &str, timeout: Duration) -> Result<Self, ModelError> {
        let key = std::env::var(api_key_env)
            .map_err(|_| ModelError::MissingApiKey(api_key_env.to_string()))?;
        Self::new(kind, key, timeout)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Model used when the request does not name one.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn model_for(&self, request: &ModelRequest) -> Option<String> {
        request
            .params
            .get("model")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.model.clone())
    }

    fn build(&self, request: &ModelRequest) -> Result<reqwest::RequestBuilder, ModelError> {
        let model = self.model_for(request);
        let builder = match self.kind {
            ProviderKind::OpenAi => self
                .client
                .post(format!("{}/v1/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&render_openai(request, model.as_deref())),
            ProviderKind::Anthropic => self
                .client
                .post(format!("{}/v1/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&render_anthropic(request, model.as_deref())),
            ProviderKind::Gemini => {
                let model = model.ok_or_else(|| {
                    ModelError::Other("Gemini requests need a model name".to_string())
                })?;
                self.client
                    .post(format!(
                        "{}/v1beta/models/{}:generateContent",
                        self.base_url, model
                    ))
                    .header("x-goog-api-key", &self.api_key)
                    .json(&render_gemini(request))
            }
        };
        Ok(builder)
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn create(&self, request: &ModelRequest) -> Result<Value, ModelError> {
        debug!(
            "{} request with {} messages",
            self.kind,
            request.messages.len()
        );
        let response = self
            .build(request)?
            .send()
            .await
            .map_err(|e| ModelError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))
    }
}

// ==================== Rendering ====================

fn params_without(request: &ModelRequest, skip: &[&str]) -> Map<String, Value> {
    request
        .params
        .iter()
        .filter(|(k, _)| !skip.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// OpenAI takes the conversation as-is.
pub fn render_openai(request: &ModelRequest, model: Option<&str>) -> Value {
    let mut payload = request.to_payload();
    if let (Some(model), Some(obj)) = (model, payload.as_object_mut()) {
        obj.entry("model").or_insert_with(|| json!(model));
    }
    payload
}

/// Anthropic keeps system prompts out of the message list and has no
/// `tool` role.
pub fn render_anthropic(request: &ModelRequest, model: Option<&str>) -> Value {
    let mut payload = params_without(request, &["messages", "system"]);
    let system: Vec<String> = request
        .messages
        .iter()
        .filter(|m| m.role == Role::System)
        .filter_map(Message::text)
        .collect();
    let messages: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = match m.role {
                Role::Assistant => "assistant",
                _ => "user",
            };
            json!({"role": role, "content": m.content})
        })
        .collect();

    if let Some(model) = model {
        payload.entry("model").or_insert_with(|| json!(model));
    }
    payload
        .entry("max_tokens")
        .or_insert_with(|| json!(ANTHROPIC_DEFAULT_MAX_TOKENS));
    if !system.is_empty() {
        payload.insert("system".to_string(), json!(system.join("\n")));
    } else if let Some(explicit) = request.params.get("system") {
        payload.insert("system".to_string(), explicit.clone());
    }
    payload.insert("messages".to_string(), Value::Array(messages));
    Value::Object(payload)
}

/// Gemini wants `contents` with `user`/`model` roles and text parts.
pub fn render_gemini(request: &ModelRequest) -> Value {
    let mut payload = params_without(request, &["messages", "model", "contents"]);
    let system: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role == Role::System)
        .filter_map(Message::text)
        .map(|text| json!({"text": text}))
        .collect();
    let contents: Vec<Value> = request
        .messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = if m.role == Role::Assistant { "model" } else { "user" };
            let parts = match &m.content {
                Value::Array(parts) => Value::Array(parts.clone()),
                _ => json!([{"text": m.text().unwrap_or_default()}]),
            };
            json!({"role": role, "parts": parts})
        })
        .collect();

    if !system.is_empty() {
        payload.insert("systemInstruction".to_string(), json!({"parts": system}));
    }
    payload.insert("contents".to_string(), Value::Array(contents));
    Value::Object(payload)
}
