//! OpenAI chat-completions adapter

use super::{malformed, object_arguments};
use serde_json::{Map, Value, json};
use toolwarden_application::{AdapterError, ChatFormat, ProviderAdapter};
use toolwarden_domain::ToolCall;

const PROVIDER: &str = "openai";

/// Adapter for `chat.completion` objects.
///
/// Arguments travel as a JSON-encoded string in `function.arguments`.
pub struct OpenAiAdapter;

impl OpenAiAdapter {
    fn message(response: &Value) -> Result<&Value, AdapterError> {
        response
            .pointer("/choices/0/message")
            .ok_or_else(|| malformed(PROVIDER, "missing choices[0].message"))
    }

    fn parse_arguments(call_id: &str, raw: &Value) -> Result<Map<String, Value>, AdapterError> {
        match raw {
            Value::String(s) if s.trim().is_empty() => Ok(Map::new()),
            Value::String(s) => {
                let parsed: Value =
                    serde_json::from_str(s).map_err(|e| AdapterError::InvalidArguments {
                        call_id: call_id.to_string(),
                        reason: e.to_string(),
                    })?;
                object_arguments(call_id, &parsed)
            }
            other => object_arguments(call_id, other),
        }
    }
}

impl ProviderAdapter for OpenAiAdapter {
    fn chat_format(&self) -> ChatFormat {
        ChatFormat::OpenAi
    }

    fn extract_tool_calls(&self, response: &Value) -> Result<Vec<ToolCall>, AdapterError> {
        let message = Self::message(response)?;
        let Some(entries) = message.get("tool_calls").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        entries
            .iter()
            .map(|entry| {
                let id = entry["id"]
                    .as_str()
                    .ok_or_else(|| malformed(PROVIDER, "tool call without id"))?;
                let name = entry
                    .pointer("/function/name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| malformed(PROVIDER, format!("tool call {} without name", id)))?;
                let arguments = entry
                    .pointer("/function/arguments")
                    .unwrap_or(&Value::Null);
                Ok(ToolCall::new(id, name)
                    .with_parameters(Self::parse_arguments(id, arguments)?)
                    .with_provider_native(entry.clone()))
            })
            .collect()
    }

    fn upsert_tool_call(&self, response: &Value, call: &ToolCall) -> Result<Value, AdapterError> {
        let mut out = response.clone();
        let message = out
            .pointer_mut("/choices/0/message")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| malformed(PROVIDER, "missing choices[0].message"))?;

        let entries = message
            .entry("tool_calls")
            .or_insert_with(|| Value::Array(Vec::new()));
        if entries.is_null() {
            *entries = Value::Array(Vec::new());
        }
        let entries = entries
            .as_array_mut()
            .ok_or_else(|| malformed(PROVIDER, "tool_calls is not a list"))?;

        let function = json!({
            "name": call.tool_name,
            "arguments": call.arguments_json(),
        });
        match entries.iter_mut().find(|e| e["id"] == call.id.as_str()) {
            Some(existing) => {
                existing["function"] = function;
            }
            None => entries.push(json!({
                "id": call.id,
                "type": "function",
                "function": function,
            })),
        }
        Ok(out)
    }

    fn generate_synthetic_response(&self, text: &str) -> Value {
        json!({
            "id": format!("chatcmpl-{}", uuid::Uuid::new_v4()),
            "object": "chat.completion",
            "created": chrono::Utc::now().timestamp(),
            "model": "supervisor",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": text},
                "finish_reason": "stop"
            }]
        })
    }

    fn generate_fallback_tool_call(&self, response: &Value) -> ToolCall {
        let message = response
            .pointer("/choices/0/message")
            .cloned()
            .unwrap_or(Value::Null);
        let text = message["content"].as_str().unwrap_or_default().to_string();
        let id = response["id"].as_str().unwrap_or_default().to_string();
        ToolCall::chat(id, text).with_provider_native(message)
    }
}
