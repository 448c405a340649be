//! Anthropic messages adapter

use super::{malformed, object_arguments};
use serde_json::{Value, json};
use toolwarden_application::{AdapterError, ChatFormat, ProviderAdapter};
use toolwarden_domain::ToolCall;

const PROVIDER: &str = "anthropic";

/// Adapter for Anthropic `message` objects: tool calls are `tool_use`
/// content blocks with an object `input`.
pub struct AnthropicAdapter;

fn is_tool_use(block: &Value) -> bool {
    block["type"] == "tool_use"
}

impl ProviderAdapter for AnthropicAdapter {
    fn chat_format(&self) -> ChatFormat {
        ChatFormat::Anthropic
    }

    fn extract_tool_calls(&self, response: &Value) -> Result<Vec<ToolCall>, AdapterError> {
        let blocks = response["content"]
            .as_array()
            .ok_or_else(|| malformed(PROVIDER, "content is not a list"))?;

        blocks
            .iter()
            .filter(|b| is_tool_use(b))
            .map(|block| {
                let id = block["id"]
                    .as_str()
                    .ok_or_else(|| malformed(PROVIDER, "tool_use block without id"))?;
                let name = block["name"]
                    .as_str()
                    .ok_or_else(|| malformed(PROVIDER, format!("tool_use block {} without name", id)))?;
                Ok(ToolCall::new(id, name)
                    .with_parameters(object_arguments(id, &block["input"])?)
                    .with_provider_native(block.clone()))
            })
            .collect()
    }

    fn upsert_tool_call(&self, response: &Value, call: &ToolCall) -> Result<Value, AdapterError> {
        let mut out = response.clone();
        let blocks = out
            .get_mut("content")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| malformed(PROVIDER, "content is not a list"))?;

        match blocks
            .iter_mut()
            .find(|b| is_tool_use(b) && b["id"] == call.id.as_str())
        {
            Some(existing) => {
                existing["name"] = json!(call.tool_name);
                existing["input"] = Value::Object(call.parameters.clone());
            }
            None => blocks.push(json!({
                "type": "tool_use",
                "id": call.id,
                "name": call.tool_name,
                "input": call.parameters,
            })),
        }
        Ok(out)
    }

    fn generate_synthetic_response(&self, text: &str) -> Value {
        json!({
            "id": format!("msg_{}", uuid::Uuid::new_v4().simple()),
            "type": "message",
            "role": "assistant",
            "model": "supervisor",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn",
            "stop_sequence": null,
            "usage": {"input_tokens": 0, "output_tokens": 0}
        })
    }

    fn generate_fallback_tool_call(&self, response: &Value) -> ToolCall {
        let text: Vec<&str> = response["content"]
            .as_array()
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "text")
                    .filter_map(|b| b["text"].as_str())
                    .collect()
            })
            .unwrap_or_default();
        let id = response["id"].as_str().unwrap_or_default().to_string();
        ToolCall::chat(id, text.join("\n")).with_provider_native(response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_response() -> Value {
        json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet",
            "content": [
                {"type": "text", "text": "Let me check the weather."},
                {
                    "type": "tool_use",
                    "id": "toolu_01",
                    "name": "get_weather",
                    "input": {"location": "London", "unit": "C"}
                }
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 20, "output_tokens": 12}
        })
    }

    #[test]
    fn test_extract() {
        let calls = AnthropicAdapter.extract_tool_calls(&weather_response()).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "toolu_01");
        assert_eq!(calls[0].get_str("location"), Some("London"));
    }

    #[test]
    fn test_extract_rejects_non_object_input() {
        let mut response = weather_response();
        response["content"][1]["input"] = json!("London");
        assert!(matches!(
            AnthropicAdapter.extract_tool_calls(&response),
            Err(AdapterError::InvalidArguments { .. })
        ));
    }

    #[test]
    fn test_round_trip_preserves_unrelated_fields() {
        let response = weather_response();
        let call = AnthropicAdapter.extract_tool_calls(&response).unwrap().remove(0);
        let modified = call.clone().with_param("unit", "F");

        let out = AnthropicAdapter.upsert_tool_call(&response, &modified).unwrap();

        let blocks = out["content"].as_array().unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], response["content"][0]);
        assert_eq!(blocks[1]["input"], json!({"location": "London", "unit": "F"}));
        assert_eq!(blocks[1]["id"], "toolu_01");
        assert_eq!(out["usage"], response["usage"]);
        assert_eq!(out["stop_reason"], "tool_use");
    }

    #[test]
    fn test_upsert_appends_when_absent() {
        let response = json!({"id": "msg_02", "content": [{"type": "text", "text": "Hi"}]});
        let call = ToolCall::new("toolu_new", "get_time");
        let out = AnthropicAdapter.upsert_tool_call(&response, &call).unwrap();
        assert_eq!(out["content"].as_array().unwrap().len(), 2);
        assert_eq!(out["content"][1]["type"], "tool_use");
        assert_eq!(out["content"][1]["input"], json!({}));
    }

    #[test]
    fn test_fallback_collects_text() {
        let response = json!({
            "id": "msg_03",
            "content": [{"type": "text", "text": "Hello"}, {"type": "text", "text": "there"}]
        });
        let call = AnthropicAdapter.generate_fallback_tool_call(&response);
        assert!(call.is_chat());
        assert_eq!(call.id, "msg_03");
        assert_eq!(call.get_str("message"), Some("Hello\nthere"));
    }

    #[test]
    fn test_synthetic_is_plain_text() {
        let synthetic = AnthropicAdapter.generate_synthetic_response("no");
        assert_eq!(synthetic["content"][0]["text"], "no");
        assert!(AnthropicAdapter.extract_tool_calls(&synthetic).unwrap().is_empty());
    }
}
