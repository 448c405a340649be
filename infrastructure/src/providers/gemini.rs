//! Gemini generateContent adapter

use super::{malformed, object_arguments};
use serde_json::{Value, json};
use toolwarden_application::{AdapterError, ChatFormat, ProviderAdapter};
use toolwarden_domain::ToolCall;

const PROVIDER: &str = "gemini";

/// Adapter for `GenerateContentResponse` objects.
///
/// Older Gemini models omit function call ids; those calls are named
/// `call_{n}` after their position among the function calls.
pub struct GeminiAdapter;

fn call_id(function_call: &Value, ordinal: usize) -> String {
    function_call["id"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("call_{}", ordinal))
}

impl ProviderAdapter for GeminiAdapter {
    fn chat_format(&self) -> ChatFormat {
        ChatFormat::Gemini
    }

    fn extract_tool_calls(&self, response: &Value) -> Result<Vec<ToolCall>, AdapterError> {
        let candidate = response
            .pointer("/candidates/0")
            .ok_or_else(|| malformed(PROVIDER, "missing candidates[0]"))?;
        let Some(parts) = candidate.pointer("/content/parts").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        parts
            .iter()
            .filter_map(|p| p.get("functionCall"))
            .enumerate()
            .map(|(ordinal, fc)| {
                let id = call_id(fc, ordinal);
                let name = fc["name"]
                    .as_str()
                    .ok_or_else(|| malformed(PROVIDER, format!("function call {} without name", id)))?;
                let parameters = object_arguments(&id, &fc["args"])?;
                Ok(ToolCall::new(id, name)
                    .with_parameters(parameters)
                    .with_provider_native(fc.clone()))
            })
            .collect()
    }

    fn upsert_tool_call(&self, response: &Value, call: &ToolCall) -> Result<Value, AdapterError> {
        let mut out = response.clone();
        let content = out
            .pointer_mut("/candidates/0/content")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| malformed(PROVIDER, "missing candidates[0].content"))?;
        let parts = content
            .entry("parts")
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or_else(|| malformed(PROVIDER, "parts is not a list"))?;

        let mut ordinal = 0;
        let mut existing = None;
        for (i, part) in parts.iter().enumerate() {
            if let Some(fc) = part.get("functionCall") {
                if call_id(fc, ordinal) == call.id {
                    existing = Some(i);
                    break;
                }
                ordinal += 1;
            }
        }

        match existing {
            Some(i) => {
                let fc = &mut parts[i]["functionCall"];
                fc["name"] = json!(call.tool_name);
                fc["args"] = Value::Object(call.parameters.clone());
            }
            None => parts.push(json!({
                "functionCall": {
                    "id": call.id,
                    "name": call.tool_name,
                    "args": call.parameters,
                }
            })),
        }
        Ok(out)
    }

    fn generate_synthetic_response(&self, text: &str) -> Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP",
                "index": 0
            }],
            "responseId": uuid::Uuid::new_v4().to_string()
        })
    }

    fn generate_fallback_tool_call(&self, response: &Value) -> ToolCall {
        let text: Vec<&str> = response
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();
        let id = response["responseId"].as_str().unwrap_or_default().to_string();
        ToolCall::chat(id, text.join("")).with_provider_native(response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_response() -> Value {
        json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        {"text": "Checking."},
                        {"functionCall": {"name": "get_weather", "args": {"location": "London", "unit": "C"}}}
                    ]
                },
                "finishReason": "STOP",
                "safetyRatings": []
            }],
            "usageMetadata": {"totalTokenCount": 42}
        })
    }

    #[test]
    fn test_extract_assigns_positional_ids() {
        let calls = GeminiAdapter.extract_tool_calls(&weather_response()).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_0");
        assert_eq!(calls[0].get_str("unit"), Some("C"));
    }

    #[test]
    fn test_extract_keeps_native_ids() {
        let mut response = weather_response();
        response["candidates"][0]["content"]["parts"][1]["functionCall"]["id"] = json!("fc-9");
        let calls = GeminiAdapter.extract_tool_calls(&response).unwrap();
        assert_eq!(calls[0].id, "fc-9");
    }

    #[test]
    fn test_round_trip_preserves_unrelated_fields() {
        let response = weather_response();
        let call = GeminiAdapter.extract_tool_calls(&response).unwrap().remove(0);
        let modified = call.clone().with_param("unit", "F");

        let out = GeminiAdapter.upsert_tool_call(&response, &modified).unwrap();

        let parts = out["candidates"][0]["content"]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], json!({"text": "Checking."}));
        assert_eq!(parts[1]["functionCall"]["args"]["unit"], "F");
        assert!(parts[1]["functionCall"].get("id").is_none());
        assert_eq!(out["usageMetadata"], response["usageMetadata"]);
        assert_eq!(out["candidates"][0]["safetyRatings"], json!([]));
    }

    #[test]
    fn test_fallback_and_synthetic() {
        let synthetic = GeminiAdapter.generate_synthetic_response("rejected");
        assert!(GeminiAdapter.extract_tool_calls(&synthetic).unwrap().is_empty());
        let fallback = GeminiAdapter.generate_fallback_tool_call(&synthetic);
        assert_eq!(fallback.get_str("message"), Some("rejected"));
    }
}
