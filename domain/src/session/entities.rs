//! Conversation entities

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in the supervised conversation (Entity)
///
/// `content` stays in the provider's own shape (a plain string for most
/// turns, a list of content blocks for multimodal or tool-result turns).
/// Extra provider fields such as `tool_calls` or `tool_call_id` are kept in
/// `extra` so a message survives a round trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<Value>) -> Self {
        Self {
            role,
            content: content.into(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into())
    }

    /// Text of the message when the content is a plain string, or the
    /// concatenated `text` fields of its content blocks.
    pub fn text(&self) -> Option<String> {
        match &self.content {
            Value::String(s) => Some(s.clone()),
            Value::Array(blocks) => {
                let text: Vec<&str> = blocks
                    .iter()
                    .filter_map(|b| b.get("text").and_then(Value::as_str))
                    .collect();
                if text.is_empty() {
                    None
                } else {
                    Some(text.join(""))
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_in_chat_shape() {
        let message = Message::assistant("Please try again");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"role": "assistant", "content": "Please try again"})
        );
    }

    #[test]
    fn test_round_trips_extra_fields() {
        let raw = json!({
            "role": "tool",
            "content": "18 degrees",
            "tool_call_id": "call_1"
        });
        let message: Message = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.extra.get("tool_call_id"), Some(&json!("call_1")));
        assert_eq!(serde_json::to_value(&message).unwrap(), raw);
    }

    #[test]
    fn test_text_from_blocks() {
        let message = Message::new(
            Role::User,
            json!([{"type": "text", "text": "Hello "}, {"type": "text", "text": "world"}]),
        );
        assert_eq!(message.text().as_deref(), Some("Hello world"));
        assert_eq!(Message::new(Role::User, json!(null)).text(), None);
    }
}
