//! Provider adapter port
//!
//! Every model provider shapes its responses differently. An adapter is the
//! only code that looks inside a provider-native response; the engine works
//! exclusively with [`ToolCall`]s.
//!
//! ```text
//! provider response ──extract_tool_calls──▶ [ToolCall] ──supervision──▶ ToolCall'
//!        ▲                                                                  │
//!        └──────────────────────upsert_tool_call◀───────────────────────────┘
//! ```

use serde_json::Value;
use std::fmt;
use thiserror::Error;
use toolwarden_domain::ToolCall;

/// Errors raised while reading or rebuilding a provider payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Malformed {provider} response: {reason}")]
    MalformedResponse {
        provider: &'static str,
        reason: String,
    },

    #[error("Invalid arguments for tool call {call_id}: {reason}")]
    InvalidArguments { call_id: String, reason: String },
}

/// Wire format tag sent to the registry with every logged interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatFormat {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ChatFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatFormat::OpenAi => "openai",
            ChatFormat::Anthropic => "anthropic",
            ChatFormat::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ChatFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts between one provider's response shape and [`ToolCall`]s.
///
/// Implementations must keep `extract → upsert(same id)` lossless: every
/// field unrelated to the call survives, and an existing call id is replaced
/// in place instead of appended a second time.
pub trait ProviderAdapter: Send + Sync {
    fn chat_format(&self) -> ChatFormat;

    /// Pending tool calls of a response, in the order the model emitted them.
    fn extract_tool_calls(&self, response: &Value) -> Result<Vec<ToolCall>, AdapterError>;

    /// Return a copy of `response` with `call` written into it.
    fn upsert_tool_call(&self, response: &Value, call: &ToolCall) -> Result<Value, AdapterError>;

    /// A response containing a single assistant text message.
    fn generate_synthetic_response(&self, text: &str) -> Value;

    /// Pseudo call carrying the response's text, used by chat supervisors.
    fn generate_fallback_tool_call(&self, response: &Value) -> ToolCall;
}
