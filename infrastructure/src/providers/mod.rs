//! Provider adapters
//!
//! One [`ProviderAdapter`] per model provider wire format. The adapter is
//! chosen from configuration through [`adapter_for`]; payloads are never
//! sniffed to guess their provider.
//!
//! | Provider  | Tool calls live in                                   |
//! |-----------|------------------------------------------------------|
//! | OpenAI    | `choices[0].message.tool_calls[*].function`          |
//! | Anthropic | `content[*]` blocks with `type = "tool_use"`         |
//! | Gemini    | `candidates[0].content.parts[*].functionCall`        |

mod anthropic;
mod gemini;
mod openai;

pub use anthropic::AnthropicAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use toolwarden_application::{AdapterError, ChatFormat, ProviderAdapter};

/// Supported model providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }

    pub fn chat_format(&self) -> ChatFormat {
        match self {
            ProviderKind::OpenAi => ChatFormat::OpenAi,
            ProviderKind::Anthropic => ChatFormat::Anthropic,
            ProviderKind::Gemini => ChatFormat::Gemini,
        }
    }

    /// Environment variable holding the API key by default.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "open_ai" => Ok(ProviderKind::OpenAi),
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            _ => Err(format!(
                "Invalid provider: {}. Valid options: openai, anthropic, gemini",
                s
            )),
        }
    }
}

impl From<ChatFormat> for ProviderKind {
    fn from(format: ChatFormat) -> Self {
        match format {
            ChatFormat::OpenAi => ProviderKind::OpenAi,
            ChatFormat::Anthropic => ProviderKind::Anthropic,
            ChatFormat::Gemini => ProviderKind::Gemini,
        }
    }
}

/// The adapter for `kind`.
pub fn adapter_for(kind: ProviderKind) -> Arc<dyn ProviderAdapter> {
    match kind {
        ProviderKind::OpenAi => Arc::new(OpenAiAdapter),
        ProviderKind::Anthropic => Arc::new(AnthropicAdapter),
        ProviderKind::Gemini => Arc::new(GeminiAdapter),
    }
}

fn malformed(provider: &'static str, reason: impl Into<String>) -> AdapterError {
    AdapterError::MalformedResponse {
        provider,
        reason: reason.into(),
    }
}

/// Arguments must be a JSON object; `null` counts as no arguments.
fn object_arguments(call_id: &str, value: &Value) -> Result<Map<String, Value>, AdapterError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(AdapterError::InvalidArguments {
            call_id: call_id.to_string(),
            reason: format!("expected an object, got {}", other),
        }),
    }
}
