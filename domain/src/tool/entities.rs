//! Tool domain entities

use crate::core::ids::ToolId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the pseudo tool used to supervise plain chat replies.
pub const CHAT_TOOL_NAME: &str = "chat";

/// A normalized pending tool invocation.
///
/// Built by a provider adapter from a model response. The call is never
/// mutated in place once supervision starts: a MODIFY decision carries a
/// fresh `ToolCall` (see [`ToolCall::with_replaced_parameters`]) so the
/// original stays available for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned identifier (e.g. "call_abc123", "toolu_01...")
    pub id: String,
    /// Name of the requested tool
    pub tool_name: String,
    /// Arguments in the order the model produced them
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Provider-native entry the call was read from. Only provider adapters
    /// look inside it.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub provider_native: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, tool_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tool_name: tool_name.into(),
            parameters: Map::new(),
            provider_native: Value::Null,
        }
    }

    /// Pseudo call wrapping a free-text reply so chat supervisors can run.
    pub fn chat(id: impl Into<String>, message: impl Into<Value>) -> Self {
        Self::new(id, CHAT_TOOL_NAME).with_param("message", message)
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_provider_native(mut self, native: Value) -> Self {
        self.provider_native = native;
        self
    }

    /// Derive a new call with the same identity but different arguments.
    pub fn with_replaced_parameters(&self, parameters: Map<String, Value>) -> Self {
        Self {
            id: self.id.clone(),
            tool_name: self.tool_name.clone(),
            parameters,
            provider_native: self.provider_native.clone(),
        }
    }

    pub fn is_chat(&self) -> bool {
        self.tool_name == CHAT_TOOL_NAME
    }

    /// Get a parameter value by name
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    /// Get a string parameter by name
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }

    /// Arguments rendered as compact JSON (feedback text, audit records).
    pub fn arguments_json(&self) -> String {
        Value::Object(self.parameters.clone()).to_string()
    }
}

impl std::fmt::Display for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.tool_name, self.arguments_json())
    }
}

/// What a tool looks like before the registry assigns it an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpecification {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments, when the integrator supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl ToolSpecification {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Specification of the pseudo tool that carries chat supervisors.
    pub fn chat() -> Self {
        Self::new(CHAT_TOOL_NAME, "Plain assistant message without a tool call")
    }
}

/// A registered, supervised tool. Read-only for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: ToolId,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl Tool {
    pub fn from_spec(id: ToolId, spec: &ToolSpecification) -> Self {
        Self {
            id,
            name: spec.name.clone(),
            description: spec.description.clone(),
            schema: spec.schema.clone(),
        }
    }
}
