//! Supervision registry port
//!
//! The registry is the external record of projects, runs, tools,
//! supervisors and every decision they made. It is also the only source of
//! stable ids correlating a provider-native tool call with the registered
//! tool it targets.
//!
//! Implementations are stateless handles shared through `Arc` and may be
//! used by several runs at once.

use crate::ports::provider_adapter::ChatFormat;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use toolwarden_domain::{
    ChainId, ProjectId, RunId, SupervisionDecision, SupervisionRequestId, SupervisorChain,
    SupervisorId, SupervisorKind, TaskId, Tool, ToolCallId, ToolId, ToolSpecification,
};

/// Errors talking to the registry
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry request failed: {0}")]
    Transport(String),

    #[error("Registry returned {status} for {path}: {body}")]
    Status {
        status: u16,
        path: String,
        body: String,
    },

    #[error("Could not decode registry response: {0}")]
    Decode(String),

    #[error("Unknown {kind}: {id}")]
    NotFound { kind: &'static str, id: String },
}

/// What the registry needs to know about a supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorRegistration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: SupervisorKind,
}

impl SupervisorRegistration {
    pub fn new(name: impl Into<String>, kind: SupervisorKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Registry ids of one logged tool call.
///
/// `tool_id` is absent when the registry does not know the called tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallIds {
    pub tool_call_id: ToolCallId,
    #[serde(default)]
    pub tool_id: Option<ToolId>,
}

/// Registry ids of one choice of a logged response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceIds {
    pub choice_id: String,
    pub message_id: String,
    #[serde(default)]
    pub tool_call_ids: Vec<ToolCallIds>,
}

/// Ids handed out by [`SupervisionRegistry::log_interaction`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InteractionIds {
    pub chat_id: String,
    #[serde(default)]
    pub choice_ids: Vec<ChoiceIds>,
}

impl InteractionIds {
    /// Tool call ids of every choice, in response order.
    pub fn tool_calls(&self) -> impl Iterator<Item = &ToolCallIds> {
        self.choice_ids.iter().flat_map(|c| c.tool_call_ids.iter())
    }

    pub fn first_choice(&self) -> Option<&ChoiceIds> {
        self.choice_ids.first()
    }
}

/// Port for the supervision registry
#[async_trait]
pub trait SupervisionRegistry: Send + Sync {
    async fn register_project(&self, name: &str) -> Result<ProjectId, RegistryError>;

    async fn register_task(&self, project: &ProjectId, name: &str) -> Result<TaskId, RegistryError>;

    async fn register_run(&self, task: &TaskId, name: &str) -> Result<RunId, RegistryError>;

    async fn register_tool(
        &self,
        run: &RunId,
        spec: &ToolSpecification,
    ) -> Result<ToolId, RegistryError>;

    async fn register_supervisor(
        &self,
        project: &ProjectId,
        registration: &SupervisorRegistration,
    ) -> Result<SupervisorId, RegistryError>;

    /// Attach chains to a tool. Each inner list is one chain in order.
    async fn register_supervisor_chains(
        &self,
        tool: &ToolId,
        chains: &[Vec<SupervisorId>],
    ) -> Result<(), RegistryError>;

    async fn get_supervisor_chains(
        &self,
        tool: &ToolId,
    ) -> Result<Vec<SupervisorChain>, RegistryError>;

    async fn get_tool(&self, tool: &ToolId) -> Result<Tool, RegistryError>;

    /// Persist a raw request/response pair and return ids for its tool calls.
    async fn log_interaction(
        &self,
        run: &RunId,
        format: ChatFormat,
        request: &Value,
        response: &Value,
    ) -> Result<InteractionIds, RegistryError>;

    async fn send_supervision_request(
        &self,
        tool_call: &ToolCallId,
        supervisor: &SupervisorId,
        chain: &ChainId,
        position: usize,
    ) -> Result<SupervisionRequestId, RegistryError>;

    async fn send_supervision_result(
        &self,
        tool_call: &ToolCallId,
        request: &SupervisionRequestId,
        decision: &SupervisionDecision,
    ) -> Result<(), RegistryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_interaction_ids_wire_shape() {
        let ids: InteractionIds = serde_json::from_value(json!({
            "chat_id": "chat-1",
            "choice_ids": [{
                "choice_id": "choice-1",
                "message_id": "msg-1",
                "tool_call_ids": [
                    {"tool_call_id": "tc-1", "tool_id": "tool-1"},
                    {"tool_call_id": "tc-2"}
                ]
            }]
        }))
        .unwrap();
        let calls: Vec<&str> = ids.tool_calls().map(|t| t.tool_call_id.as_str()).collect();
        assert_eq!(calls, vec!["tc-1", "tc-2"]);
        assert!(ids.tool_calls().nth(1).is_some_and(|t| t.tool_id.is_none()));
        assert_eq!(ids.first_choice().map(|c| c.message_id.as_str()), Some("msg-1"));
    }

    #[test]
    fn test_registration_serializes_kind_as_type() {
        let registration = SupervisorRegistration::new("human_review", SupervisorKind::Human);
        assert_eq!(
            serde_json::to_value(&registration).unwrap(),
            json!({"name": "human_review", "description": "", "type": "human"})
        );
    }
}
