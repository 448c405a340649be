//! Per-run supervision state
//!
//! [`SupervisionContext`] is owned by one run. The engine replaces the
//! conversation between decision passes; supervisors only ever get a shared
//! reference.

use crate::ports::supervisor::Supervisor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use toolwarden_domain::{Message, RunId, SupervisorId, Tool, ToolId};

#[derive(Clone, Default)]
pub struct SupervisionContext {
    run_id: Option<RunId>,
    messages: Vec<Message>,
    supervisors: HashMap<SupervisorId, Arc<dyn Supervisor>>,
    tools: HashMap<ToolId, Tool>,
    tool_ids: HashMap<String, ToolId>,
    chat_tool: Option<ToolId>,
}

impl SupervisionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn run_id(&self) -> Option<&RunId> {
        self.run_id.as_ref()
    }

    // ==================== Conversation ====================

    /// The conversation as of the latest decision pass.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    // ==================== Supervisors ====================

    pub fn register_supervisor(&mut self, id: SupervisorId, supervisor: Arc<dyn Supervisor>) {
        self.supervisors.insert(id, supervisor);
    }

    pub fn supervisor(&self, id: &SupervisorId) -> Option<&Arc<dyn Supervisor>> {
        self.supervisors.get(id)
    }

    pub fn supervisor_count(&self) -> usize {
        self.supervisors.len()
    }

    // ==================== Tools ====================

    pub fn register_tool(&mut self, tool: Tool) {
        self.tool_ids.insert(tool.name.clone(), tool.id.clone());
        self.tools.insert(tool.id.clone(), tool);
    }

    pub fn tool(&self, id: &ToolId) -> Option<&Tool> {
        self.tools.get(id)
    }

    pub fn tool_id_by_name(&self, name: &str) -> Option<&ToolId> {
        self.tool_ids.get(name)
    }

    /// Mark the registered pseudo tool that carries the chat supervisors.
    pub fn set_chat_tool(&mut self, tool: Tool) {
        self.chat_tool = Some(tool.id.clone());
        self.register_tool(tool);
    }

    pub fn chat_tool(&self) -> Option<&ToolId> {
        self.chat_tool.as_ref()
    }

    pub fn has_chat_supervisors(&self) -> bool {
        self.chat_tool.is_some()
    }
}

impl fmt::Debug for SupervisionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut supervisors: Vec<&str> = self.supervisors.keys().map(|id| id.as_str()).collect();
        supervisors.sort_unstable();
        f.debug_struct("SupervisionContext")
            .field("run_id", &self.run_id)
            .field("messages", &self.messages.len())
            .field("supervisors", &supervisors)
            .field("tools", &self.tool_ids)
            .field("chat_tool", &self.chat_tool)
            .finish()
    }
}
