//! In-process supervision registry
//!
//! Hands out deterministic ids (`project-1`, `tool-4`, ...) from a single
//! counter and keeps every logged interaction, supervision request and
//! result for inspection. Powers offline review and the integration tests.

use crate::providers::{ProviderKind, adapter_for};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use toolwarden_application::{
    ChatFormat, ChoiceIds, InteractionIds, RegistryError, SupervisionRegistry,
    SupervisorRegistration, ToolCallIds,
};
use toolwarden_domain::{
    ChainId, ProjectId, RunId, SupervisionDecision, SupervisionRequestId, SupervisorChain,
    SupervisorId, SupervisorInfo, TaskId, Tool, ToolCallId, ToolId, ToolSpecification,
};
use tracing::debug;

/// A logged request/response pair.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedInteraction {
    pub run_id: RunId,
    pub format: ChatFormat,
    pub request: Value,
    pub response: Value,
    pub ids: InteractionIds,
}

/// A supervision request as the registry saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub id: SupervisionRequestId,
    pub tool_call_id: ToolCallId,
    pub supervisor_id: SupervisorId,
    pub chain_id: ChainId,
    pub position: usize,
}

/// A supervision result as the registry saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedResult {
    pub tool_call_id: ToolCallId,
    pub request_id: SupervisionRequestId,
    pub decision: SupervisionDecision,
}

#[derive(Default)]
struct State {
    counter: u64,
    projects: HashMap<ProjectId, String>,
    tasks: HashMap<TaskId, ProjectId>,
    runs: HashMap<RunId, TaskId>,
    tools: HashMap<ToolId, Tool>,
    tools_by_name: HashMap<(RunId, String), ToolId>,
    supervisors: HashMap<SupervisorId, SupervisorInfo>,
    chains: HashMap<ToolId, Vec<SupervisorChain>>,
    interactions: Vec<LoggedInteraction>,
    requests: Vec<RecordedRequest>,
    results: Vec<RecordedResult>,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{}-{}", prefix, self.counter)
    }
}

fn not_found(kind: &'static str, id: impl ToString) -> RegistryError {
    RegistryError::NotFound {
        kind,
        id: id.to_string(),
    }
}

#[derive(Default)]
pub struct InMemoryRegistry {
    state: Mutex<State>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn interactions(&self) -> Vec<LoggedInteraction> {
        self.state().interactions.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    pub fn results(&self) -> Vec<RecordedResult> {
        self.state().results.clone()
    }

    /// Results recorded for one tool call, in order.
    pub fn results_for(&self, tool_call: &ToolCallId) -> Vec<SupervisionDecision> {
        self.state()
            .results
            .iter()
            .filter(|r| &r.tool_call_id == tool_call)
            .map(|r| r.decision.clone())
            .collect()
    }
}

#[async_trait]
impl SupervisionRegistry for InMemoryRegistry {
    async fn register_project(&self, name: &str) -> Result<ProjectId, RegistryError> {
        let mut state = self.state();
        let id = ProjectId::new(state.next_id("project"));
        state.projects.insert(id.clone(), name.to_string());
        Ok(id)
    }

    async fn register_task(&self, project: &ProjectId, _name: &str) -> Result<TaskId, RegistryError> {
        let mut state = self.state();
        if !state.projects.contains_key(project) {
            return Err(not_found("project", project));
        }
        let id = TaskId::new(state.next_id("task"));
        state.tasks.insert(id.clone(), project.clone());
        Ok(id)
    }

    async fn register_run(&self, task: &TaskId, _name: &str) -> Result<RunId, RegistryError> {
        let mut state = self.state();
        if !state.tasks.contains_key(task) {
            return Err(not_found("task", task));
        }
        let id = RunId::new(state.next_id("run"));
        state.runs.insert(id.clone(), task.clone());
        Ok(id)
    }

    async fn register_tool(
        &self,
        run: &RunId,
        spec: &ToolSpecification,
    ) -> Result<ToolId, RegistryError> {
        let mut state = self.state();
        if !state.runs.contains_key(run) {
            return Err(not_found("run", run));
        }
        let id = ToolId::new(state.next_id("tool"));
        state.tools.insert(id.clone(), Tool::from_spec(id.clone(), spec));
        state
            .tools_by_name
            .insert((run.clone(), spec.name.clone()), id.clone());
        Ok(id)
    }

    async fn register_supervisor(
        &self,
        project: &ProjectId,
        registration: &SupervisorRegistration,
    ) -> Result<SupervisorId, RegistryError> {
        let mut state = self.state();
        if !state.projects.contains_key(project) {
            return Err(not_found("project", project));
        }
        let id = SupervisorId::new(state.next_id("supervisor"));
        let info = SupervisorInfo::new(id.clone(), registration.name.clone(), registration.kind)
            .with_description(registration.description.clone());
        state.supervisors.insert(id.clone(), info);
        Ok(id)
    }

    async fn register_supervisor_chains(
        &self,
        tool: &ToolId,
        chains: &[Vec<SupervisorId>],
    ) -> Result<(), RegistryError> {
        let mut state = self.state();
        if !state.tools.contains_key(tool) {
            return Err(not_found("tool", tool));
        }

        let mut resolved = Vec::with_capacity(chains.len());
        for chain in chains {
            let supervisors = chain
                .iter()
                .map(|id| {
                    state
                        .supervisors
                        .get(id)
                        .cloned()
                        .ok_or_else(|| not_found("supervisor", id))
                })
                .collect::<Result<Vec<_>, _>>()?;
            let chain_id = ChainId::new(state.next_id("chain"));
            resolved.push(SupervisorChain::new(chain_id, supervisors));
        }
        state.chains.entry(tool.clone()).or_default().extend(resolved);
        Ok(())
    }

    async fn get_supervisor_chains(
        &self,
        tool: &ToolId,
    ) -> Result<Vec<SupervisorChain>, RegistryError> {
        let state = self.state();
        if !state.tools.contains_key(tool) {
            return Err(not_found("tool", tool));
        }
        Ok(state.chains.get(tool).cloned().unwrap_or_default())
    }

    async fn get_tool(&self, tool: &ToolId) -> Result<Tool, RegistryError> {
        self.state()
            .tools
            .get(tool)
            .cloned()
            .ok_or_else(|| not_found("tool", tool))
    }

    async fn log_interaction(
        &self,
        run: &RunId,
        format: ChatFormat,
        request: &Value,
        response: &Value,
    ) -> Result<InteractionIds, RegistryError> {
        let calls = adapter_for(ProviderKind::from(format))
            .extract_tool_calls(response)
            .map_err(|e| RegistryError::Decode(e.to_string()))?;

        let mut state = self.state();
        if !state.runs.contains_key(run) {
            return Err(not_found("run", run));
        }

        let mut tool_call_ids = Vec::with_capacity(calls.len());
        for call in &calls {
            let tool_id = state
                .tools_by_name
                .get(&(run.clone(), call.tool_name.clone()))
                .cloned();
            let tool_call_id = ToolCallId::new(state.next_id("tool_call"));
            debug!("logged {} as {} (tool {:?})", call, tool_call_id, tool_id);
            tool_call_ids.push(ToolCallIds {
                tool_call_id,
                tool_id,
            });
        }

        let ids = InteractionIds {
            chat_id: state.next_id("chat"),
            choice_ids: vec![ChoiceIds {
                choice_id: state.next_id("choice"),
                message_id: state.next_id("message"),
                tool_call_ids,
            }],
        };
        state.interactions.push(LoggedInteraction {
            run_id: run.clone(),
            format,
            request: request.clone(),
            response: response.clone(),
            ids: ids.clone(),
        });
        Ok(ids)
    }

    async fn send_supervision_request(
        &self,
        tool_call: &ToolCallId,
        supervisor: &SupervisorId,
        chain: &ChainId,
        position: usize,
    ) -> Result<SupervisionRequestId, RegistryError> {
        let mut state = self.state();
        if !state.supervisors.contains_key(supervisor) {
            return Err(not_found("supervisor", supervisor));
        }
        let id = SupervisionRequestId::new(state.next_id("request"));
        state.requests.push(RecordedRequest {
            id: id.clone(),
            tool_call_id: tool_call.clone(),
            supervisor_id: supervisor.clone(),
            chain_id: chain.clone(),
            position,
        });
        Ok(id)
    }

    async fn send_supervision_result(
        &self,
        tool_call: &ToolCallId,
        request: &SupervisionRequestId,
        decision: &SupervisionDecision,
    ) -> Result<(), RegistryError> {
        let mut state = self.state();
        if !state.requests.iter().any(|r| &r.id == request) {
            return Err(not_found("supervision request", request));
        }
        state.results.push(RecordedResult {
            tool_call_id: tool_call.clone(),
            request_id: request.clone(),
            decision: decision.clone(),
        });
        Ok(())
    }
}
