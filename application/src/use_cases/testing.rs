//! Hand-written fakes shared by the use case tests.
//!
//! Responses use a minimal provider shape understood by [`TestAdapter`]:
//! `{"calls": [{"id", "name", "arguments"}], "text": "..."}`.

use crate::ports::model_client::{ModelClient, ModelError, ModelRequest};
use crate::ports::provider_adapter::{AdapterError, ChatFormat, ProviderAdapter};
use crate::ports::registry::{
    ChoiceIds, InteractionIds, RegistryError, SupervisionRegistry, SupervisorRegistration,
    ToolCallIds,
};
use crate::ports::supervisor::{SupervisionRequest, Supervisor, SupervisorError};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use toolwarden_domain::{
    ChainId, DecisionKind, ProjectId, RunId, SupervisionDecision, SupervisionRequestId,
    SupervisorChain, SupervisorId, SupervisorInfo, TaskId, Tool, ToolCall, ToolCallId, ToolId,
    ToolSpecification,
};

// ==================== Supervisors ====================

/// Returns scripted decisions and counts how often it ran.
pub struct CountingSupervisor {
    first: Mutex<Option<SupervisionDecision>>,
    rest: SupervisionDecision,
    calls: AtomicUsize,
    previous: Mutex<Option<DecisionKind>>,
}

impl CountingSupervisor {
    pub fn new(decision: SupervisionDecision) -> Self {
        Self {
            first: Mutex::new(None),
            rest: decision,
            calls: AtomicUsize::new(0),
            previous: Mutex::new(None),
        }
    }

    /// `first` on the first review, `rest` on every later one.
    pub fn first_then(first: SupervisionDecision, rest: SupervisionDecision) -> Self {
        let supervisor = Self::new(rest);
        *supervisor.first.lock().unwrap() = Some(first);
        supervisor
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_previous_kind(&self) -> Option<DecisionKind> {
        *self.previous.lock().unwrap()
    }
}

#[async_trait]
impl Supervisor for CountingSupervisor {
    async fn review(
        &self,
        request: SupervisionRequest<'_>,
    ) -> Result<SupervisionDecision, SupervisorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.previous.lock().unwrap() = request.previous_decision.map(|d| d.kind());
        if let Some(first) = self.first.lock().unwrap().take() {
            return Ok(first);
        }
        Ok(self.rest.clone())
    }
}

// ==================== Registry ====================

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub tool_call_id: ToolCallId,
    pub supervisor: SupervisorId,
    pub chain: ChainId,
    pub position: usize,
}

/// Registry fake that assigns sequential ids and records every call.
#[derive(Default)]
pub struct RecordingRegistry {
    counter: AtomicUsize,
    tools: Mutex<HashMap<String, ToolId>>,
    specs: Mutex<HashMap<ToolId, ToolSpecification>>,
    supervisors: Mutex<HashMap<SupervisorId, SupervisorRegistration>>,
    chains: Mutex<HashMap<ToolId, Vec<SupervisorChain>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    results: Mutex<Vec<(ToolCallId, SupervisionDecision)>>,
    interactions: Mutex<Vec<(Value, Value)>>,
}

impl RecordingRegistry {
    fn next(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn results(&self) -> Vec<(ToolCallId, SupervisionDecision)> {
        self.results.lock().unwrap().clone()
    }

    pub fn interactions(&self) -> Vec<(Value, Value)> {
        self.interactions.lock().unwrap().clone()
    }
}

#[async_trait]
impl SupervisionRegistry for RecordingRegistry {
    async fn register_project(&self, _name: &str) -> Result<ProjectId, RegistryError> {
        Ok(ProjectId::new(self.next("project")))
    }

    async fn register_task(&self, _project: &ProjectId, _name: &str) -> Result<TaskId, RegistryError> {
        Ok(TaskId::new(self.next("task")))
    }

    async fn register_run(&self, _task: &TaskId, _name: &str) -> Result<RunId, RegistryError> {
        Ok(RunId::new(self.next("run")))
    }

    async fn register_tool(
        &self,
        _run: &RunId,
        spec: &ToolSpecification,
    ) -> Result<ToolId, RegistryError> {
        let id = ToolId::new(self.next("tool"));
        self.tools.lock().unwrap().insert(spec.name.clone(), id.clone());
        self.specs.lock().unwrap().insert(id.clone(), spec.clone());
        Ok(id)
    }

    async fn register_supervisor(
        &self,
        _project: &ProjectId,
        registration: &SupervisorRegistration,
    ) -> Result<SupervisorId, RegistryError> {
        let id = SupervisorId::new(self.next("supervisor"));
        self.supervisors
            .lock()
            .unwrap()
            .insert(id.clone(), registration.clone());
        Ok(id)
    }

    async fn register_supervisor_chains(
        &self,
        tool: &ToolId,
        chains: &[Vec<SupervisorId>],
    ) -> Result<(), RegistryError> {
        let supervisors = self.supervisors.lock().unwrap();
        let resolved: Vec<SupervisorChain> = chains
            .iter()
            .map(|ids| {
                let infos = ids
                    .iter()
                    .map(|id| {
                        let registration = supervisors.get(id).cloned().unwrap();
                        SupervisorInfo::new(id.clone(), registration.name, registration.kind)
                    })
                    .collect();
                SupervisorChain::new(self.next("chain"), infos)
            })
            .collect();
        self.chains
            .lock()
            .unwrap()
            .entry(tool.clone())
            .or_default()
            .extend(resolved);
        Ok(())
    }

    async fn get_supervisor_chains(
        &self,
        tool: &ToolId,
    ) -> Result<Vec<SupervisorChain>, RegistryError> {
        Ok(self.chains.lock().unwrap().get(tool).cloned().unwrap_or_default())
    }

    async fn get_tool(&self, tool: &ToolId) -> Result<Tool, RegistryError> {
        self.specs
            .lock()
            .unwrap()
            .get(tool)
            .map(|spec| Tool::from_spec(tool.clone(), spec))
            .ok_or_else(|| RegistryError::NotFound {
                kind: "tool",
                id: tool.to_string(),
            })
    }

    async fn log_interaction(
        &self,
        _run: &RunId,
        _format: ChatFormat,
        request: &Value,
        response: &Value,
    ) -> Result<InteractionIds, RegistryError> {
        self.interactions
            .lock()
            .unwrap()
            .push((request.clone(), response.clone()));
        let tools = self.tools.lock().unwrap().clone();
        let tool_call_ids = response["calls"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .map(|call| ToolCallIds {
                tool_call_id: ToolCallId::new(self.next("tool-call")),
                tool_id: call["name"].as_str().and_then(|n| tools.get(n).cloned()),
            })
            .collect();
        Ok(InteractionIds {
            chat_id: self.next("chat"),
            choice_ids: vec![ChoiceIds {
                choice_id: self.next("choice"),
                message_id: self.next("message"),
                tool_call_ids,
            }],
        })
    }

    async fn send_supervision_request(
        &self,
        tool_call: &ToolCallId,
        supervisor: &SupervisorId,
        chain: &ChainId,
        position: usize,
    ) -> Result<SupervisionRequestId, RegistryError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            tool_call_id: tool_call.clone(),
            supervisor: supervisor.clone(),
            chain: chain.clone(),
            position,
        });
        Ok(SupervisionRequestId::new(self.next("request")))
    }

    async fn send_supervision_result(
        &self,
        tool_call: &ToolCallId,
        _request: &SupervisionRequestId,
        decision: &SupervisionDecision,
    ) -> Result<(), RegistryError> {
        self.results
            .lock()
            .unwrap()
            .push((tool_call.clone(), decision.clone()));
        Ok(())
    }
}

// ==================== Provider ====================

pub fn response_with_call(id: &str, name: &str, arguments: Value) -> Value {
    json!({"calls": [{"id": id, "name": name, "arguments": arguments}], "usage": {"tokens": 7}})
}

pub fn text_response(text: &str) -> Value {
    json!({"calls": [], "text": text})
}

pub struct TestAdapter;

impl ProviderAdapter for TestAdapter {
    fn chat_format(&self) -> ChatFormat {
        ChatFormat::OpenAi
    }

    fn extract_tool_calls(&self, response: &Value) -> Result<Vec<ToolCall>, AdapterError> {
        let calls = response["calls"].as_array().cloned().unwrap_or_default();
        Ok(calls
            .into_iter()
            .map(|c| {
                ToolCall::new(
                    c["id"].as_str().unwrap_or_default(),
                    c["name"].as_str().unwrap_or_default(),
                )
                .with_parameters(c["arguments"].as_object().cloned().unwrap_or_default())
                .with_provider_native(c)
            })
            .collect())
    }

    fn upsert_tool_call(&self, response: &Value, call: &ToolCall) -> Result<Value, AdapterError> {
        let mut out = response.clone();
        let entry = json!({"id": call.id, "name": call.tool_name, "arguments": call.parameters});
        let calls = out["calls"].as_array_mut().unwrap();
        match calls.iter_mut().find(|c| c["id"] == call.id.as_str()) {
            Some(existing) => *existing = entry,
            None => calls.push(entry),
        }
        Ok(out)
    }

    fn generate_synthetic_response(&self, text: &str) -> Value {
        json!({"calls": [], "text": text, "synthetic": true})
    }

    fn generate_fallback_tool_call(&self, response: &Value) -> ToolCall {
        ToolCall::chat("fallback", response["text"].as_str().unwrap_or_default())
    }
}

// ==================== Model ====================

/// Returns scripted responses and records every request.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn create(&self, request: &ModelRequest) -> Result<Value, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::Other("no scripted response left".to_string()))
    }
}
