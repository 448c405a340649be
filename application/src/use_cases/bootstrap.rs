//! Session bootstrap
//!
//! Registers everything a run needs, in a fixed order, and wires the
//! engine:
//!
//! ```text
//! validate settings
//!   → project → task → run
//!   → for each tool: tool → its supervisors → its chains
//!   → chat pseudo tool (when chat chains are given)
//!   → SupervisedSession
//! ```
//!
//! Registration is an explicit list consumed by [`SessionBuilder::build`];
//! nothing registers itself.

use crate::context::SupervisionContext;
use crate::ports::audit_logger::{AuditLogger, NoAuditLogger};
use crate::ports::model_client::{ModelClient, ModelRequest};
use crate::ports::provider_adapter::ProviderAdapter;
use crate::ports::registry::{RegistryError, SupervisionRegistry, SupervisorRegistration};
use crate::ports::supervisor::Supervisor;
use crate::use_cases::error::SuperviseError;
use crate::use_cases::supervise_response::SuperviseResponseUseCase;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use toolwarden_domain::{
    DomainError, ExecutionSettings, ProjectId, RunId, SupervisorId, TaskId, Tool, ToolId,
    ToolSpecification,
};

/// Errors while setting up a session
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] DomainError),

    #[error("Registration failed: {0}")]
    Registration(#[from] RegistryError),

    #[error("Tool '{0}' is registered twice")]
    DuplicateTool(String),
}

/// A local callable together with how it is registered.
#[derive(Clone)]
pub struct SupervisorEntry {
    pub registration: SupervisorRegistration,
    pub supervisor: Arc<dyn Supervisor>,
}

impl SupervisorEntry {
    pub fn new(registration: SupervisorRegistration, supervisor: Arc<dyn Supervisor>) -> Self {
        Self {
            registration,
            supervisor,
        }
    }
}

/// Ordered supervisors of one chain.
pub type ChainSpec = Vec<SupervisorEntry>;

/// Builder for a [`SupervisedSession`].
pub struct SessionBuilder {
    registry: Arc<dyn SupervisionRegistry>,
    adapter: Arc<dyn ProviderAdapter>,
    model: Arc<dyn ModelClient>,
    audit: Arc<dyn AuditLogger>,
    settings: ExecutionSettings,
    project_name: String,
    task_name: String,
    run_name: String,
    tools: Vec<(ToolSpecification, Vec<ChainSpec>)>,
    chat_chains: Vec<ChainSpec>,
}

impl SessionBuilder {
    pub fn new(
        registry: Arc<dyn SupervisionRegistry>,
        adapter: Arc<dyn ProviderAdapter>,
        model: Arc<dyn ModelClient>,
    ) -> Self {
        Self {
            registry,
            adapter,
            model,
            audit: Arc::new(NoAuditLogger),
            settings: ExecutionSettings::default(),
            project_name: "default".to_string(),
            task_name: "default".to_string(),
            run_name: "run".to_string(),
            tools: Vec::new(),
            chat_chains: Vec::new(),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_settings(mut self, settings: ExecutionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_project(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    pub fn with_task(mut self, name: impl Into<String>) -> Self {
        self.task_name = name.into();
        self
    }

    pub fn with_run(mut self, name: impl Into<String>) -> Self {
        self.run_name = name.into();
        self
    }

    /// Supervise `spec` with `chains`, run in the given order.
    pub fn tool(mut self, spec: ToolSpecification, chains: Vec<ChainSpec>) -> Self {
        self.tools.push((spec, chains));
        self
    }

    /// Chains that review plain assistant messages.
    pub fn chat_chains(mut self, chains: Vec<ChainSpec>) -> Self {
        self.chat_chains = chains;
        self
    }

    // ==================== Build ====================

    pub async fn build(self) -> Result<SupervisedSession, BootstrapError> {
        self.settings.validate()?;

        let mut seen: Vec<&str> = Vec::with_capacity(self.tools.len());
        for (spec, _) in &self.tools {
            if seen.contains(&spec.name.as_str()) {
                return Err(BootstrapError::DuplicateTool(spec.name.clone()));
            }
            seen.push(&spec.name);
        }

        let project_id = self.registry.register_project(&self.project_name).await?;
        let task_id = self
            .registry
            .register_task(&project_id, &self.task_name)
            .await?;
        let run_id = self.registry.register_run(&task_id, &self.run_name).await?;
        info!(
            "Registered project {}, task {}, run {}",
            project_id, task_id, run_id
        );

        let mut registrar = Registrar {
            registry: self.registry.as_ref(),
            project_id: &project_id,
            run_id: &run_id,
            supervisor_ids: HashMap::new(),
            ctx: SupervisionContext::new().with_run_id(run_id.clone()),
        };

        for (spec, chains) in &self.tools {
            let tool = registrar.register_tool(spec, chains).await?;
            registrar.ctx.register_tool(tool);
        }
        if !self.chat_chains.is_empty() {
            let tool = registrar
                .register_tool(&ToolSpecification::chat(), &self.chat_chains)
                .await?;
            registrar.ctx.set_chat_tool(tool);
        }

        let ctx = registrar.ctx;
        info!(
            "Session ready: {} tool(s), {} supervisor(s), chat supervision {}",
            self.tools.len(),
            ctx.supervisor_count(),
            if ctx.has_chat_supervisors() { "on" } else { "off" }
        );

        let engine = SuperviseResponseUseCase::new(
            self.registry,
            self.adapter,
            self.model,
            self.audit,
            ctx,
            self.settings,
            run_id.clone(),
        );
        Ok(SupervisedSession {
            project_id,
            task_id,
            run_id,
            engine,
        })
    }
}

struct Registrar<'a> {
    registry: &'a dyn SupervisionRegistry,
    project_id: &'a ProjectId,
    run_id: &'a RunId,
    /// Supervisors are registered once per name
    supervisor_ids: HashMap<String, SupervisorId>,
    ctx: SupervisionContext,
}

impl Registrar<'_> {
    async fn register_tool(
        &mut self,
        spec: &ToolSpecification,
        chains: &[ChainSpec],
    ) -> Result<Tool, BootstrapError> {
        let tool_id: ToolId = self.registry.register_tool(self.run_id, spec).await?;

        let mut chain_ids = Vec::with_capacity(chains.len());
        for chain in chains {
            let mut ids = Vec::with_capacity(chain.len());
            for entry in chain {
                ids.push(self.register_supervisor(entry).await?);
            }
            chain_ids.push(ids);
        }
        if !chain_ids.is_empty() {
            self.registry
                .register_supervisor_chains(&tool_id, &chain_ids)
                .await?;
        }

        info!(
            "Registered tool '{}' as {} with {} chain(s)",
            spec.name,
            tool_id,
            chain_ids.len()
        );
        Ok(Tool::from_spec(tool_id, spec))
    }

    async fn register_supervisor(
        &mut self,
        entry: &SupervisorEntry,
    ) -> Result<SupervisorId, BootstrapError> {
        if let Some(id) = self.supervisor_ids.get(&entry.registration.name) {
            return Ok(id.clone());
        }
        let id = self
            .registry
            .register_supervisor(self.project_id, &entry.registration)
            .await?;
        self.ctx
            .register_supervisor(id.clone(), entry.supervisor.clone());
        self.supervisor_ids
            .insert(entry.registration.name.clone(), id.clone());
        Ok(id)
    }
}

/// A registered run, ready to supervise model responses.
#[derive(Clone)]
pub struct SupervisedSession {
    pub project_id: ProjectId,
    pub task_id: TaskId,
    pub run_id: RunId,
    engine: SuperviseResponseUseCase,
}

impl SupervisedSession {
    pub fn engine(&self) -> &SuperviseResponseUseCase {
        &self.engine
    }

    pub fn context(&self) -> SupervisionContext {
        self.engine.context_snapshot()
    }

    pub async fn handle_model_response(
        &self,
        response: &Value,
        request: &ModelRequest,
    ) -> Result<Value, SuperviseError> {
        self.engine.handle_model_response(response, request).await
    }

    pub async fn drain_monitoring(&self) -> Result<(), SuperviseError> {
        self.engine.drain_monitoring().await
    }
}
