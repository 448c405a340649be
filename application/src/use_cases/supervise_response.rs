//! Orchestration Façade
//!
//! Entry point called once per model response:
//!
//! | Step | What happens                                                      |
//! |------|-------------------------------------------------------------------|
//! | 1    | Log the raw request/response to the registry, obtain call ids     |
//! | 2    | No tool calls and no chat supervisors: return unchanged           |
//! | 3    | No tool calls but chat supervisors: supervise a fallback call     |
//! | 4    | Refresh the conversation in the context                           |
//! | 5    | Resolve every call in order (two-pass modify), resample on reject |
//! | 6    | Upsert modified calls into a copy of the response                 |
//!
//! In monitoring mode the same steps run on a background task and the
//! caller gets the original response back right away.

use crate::context::SupervisionContext;
use crate::ports::audit_logger::{AuditEvent, AuditLogger, event};
use crate::ports::model_client::{ModelClient, ModelRequest};
use crate::ports::provider_adapter::ProviderAdapter;
use crate::ports::registry::SupervisionRegistry;
use crate::use_cases::error::SuperviseError;
use crate::use_cases::resample::ResampleEngine;
use crate::use_cases::resolve_chains::{CallVerdict, MultiChainResolver};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use toolwarden_domain::{
    ExecutionSettings, FeedbackTemplate, RejectionPolicy, Resolution, RunId, ToolCall,
};

/// Use case for supervising model responses of one run
#[derive(Clone)]
pub struct SuperviseResponseUseCase {
    registry: Arc<dyn SupervisionRegistry>,
    adapter: Arc<dyn ProviderAdapter>,
    audit: Arc<dyn AuditLogger>,
    context: Arc<RwLock<SupervisionContext>>,
    resolver: MultiChainResolver,
    resampler: ResampleEngine,
    settings: ExecutionSettings,
    run_id: RunId,
    background: Arc<Mutex<JoinSet<()>>>,
}

impl SuperviseResponseUseCase {
    /// Wire the engine. `settings` must already be validated.
    pub fn new(
        registry: Arc<dyn SupervisionRegistry>,
        adapter: Arc<dyn ProviderAdapter>,
        model: Arc<dyn ModelClient>,
        audit: Arc<dyn AuditLogger>,
        context: SupervisionContext,
        settings: ExecutionSettings,
        run_id: RunId,
    ) -> Self {
        let resolver = MultiChainResolver::new(registry.clone(), &settings);
        let resampler = ResampleEngine::new(
            resolver.clone(),
            registry.clone(),
            adapter.clone(),
            model,
            audit.clone(),
            run_id.clone(),
            &settings,
        );
        Self {
            registry,
            adapter,
            audit,
            context: Arc::new(RwLock::new(context)),
            resolver,
            resampler,
            settings,
            run_id,
            background: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    pub fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    /// A copy of the current context.
    pub fn context_snapshot(&self) -> SupervisionContext {
        match self.context.read() {
            Ok(ctx) => ctx.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Supervise `response`, produced by the model for `request`.
    ///
    /// Returns the response the agent loop should act on. `response` itself
    /// is never modified.
    pub async fn handle_model_response(
        &self,
        response: &Value,
        request: &ModelRequest,
    ) -> Result<Value, SuperviseError> {
        if self.settings.execution_mode.is_monitoring() {
            self.spawn_monitoring(response.clone(), request.clone());
            return Ok(response.clone());
        }
        self.supervise(response, request).await
    }

    /// Wait for every monitoring pass started so far.
    pub async fn drain_monitoring(&self) -> Result<(), SuperviseError> {
        let mut tasks = std::mem::take(&mut *self.background_tasks());
        while let Some(result) = tasks.join_next().await {
            result.map_err(|e| SuperviseError::Background(e.to_string()))?;
        }
        Ok(())
    }

    /// Monitoring passes that have not finished yet.
    pub fn pending_monitoring(&self) -> usize {
        let mut tasks = self.background_tasks();
        reap_finished(&mut tasks);
        tasks.len()
    }

    fn background_tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        match self.background.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn spawn_monitoring(&self, response: Value, request: ModelRequest) {
        let this = self.clone();
        let mut tasks = self.background_tasks();
        reap_finished(&mut tasks);
        tasks.spawn(async move {
            if let Err(e) = this.supervise(&response, &request).await {
                warn!("Monitoring pass failed: {}", e);
                this.audit.log(AuditEvent::new(
                    event::MONITORING_PASS_FAILED,
                    json!({"error": e.to_string()}),
                ));
            }
        });
    }

    async fn supervise(
        &self,
        response: &Value,
        request: &ModelRequest,
    ) -> Result<Value, SuperviseError> {
        // Step 1: obtain registry ids
        let ids = self
            .registry
            .log_interaction(
                &self.run_id,
                self.adapter.chat_format(),
                &request.to_payload(),
                response,
            )
            .await?;

        // Step 4: the context sees the conversation that led to this response
        let ctx = {
            let mut guard = match self.context.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.set_messages(request.messages.clone());
            guard.clone()
        };

        // Steps 2 and 3
        let calls = self.adapter.extract_tool_calls(response)?;
        if calls.is_empty() {
            if !ctx.has_chat_supervisors() {
                debug!("Response carries no tool call; nothing to supervise");
                return Ok(response.clone());
            }
            let fallback = self.adapter.generate_fallback_tool_call(response);
            let Some(target) = self.resolver.chat_target(&ids, &ctx).await? else {
                return Ok(response.clone());
            };
            let verdict = self.resolver.resolve_call(&target, &fallback, &ctx).await?;
            self.log_verdict(&verdict);
            return match verdict.resolution {
                Resolution::Approved(_) => Ok(response.clone()),
                Resolution::Modified(modified) => {
                    let text = modified
                        .get_str("message")
                        .map(str::to_string)
                        .unwrap_or_else(|| modified.arguments_json());
                    Ok(self.adapter.generate_synthetic_response(&text))
                }
                Resolution::Rejected => self.reject(request, verdict, ctx).await,
            };
        }

        // Steps 5 and 6
        let mut out = response.clone();
        for (index, call) in calls.iter().enumerate() {
            let Some(target) = self.resolver.target(index, call, &ids, &ctx).await? else {
                continue;
            };
            let verdict = self.resolver.resolve_call(&target, call, &ctx).await?;
            self.log_verdict(&verdict);
            match verdict.resolution {
                Resolution::Approved(_) => {}
                Resolution::Modified(ref modified) => {
                    out = self.adapter.upsert_tool_call(&out, modified)?;
                }
                Resolution::Rejected => return self.reject(request, verdict, ctx).await,
            }
        }
        Ok(out)
    }

    async fn reject(
        &self,
        request: &ModelRequest,
        verdict: CallVerdict,
        ctx: SupervisionContext,
    ) -> Result<Value, SuperviseError> {
        info!("Tool call {} rejected by supervisors", verdict.call);
        match self.settings.rejection_policy {
            RejectionPolicy::ResampleWithFeedback => {
                self.resampler
                    .run(request, verdict.call, verdict.chains, ctx)
                    .await
            }
            RejectionPolicy::NoResample => Ok(self.no_resample_response(&verdict.call, &verdict)),
        }
    }

    fn no_resample_response(&self, call: &ToolCall, verdict: &CallVerdict) -> Value {
        let note = FeedbackTemplate::rejection(call, &verdict.chains);
        let text = FeedbackTemplate::exhausted(call, 0, &[note]);
        self.adapter.generate_synthetic_response(&text)
    }

    fn log_verdict(&self, verdict: &CallVerdict) {
        let outcome = match &verdict.resolution {
            Resolution::Approved(_) => "approved",
            Resolution::Modified(_) => "modified",
            Resolution::Rejected => "rejected",
        };
        self.audit.log(AuditEvent::new(
            event::TOOL_CALL_RESOLVED,
            json!({
                "run_id": self.run_id,
                "tool": verdict.call.tool_name,
                "arguments": verdict.call.parameters,
                "outcome": outcome,
                "chains": verdict.chains,
            }),
        ));
    }
}

/// Release monitoring passes that already finished.
fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        if let Err(e) = result {
            warn!("Monitoring task ended abnormally: {}", e);
        }
    }
}
