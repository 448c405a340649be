//! Resample Engine
//!
//! Drives the bounded retry loop after a rejection:
//!
//! ```text
//! Rejected(call, decisions)
//!     │  append feedback note (assistant) + nudge (user)
//!     ▼
//! model.create ──▶ extract calls ──▶ resolve (modifications off)
//!     │                                   │
//!     │                      approved ⇒ return new response
//!     │                      rejected ⇒ next attempt with the new call
//!     ▼
//! budget spent ⇒ synthetic assistant message quoting every note
//! ```
//!
//! Each attempt performs exactly one model invocation and one supervision
//! pass, so at most `n_resamples` model calls happen.

use crate::context::SupervisionContext;
use crate::ports::audit_logger::{AuditEvent, AuditLogger, event};
use crate::ports::model_client::{ModelClient, ModelRequest};
use crate::ports::provider_adapter::ProviderAdapter;
use crate::ports::registry::SupervisionRegistry;
use crate::use_cases::error::SuperviseError;
use crate::use_cases::resolve_chains::MultiChainResolver;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};
use toolwarden_domain::{
    ChainDecisions, ExecutionSettings, FeedbackTemplate, Message, RETRY_NUDGE, RunId, ToolCall,
};

#[derive(Clone)]
pub struct ResampleEngine {
    resolver: MultiChainResolver,
    registry: Arc<dyn SupervisionRegistry>,
    adapter: Arc<dyn ProviderAdapter>,
    model: Arc<dyn ModelClient>,
    audit: Arc<dyn AuditLogger>,
    run_id: RunId,
    n_resamples: u32,
    remove_feedback_from_context: bool,
}

impl ResampleEngine {
    pub fn new(
        resolver: MultiChainResolver,
        registry: Arc<dyn SupervisionRegistry>,
        adapter: Arc<dyn ProviderAdapter>,
        model: Arc<dyn ModelClient>,
        audit: Arc<dyn AuditLogger>,
        run_id: RunId,
        settings: &ExecutionSettings,
    ) -> Self {
        Self {
            resolver,
            registry,
            adapter,
            model,
            audit,
            run_id,
            n_resamples: settings.n_resamples,
            remove_feedback_from_context: settings.remove_feedback_from_context,
        }
    }

    /// Retry after `rejected` was turned down with `decisions`.
    ///
    /// Returns the first response whose calls are all approved, or a
    /// synthetic explanatory response once the budget is spent.
    pub async fn run(
        &self,
        request: &ModelRequest,
        rejected: ToolCall,
        decisions: Vec<ChainDecisions>,
        mut ctx: SupervisionContext,
    ) -> Result<Value, SuperviseError> {
        let mut failed_call = rejected;
        let mut failed_chains = decisions;
        let mut notes: Vec<String> = Vec::new();
        let mut history: Vec<Message> = Vec::new();

        for attempt in 1..=self.n_resamples {
            let note = FeedbackTemplate::rejection(&failed_call, &failed_chains);
            notes.push(note.clone());

            let feedback = [Message::assistant(note), Message::user(RETRY_NUDGE)];
            if self.remove_feedback_from_context {
                history.clear();
            }
            history.extend(feedback);

            let mut messages = request.messages.clone();
            messages.extend(history.iter().cloned());
            let attempt_request = ModelRequest {
                messages,
                params: request.params.clone(),
            };

            info!(
                "Resampling after rejection of {} (attempt {}/{})",
                failed_call.tool_name, attempt, self.n_resamples
            );
            self.audit.log(AuditEvent::new(
                event::RESAMPLE_ATTEMPT,
                json!({
                    "attempt": attempt,
                    "max_attempts": self.n_resamples,
                    "rejected_tool": failed_call.tool_name,
                    "rejected_arguments": failed_call.parameters,
                }),
            ));

            let response = self.model.create(&attempt_request).await?;
            let ids = self
                .registry
                .log_interaction(
                    &self.run_id,
                    self.adapter.chat_format(),
                    &attempt_request.to_payload(),
                    &response,
                )
                .await?;
            ctx.set_messages(attempt_request.messages.clone());

            let calls = self.adapter.extract_tool_calls(&response)?;
            let pending: Vec<(ToolCall, bool)> = if !calls.is_empty() {
                calls.into_iter().map(|c| (c, false)).collect()
            } else if ctx.has_chat_supervisors() {
                vec![(self.adapter.generate_fallback_tool_call(&response), true)]
            } else {
                debug!("Resampled response carries no tool call; nothing to supervise");
                return Ok(response);
            };

            let mut rejection = None;
            for (index, (call, is_fallback)) in pending.iter().enumerate() {
                let target = if *is_fallback {
                    self.resolver.chat_target(&ids, &ctx).await?
                } else {
                    self.resolver.target(index, call, &ids, &ctx).await?
                };
                let Some(target) = target else {
                    continue;
                };
                let verdict = self.resolver.resolve(&target, call, &ctx, false).await?;
                if verdict.is_rejected() {
                    rejection = Some(verdict);
                    break;
                }
            }

            match rejection {
                None => {
                    info!("Resampled response approved on attempt {}", attempt);
                    return Ok(response);
                }
                Some(verdict) => {
                    failed_call = verdict.call;
                    failed_chains = verdict.chains;
                }
            }
        }

        if self.n_resamples == 0 {
            notes.push(FeedbackTemplate::rejection(&failed_call, &failed_chains));
        }
        warn!(
            "Giving up on {} after {} resample(s)",
            failed_call.tool_name, self.n_resamples
        );
        self.audit.log(AuditEvent::new(
            event::RESAMPLE_EXHAUSTED,
            json!({
                "attempts": self.n_resamples,
                "tool": failed_call.tool_name,
                "arguments": failed_call.parameters,
                "feedback": notes,
            }),
        ));
        let text = FeedbackTemplate::exhausted(&failed_call, self.n_resamples, &notes);
        Ok(self.adapter.generate_synthetic_response(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::audit_logger::NoAuditLogger;
    use crate::ports::registry::SupervisorRegistration;
    use crate::ports::supervisor::{FnSupervisor, RejectAll, SupervisionRequest, Supervisor};
    use crate::use_cases::testing::{
        RecordingRegistry, ScriptedModel, TestAdapter, response_with_call, text_response,
    };
    use serde_json::json;
    use toolwarden_domain::{
        Role, SupervisionDecision, SupervisorKind, Tool, ToolSpecification,
    };

    struct Fixture {
        registry: Arc<RecordingRegistry>,
        model: Arc<ScriptedModel>,
        ctx: SupervisionContext,
        run_id: RunId,
    }

    async fn fixture(supervisor: Arc<dyn Supervisor>, responses: Vec<Value>) -> Fixture {
        let registry = Arc::new(RecordingRegistry::default());
        let project = registry.register_project("p").await.unwrap();
        let task = registry.register_task(&project, "t").await.unwrap();
        let run_id = registry.register_run(&task, "r").await.unwrap();
        let spec = ToolSpecification::new("delete_file", "Delete a file");
        let tool_id = registry.register_tool(&run_id, &spec).await.unwrap();
        let supervisor_id = registry
            .register_supervisor(
                &project,
                &SupervisorRegistration::new("guard", SupervisorKind::ClientProgrammatic),
            )
            .await
            .unwrap();
        registry
            .register_supervisor_chains(&tool_id, &[vec![supervisor_id.clone()]])
            .await
            .unwrap();

        let mut ctx = SupervisionContext::new().with_run_id(run_id.clone());
        ctx.register_tool(Tool::from_spec(tool_id, &spec));
        ctx.register_supervisor(supervisor_id, supervisor);

        Fixture {
            registry,
            model: Arc::new(ScriptedModel::new(responses)),
            ctx,
            run_id,
        }
    }

    fn engine(f: &Fixture, settings: ExecutionSettings) -> ResampleEngine {
        ResampleEngine::new(
            MultiChainResolver::new(f.registry.clone(), &settings),
            f.registry.clone(),
            Arc::new(TestAdapter),
            f.model.clone(),
            Arc::new(NoAuditLogger),
            f.run_id.clone(),
            &settings,
        )
    }

    fn rejected_call() -> (ToolCall, Vec<ChainDecisions>) {
        (
            ToolCall::new("call_0", "delete_file").with_param("path", "/etc"),
            vec![ChainDecisions::new(
                "chain-x",
                vec![SupervisionDecision::reject("system paths are off limits")],
            )],
        )
    }

    fn request() -> ModelRequest {
        ModelRequest::new(vec![Message::user("clean up")]).with_param("model", "test-model")
    }

    #[tokio::test]
    async fn test_exactly_n_resamples_then_synthetic() {
        let responses = (0..5)
            .map(|i| response_with_call(&format!("call_{i}"), "delete_file", json!({"path": "/etc"})))
            .collect();
        let f = fixture(Arc::new(RejectAll::new("never")), responses).await;
        let (call, chains) = rejected_call();

        let out = engine(&f, ExecutionSettings::default().with_n_resamples(3))
            .run(&request(), call, chains, f.ctx.clone())
            .await
            .unwrap();

        assert_eq!(f.model.requests().len(), 3);
        assert_eq!(out["synthetic"], json!(true));
        let text = out["text"].as_str().unwrap();
        assert!(text.contains("We tried 3 times"));
        assert!(text.contains("Resample 1: "));
        assert!(text.contains("Resample 3: "));
        assert!(text.contains("This is not a message from the user"));
    }

    #[tokio::test]
    async fn test_returns_first_approved_response() {
        let guard = FnSupervisor::new(|req: &SupervisionRequest<'_>| {
            if req.tool_call.get_str("path") == Some("/etc") {
                SupervisionDecision::reject("system paths are off limits")
            } else {
                SupervisionDecision::approve()
            }
        });
        let approved = response_with_call("call_2", "delete_file", json!({"path": "/tmp/x"}));
        let f = fixture(
            Arc::new(guard),
            vec![
                response_with_call("call_1", "delete_file", json!({"path": "/etc"})),
                approved.clone(),
            ],
        )
        .await;
        let (call, chains) = rejected_call();

        let out = engine(&f, ExecutionSettings::default())
            .run(&request(), call, chains, f.ctx.clone())
            .await
            .unwrap();

        assert_eq!(out, approved);
        assert_eq!(f.model.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_feedback_accumulates() {
        let f = fixture(
            Arc::new(RejectAll::new("never")),
            vec![
                response_with_call("call_1", "delete_file", json!({"path": "/etc"})),
                response_with_call("call_2", "delete_file", json!({"path": "/etc"})),
            ],
        )
        .await;
        let (call, chains) = rejected_call();

        engine(&f, ExecutionSettings::default().with_n_resamples(2))
            .run(&request(), call, chains, f.ctx.clone())
            .await
            .unwrap();

        let requests = f.model.requests();
        assert_eq!(requests[0].messages.len(), 3);
        assert_eq!(requests[1].messages.len(), 5);
        assert_eq!(requests[1].messages[1].role, Role::Assistant);
        assert_eq!(requests[1].messages[2].text().as_deref(), Some(RETRY_NUDGE));
        assert_eq!(requests[1].params.get("model"), Some(&json!("test-model")));
    }

    #[tokio::test]
    async fn test_feedback_removed_from_context() {
        let f = fixture(
            Arc::new(RejectAll::new("never")),
            vec![
                response_with_call("call_1", "delete_file", json!({"path": "/etc"})),
                response_with_call("call_2", "delete_file", json!({"path": "/etc"})),
            ],
        )
        .await;
        let (call, chains) = rejected_call();

        let out = engine(
            &f,
            ExecutionSettings::default()
                .with_n_resamples(2)
                .with_remove_feedback_from_context(true),
        )
        .run(&request(), call, chains, f.ctx.clone())
        .await
        .unwrap();

        let requests = f.model.requests();
        assert_eq!(requests[0].messages.len(), 3);
        assert_eq!(requests[1].messages.len(), 3);
        let text = out["text"].as_str().unwrap();
        assert!(text.contains("Resample 1: ") && text.contains("Resample 2: "));
    }

    #[tokio::test]
    async fn test_plain_text_reply_without_chat_supervisors_is_returned() {
        let reply = text_response("I will not delete anything.");
        let f = fixture(Arc::new(RejectAll::new("never")), vec![reply.clone()]).await;
        let (call, chains) = rejected_call();

        let out = engine(&f, ExecutionSettings::default())
            .run(&request(), call, chains, f.ctx.clone())
            .await
            .unwrap();
        assert_eq!(out, reply);
    }

    #[tokio::test]
    async fn test_zero_budget_never_calls_model() {
        let f = fixture(Arc::new(RejectAll::new("never")), vec![]).await;
        let (call, chains) = rejected_call();

        let out = engine(&f, ExecutionSettings::default().with_n_resamples(0))
            .run(&request(), call, chains, f.ctx.clone())
            .await
            .unwrap();

        assert!(f.model.requests().is_empty());
        let text = out["text"].as_str().unwrap();
        assert!(text.contains("system paths are off limits"));
    }
}
