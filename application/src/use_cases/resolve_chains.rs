//! Multi-Chain Resolver
//!
//! Runs every chain attached to a tool, in configured order, and combines
//! their last decisions into one [`Resolution`].
//!
//! # Two-pass modify protocol
//!
//! ```text
//! pass 1 (modifications allowed) ──Modified(call')──▶ pass 2 on call' (modifications off)
//!                                                        │
//!                                       Approved ⇒ Modified(call')   Rejected ⇒ Rejected
//! ```
//!
//! A modified call is never handed back without the second pass.

use crate::context::SupervisionContext;
use crate::ports::registry::{InteractionIds, SupervisionRegistry};
use crate::use_cases::error::SuperviseError;
use crate::use_cases::run_chain::ChainRunner;
use std::sync::Arc;
use tracing::{debug, info, warn};
use toolwarden_domain::{
    ChainDecisions, ExecutionSettings, MultiSupervisorResolution, Resolution, SupervisorChain,
    Tool, ToolCall, ToolCallId, ToolId, is_unsupervised, resolve_outcome,
};

/// A tool call resolved to its registry identity and chains.
#[derive(Debug, Clone)]
pub struct SupervisionTarget {
    pub tool: Tool,
    pub tool_call_id: ToolCallId,
    pub chains: Vec<SupervisorChain>,
}

/// Result of supervising one call.
#[derive(Debug, Clone)]
pub struct CallVerdict {
    pub resolution: Resolution,
    /// The call the final pass looked at (the modified one after a MODIFY)
    pub call: ToolCall,
    /// Decisions of the final pass
    pub chains: Vec<ChainDecisions>,
}

impl CallVerdict {
    /// Verdict for a call nobody supervises.
    pub fn unsupervised(call: &ToolCall) -> Self {
        Self {
            resolution: Resolution::Approved(call.clone()),
            call: call.clone(),
            chains: Vec::new(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.resolution.is_rejected()
    }
}

#[derive(Clone)]
pub struct MultiChainResolver {
    registry: Arc<dyn SupervisionRegistry>,
    runner: ChainRunner,
    policy: MultiSupervisorResolution,
    allow_modifications: bool,
}

impl MultiChainResolver {
    pub fn new(registry: Arc<dyn SupervisionRegistry>, settings: &ExecutionSettings) -> Self {
        Self {
            runner: ChainRunner::new(registry.clone(), settings.execution_mode),
            registry,
            policy: settings.multi_supervisor_resolution,
            allow_modifications: settings.allow_tool_modifications,
        }
    }

    /// Look up what the call at `index` of a logged response is supervised by.
    ///
    /// `None` means nothing supervises the call: the tool is unknown to the
    /// registry or has no chains.
    pub async fn target(
        &self,
        index: usize,
        call: &ToolCall,
        ids: &InteractionIds,
        ctx: &SupervisionContext,
    ) -> Result<Option<SupervisionTarget>, SuperviseError> {
        let Some(entry) = ids.tool_calls().nth(index) else {
            warn!("Registry returned no id for tool call {}; treating it as unsupervised", call);
            return Ok(None);
        };
        let Some(tool_id) = entry.tool_id.as_ref() else {
            warn!("Tool '{}' is not registered; treating the call as unsupervised", call.tool_name);
            return Ok(None);
        };
        self.target_for_tool(tool_id, entry.tool_call_id.clone(), ctx).await
    }

    /// Target for a chat fallback call: the registry tracks it under the
    /// message id of the first choice.
    pub async fn chat_target(
        &self,
        ids: &InteractionIds,
        ctx: &SupervisionContext,
    ) -> Result<Option<SupervisionTarget>, SuperviseError> {
        let (Some(tool_id), Some(choice)) = (ctx.chat_tool(), ids.first_choice()) else {
            return Ok(None);
        };
        self.target_for_tool(tool_id, ToolCallId::new(choice.message_id.clone()), ctx)
            .await
    }

    async fn target_for_tool(
        &self,
        tool_id: &ToolId,
        tool_call_id: ToolCallId,
        ctx: &SupervisionContext,
    ) -> Result<Option<SupervisionTarget>, SuperviseError> {
        let tool = match ctx.tool(tool_id) {
            Some(tool) => tool.clone(),
            None => {
                warn!("Tool {} missing from the local context; fetching it from the registry", tool_id);
                self.registry.get_tool(tool_id).await?
            }
        };
        let chains = self.registry.get_supervisor_chains(tool_id).await?;
        if chains.is_empty() {
            info!("Tool '{}' has no supervisor chains; call runs unsupervised", tool.name);
            return Ok(None);
        }
        Ok(Some(SupervisionTarget {
            tool,
            tool_call_id,
            chains,
        }))
    }

    /// One decision pass over every chain of `target`.
    pub async fn resolve(
        &self,
        target: &SupervisionTarget,
        call: &ToolCall,
        ctx: &SupervisionContext,
        allow_modifications: bool,
    ) -> Result<CallVerdict, SuperviseError> {
        let mut results = Vec::with_capacity(target.chains.len());

        for chain in &target.chains {
            let decisions = self
                .runner
                .run(chain, &target.tool, call, &target.tool_call_id, ctx)
                .await?;
            let stop = decisions
                .last_kind()
                .is_some_and(|kind| self.policy.stops_after(kind));
            results.push(decisions);
            if stop {
                debug!("Chain {} settled the outcome for {}", chain.chain_id, call.tool_name);
                break;
            }
        }

        if is_unsupervised(&results) {
            warn!(
                "No supervisor of tool '{}' produced a decision; call runs unsupervised",
                target.tool.name
            );
        }

        Ok(CallVerdict {
            resolution: resolve_outcome(self.policy, allow_modifications, call, &results),
            call: call.clone(),
            chains: results,
        })
    }

    /// Full resolution of a call including the second pass after a MODIFY.
    pub async fn resolve_call(
        &self,
        target: &SupervisionTarget,
        call: &ToolCall,
        ctx: &SupervisionContext,
    ) -> Result<CallVerdict, SuperviseError> {
        let first = self
            .resolve(target, call, ctx, self.allow_modifications)
            .await?;

        let Resolution::Modified(modified) = &first.resolution else {
            return Ok(first);
        };

        if modified.tool_name != call.tool_name {
            warn!(
                "Modification of {} targets another tool '{}'; rejecting",
                call, modified.tool_name
            );
            return Ok(CallVerdict {
                resolution: Resolution::Rejected,
                call: call.clone(),
                chains: first.chains,
            });
        }

        // The modified call replaces the original in place, so it keeps its id
        let modified = call.with_replaced_parameters(modified.parameters.clone());
        info!("Tool call {} was modified to {}; re-validating", call, modified);
        let second = self.resolve(target, &modified, ctx, false).await?;
        Ok(match second.resolution {
            Resolution::Approved(approved) => CallVerdict {
                resolution: Resolution::Modified(approved),
                ..second
            },
            _ => second,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::supervisor::{AllowAll, RejectAll, Supervisor};
    use crate::use_cases::testing::{CountingSupervisor, RecordingRegistry};
    use toolwarden_domain::{
        DecisionKind, SupervisionDecision, SupervisorId, SupervisorInfo, SupervisorKind,
        ToolSpecification,
    };

    fn call() -> ToolCall {
        ToolCall::new("call_1", "get_weather")
            .with_param("location", "London")
            .with_param("unit", "C")
    }

    fn target(chains: &[&[&str]]) -> SupervisionTarget {
        SupervisionTarget {
            tool: Tool::from_spec(
                ToolId::new("tool-1"),
                &ToolSpecification::new("get_weather", "Current weather"),
            ),
            tool_call_id: ToolCallId::new("tc-1"),
            chains: chains
                .iter()
                .enumerate()
                .map(|(i, ids)| {
                    SupervisorChain::new(
                        format!("chain-{}", i + 1),
                        ids.iter()
                            .map(|id| SupervisorInfo::new(*id, *id, SupervisorKind::ClientProgrammatic))
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    fn context(supervisors: Vec<(&str, Arc<dyn Supervisor>)>) -> SupervisionContext {
        let mut ctx = SupervisionContext::new();
        for (id, supervisor) in supervisors {
            ctx.register_supervisor(SupervisorId::new(id), supervisor);
        }
        ctx
    }

    fn resolver(settings: ExecutionSettings) -> MultiChainResolver {
        MultiChainResolver::new(Arc::new(RecordingRegistry::default()), &settings)
    }

    #[tokio::test]
    async fn test_all_approve() {
        let ctx = context(vec![("allow", Arc::new(AllowAll))]);
        let verdict = resolver(ExecutionSettings::default())
            .resolve_call(&target(&[&["allow"], &["allow"]]), &call(), &ctx)
            .await
            .unwrap();
        assert_eq!(verdict.resolution, Resolution::Approved(call()));
        assert_eq!(verdict.chains.len(), 2);
    }

    #[tokio::test]
    async fn test_reject_in_second_chain() {
        let ctx = context(vec![
            ("allow", Arc::new(AllowAll)),
            ("reject", Arc::new(RejectAll::new("no"))),
        ]);
        let verdict = resolver(ExecutionSettings::default())
            .resolve_call(&target(&[&["allow"], &["reject"]]), &call(), &ctx)
            .await
            .unwrap();
        assert!(verdict.is_rejected());
    }

    #[tokio::test]
    async fn test_rejecting_chain_skips_remaining_chains() {
        let later = Arc::new(CountingSupervisor::new(SupervisionDecision::approve()));
        let ctx = context(vec![
            ("reject", Arc::new(RejectAll::new("no"))),
            ("later", later.clone()),
        ]);
        let verdict = resolver(ExecutionSettings::default())
            .resolve_call(&target(&[&["reject"], &["later"]]), &call(), &ctx)
            .await
            .unwrap();
        assert!(verdict.is_rejected());
        assert_eq!(verdict.chains.len(), 1);
        assert_eq!(later.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_callables_run_unsupervised() {
        let ctx = SupervisionContext::new();
        let verdict = resolver(ExecutionSettings::default())
            .resolve_call(&target(&[&["ghost"]]), &call(), &ctx)
            .await
            .unwrap();
        assert_eq!(verdict.resolution, Resolution::Approved(call()));
    }

    #[tokio::test]
    async fn test_modify_is_revalidated() {
        let modified = call().with_param("unit", "F");
        let modifier = Arc::new(CountingSupervisor::first_then(
            SupervisionDecision::modify(modified.clone(), "use fahrenheit"),
            SupervisionDecision::approve(),
        ));
        let ctx = context(vec![("modifier", modifier.clone())]);
        let verdict = resolver(ExecutionSettings::default().with_tool_modifications(true))
            .resolve_call(&target(&[&["modifier"]]), &call(), &ctx)
            .await
            .unwrap();

        assert_eq!(verdict.resolution, Resolution::Modified(modified.clone()));
        assert_eq!(verdict.call, modified);
        assert_eq!(modifier.calls(), 2, "second pass must run");
    }

    #[tokio::test]
    async fn test_modify_again_in_second_pass_is_rejected() {
        let modified = call().with_param("unit", "F");
        let modifier = Arc::new(CountingSupervisor::new(SupervisionDecision::modify(
            modified.clone(),
            "use fahrenheit",
        )));
        let ctx = context(vec![("modifier", modifier.clone())]);
        let verdict = resolver(ExecutionSettings::default().with_tool_modifications(true))
            .resolve_call(&target(&[&["modifier"]]), &call(), &ctx)
            .await
            .unwrap();

        assert!(verdict.is_rejected());
        assert_eq!(modifier.calls(), 2);
        assert_eq!(
            verdict.chains[0].last_kind(),
            Some(DecisionKind::Modify)
        );
    }

    #[tokio::test]
    async fn test_modify_without_permission_is_rejected() {
        let modifier = Arc::new(CountingSupervisor::new(SupervisionDecision::modify(
            call().with_param("unit", "F"),
            "use fahrenheit",
        )));
        let ctx = context(vec![("modifier", modifier.clone())]);
        let verdict = resolver(ExecutionSettings::default())
            .resolve_call(&target(&[&["modifier"]]), &call(), &ctx)
            .await
            .unwrap();
        assert!(verdict.is_rejected());
        assert_eq!(modifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_modified_call_keeps_original_identity() {
        let rewritten = ToolCall::new("call_rewritten", "get_weather")
            .with_param("location", "London")
            .with_param("unit", "F");
        let modifier = Arc::new(CountingSupervisor::first_then(
            SupervisionDecision::modify(rewritten, "use fahrenheit"),
            SupervisionDecision::approve(),
        ));
        let ctx = context(vec![("modifier", modifier.clone())]);
        let verdict = resolver(ExecutionSettings::default().with_tool_modifications(true))
            .resolve_call(&target(&[&["modifier"]]), &call(), &ctx)
            .await
            .unwrap();

        let Resolution::Modified(approved) = &verdict.resolution else {
            panic!("expected a modified call, got {:?}", verdict.resolution);
        };
        assert_eq!(approved.id, "call_1");
        assert_eq!(approved.get_str("unit"), Some("F"));
        assert_eq!(verdict.call.id, "call_1");
    }

    #[tokio::test]
    async fn test_modify_into_another_tool_is_rejected() {
        let modifier = Arc::new(CountingSupervisor::first_then(
            SupervisionDecision::modify(
                ToolCall::new("call_1", "delete_file").with_param("path", "/"),
                "do something else",
            ),
            SupervisionDecision::approve(),
        ));
        let ctx = context(vec![("modifier", modifier.clone())]);
        let verdict = resolver(ExecutionSettings::default().with_tool_modifications(true))
            .resolve_call(&target(&[&["modifier"]]), &call(), &ctx)
            .await
            .unwrap();

        assert!(verdict.is_rejected());
        assert_eq!(verdict.call, call());
        assert_eq!(modifier.calls(), 1, "no second pass for a foreign tool");
    }
}
