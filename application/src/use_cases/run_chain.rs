//! Chain Resolver
//!
//! Runs the supervisors of one chain against one tool call, strictly in
//! order and one at a time:
//!
//! ```text
//! supervisor 1 ──ESCALATE──▶ supervisor 2 ──ESCALATE──▶ supervisor 3
//!      │                          │                          │
//!   other ⇒ stop               other ⇒ stop               any ⇒ stop
//! ```
//!
//! Each execution is bracketed by registry records: a supervision request
//! before the callable runs and its result afterwards.

use crate::context::SupervisionContext;
use crate::ports::registry::SupervisionRegistry;
use crate::ports::supervisor::SupervisionRequest;
use crate::use_cases::error::SuperviseError;
use std::sync::Arc;
use tracing::{debug, warn};
use toolwarden_domain::{
    ChainDecisions, ExecutionMode, SupervisionDecision, SupervisorChain, SupervisorInfo, Tool,
    ToolCall, ToolCallId,
};

/// Explanation attached to a human review skipped in monitoring mode.
pub const MONITORING_AUTO_APPROVAL: &str = "Human review is not awaited in monitoring mode";

#[derive(Clone)]
pub struct ChainRunner {
    registry: Arc<dyn SupervisionRegistry>,
    mode: ExecutionMode,
}

impl ChainRunner {
    pub fn new(registry: Arc<dyn SupervisionRegistry>, mode: ExecutionMode) -> Self {
        Self { registry, mode }
    }

    /// Run `chain` and return the decisions it produced.
    ///
    /// A supervisor without a registered callable aborts the chain; the
    /// decisions gathered so far (possibly none) are returned.
    pub async fn run(
        &self,
        chain: &SupervisorChain,
        tool: &Tool,
        call: &ToolCall,
        tool_call_id: &ToolCallId,
        ctx: &SupervisionContext,
    ) -> Result<ChainDecisions, SuperviseError> {
        let mut decisions: Vec<SupervisionDecision> = Vec::with_capacity(chain.len());

        for (position, info) in chain.supervisors.iter().enumerate() {
            // Resolved before the request is recorded: a miss leaves no
            // supervision request in the registry
            let Some(supervisor) = ctx.supervisor(&info.id) else {
                warn!(
                    "No local callable for supervisor '{}' ({}) in chain {}; chain stops without a decision",
                    info.name, info.id, chain.chain_id
                );
                break;
            };

            let request_id = self
                .registry
                .send_supervision_request(tool_call_id, &info.id, &chain.chain_id, position)
                .await?;

            let decision = if self.skips_human(info) {
                SupervisionDecision::approve().with_explanation(MONITORING_AUTO_APPROVAL)
            } else {
                supervisor
                    .review(SupervisionRequest {
                        tool,
                        tool_call: call,
                        context: ctx,
                        request_id: &request_id,
                        previous_decision: decisions.last(),
                    })
                    .await?
            };

            debug!(
                "Chain {} position {}: {} decided {}",
                chain.chain_id,
                position,
                info.name,
                decision.kind()
            );

            if self.records_result(info) {
                self.registry
                    .send_supervision_result(tool_call_id, &request_id, &decision)
                    .await?;
            }

            let continues = decision.kind().continues_chain();
            decisions.push(decision);
            if !continues {
                break;
            }
        }

        Ok(ChainDecisions::new(chain.chain_id.clone(), decisions))
    }

    /// Monitoring never blocks on a human.
    fn skips_human(&self, info: &SupervisorInfo) -> bool {
        info.kind.is_human() && self.mode.is_monitoring()
    }

    /// Human reviewers report their own result while supervising.
    fn records_result(&self, info: &SupervisorInfo) -> bool {
        !(info.kind.is_human() && self.mode == ExecutionMode::Supervision)
    }
}
