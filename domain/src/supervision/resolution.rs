//! Outcome rules for one decision pass
//!
//! Everything here is a pure function of the decisions the supervisors
//! returned and the configured policy:
//!
//! ```text
//! chain 1: [ESCALATE, APPROVE] ─┐
//! chain 2: [APPROVE]           ─┼─▶ resolve_outcome ─▶ Approved | Modified | Rejected
//! chain 3: (not run)           ─┘
//! ```

use super::decision::{DecisionKind, SupervisionDecision};
use super::settings::MultiSupervisorResolution;
use crate::core::ids::ChainId;
use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};

/// Decisions one chain produced, in supervisor order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDecisions {
    pub chain_id: ChainId,
    pub decisions: Vec<SupervisionDecision>,
}

impl ChainDecisions {
    pub fn new(chain_id: impl Into<ChainId>, decisions: Vec<SupervisionDecision>) -> Self {
        Self {
            chain_id: chain_id.into(),
            decisions,
        }
    }

    /// The decision that ended the chain.
    pub fn last(&self) -> Option<&SupervisionDecision> {
        self.decisions.last()
    }

    pub fn last_kind(&self) -> Option<DecisionKind> {
        self.last().map(SupervisionDecision::kind)
    }

    /// A chain aborted on a lookup miss before any supervisor decided.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

/// Outcome of one decision pass over every chain of a tool.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The original call may run.
    Approved(ToolCall),
    /// A supervisor replaced the call. Coming out of [`resolve_outcome`] it
    /// still needs a second pass with modifications disabled.
    Modified(ToolCall),
    Rejected,
}

impl Resolution {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Resolution::Rejected)
    }

    pub fn call(&self) -> Option<&ToolCall> {
        match self {
            Resolution::Approved(call) | Resolution::Modified(call) => Some(call),
            Resolution::Rejected => None,
        }
    }
}

/// Combine the per-chain decisions into one outcome.
///
/// Chains without any decision are ignored. When no chain decided at all
/// the call counts as unsupervised and is approved; callers should log that.
pub fn resolve_outcome(
    policy: MultiSupervisorResolution,
    allow_modifications: bool,
    original: &ToolCall,
    chains: &[ChainDecisions],
) -> Resolution {
    let finals: Vec<&SupervisionDecision> = chains.iter().filter_map(ChainDecisions::last).collect();

    match policy {
        MultiSupervisorResolution::AllMustApprove => {
            if finals.iter().all(|d| d.is_approve()) {
                return Resolution::Approved(original.clone());
            }
        }
    }

    if allow_modifications
        && let Some(last) = finals.last()
        && let Some(modified) = last.modified_call()
    {
        return Resolution::Modified(modified.clone());
    }

    Resolution::Rejected
}

/// True when no chain produced any decision.
pub fn is_unsupervised(chains: &[ChainDecisions]) -> bool {
    chains.iter().all(ChainDecisions::is_empty)
}

/// Decisions worth reporting back to the model, with their 1-based chain
/// and supervisor positions.
pub fn feedback_decisions(
    chains: &[ChainDecisions],
) -> impl Iterator<Item = (usize, usize, &SupervisionDecision)> {
    chains.iter().enumerate().flat_map(|(i, chain)| {
        chain
            .decisions
            .iter()
            .enumerate()
            .filter(|(_, d)| d.kind().is_feedback())
            .map(move |(j, d)| (i + 1, j + 1, d))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call() -> ToolCall {
        ToolCall::new("call_1", "get_weather")
            .with_param("location", "London")
            .with_param("unit", "C")
    }

    fn chain(id: &str, decisions: Vec<SupervisionDecision>) -> ChainDecisions {
        ChainDecisions::new(id, decisions)
    }

    const POLICY: MultiSupervisorResolution = MultiSupervisorResolution::AllMustApprove;

    #[test]
    fn test_all_approve() {
        let chains = vec![
            chain("a", vec![SupervisionDecision::approve()]),
            chain(
                "b",
                vec![
                    SupervisionDecision::escalate("not sure"),
                    SupervisionDecision::approve(),
                ],
            ),
        ];
        assert_eq!(
            resolve_outcome(POLICY, false, &call(), &chains),
            Resolution::Approved(call())
        );
    }

    #[test]
    fn test_one_reject_rejects() {
        let chains = vec![
            chain("a", vec![SupervisionDecision::approve()]),
            chain("b", vec![SupervisionDecision::reject("no")]),
        ];
        assert!(resolve_outcome(POLICY, true, &call(), &chains).is_rejected());
    }

    #[test]
    fn test_trailing_escalate_rejects() {
        let chains = vec![chain("a", vec![SupervisionDecision::escalate("unsure")])];
        assert!(resolve_outcome(POLICY, false, &call(), &chains).is_rejected());
    }

    #[test]
    fn test_terminate_rejects() {
        let chains = vec![chain("a", vec![SupervisionDecision::terminate("stop")])];
        assert!(resolve_outcome(POLICY, true, &call(), &chains).is_rejected());
    }

    #[test]
    fn test_modify_needs_permission() {
        let modified = call().with_param("unit", "F");
        let chains = vec![
            chain("a", vec![SupervisionDecision::approve()]),
            chain("b", vec![SupervisionDecision::modify(modified.clone(), "use F")]),
        ];
        assert_eq!(
            resolve_outcome(POLICY, true, &call(), &chains),
            Resolution::Modified(modified)
        );
        assert!(resolve_outcome(POLICY, false, &call(), &chains).is_rejected());
    }

    #[test]
    fn test_empty_chains_are_skipped() {
        let chains = vec![
            chain("a", vec![]),
            chain("b", vec![SupervisionDecision::approve()]),
        ];
        assert_eq!(
            resolve_outcome(POLICY, false, &call(), &chains),
            Resolution::Approved(call())
        );
        assert!(!is_unsupervised(&chains));

        let none = vec![chain("a", vec![])];
        assert!(is_unsupervised(&none));
        assert!(!resolve_outcome(POLICY, false, &call(), &none).is_rejected());
    }

    #[test]
    fn test_deterministic() {
        let chains = vec![
            chain("a", vec![SupervisionDecision::approve()]),
            chain("b", vec![SupervisionDecision::reject("no")]),
        ];
        let first = resolve_outcome(POLICY, false, &call(), &chains);
        for _ in 0..10 {
            assert_eq!(resolve_outcome(POLICY, false, &call(), &chains), first);
        }
    }

    #[test]
    fn test_feedback_positions() {
        let chains = vec![
            chain("a", vec![SupervisionDecision::approve()]),
            chain(
                "b",
                vec![
                    SupervisionDecision::escalate("ask someone else"),
                    SupervisionDecision::reject("no"),
                ],
            ),
        ];
        let positions: Vec<(usize, usize, DecisionKind)> = feedback_decisions(&chains)
            .map(|(i, j, d)| (i, j, d.kind()))
            .collect();
        assert_eq!(
            positions,
            vec![(2, 1, DecisionKind::Escalate), (2, 2, DecisionKind::Reject)]
        );
    }
}
