//! Supervision decisions
//!
//! A [`SupervisionDecision`] is the immutable output of exactly one
//! supervisor execution.

use crate::core::error::DomainError;
use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};

/// Kind of outcome a supervisor can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Approve,
    Reject,
    /// Defer to the next supervisor in the same chain
    Escalate,
    Modify,
    Terminate,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Approve => "approve",
            DecisionKind::Reject => "reject",
            DecisionKind::Escalate => "escalate",
            DecisionKind::Modify => "modify",
            DecisionKind::Terminate => "terminate",
        }
    }

    /// Only an escalation hands the call to the next supervisor of the chain.
    pub fn continues_chain(&self) -> bool {
        matches!(self, DecisionKind::Escalate)
    }

    /// Kinds reported back to the model as feedback when resampling.
    pub fn is_feedback(&self) -> bool {
        matches!(
            self,
            DecisionKind::Reject | DecisionKind::Escalate | DecisionKind::Terminate
        )
    }
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DecisionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "approve" => Ok(DecisionKind::Approve),
            "reject" => Ok(DecisionKind::Reject),
            "escalate" => Ok(DecisionKind::Escalate),
            "modify" => Ok(DecisionKind::Modify),
            "terminate" => Ok(DecisionKind::Terminate),
            _ => Err(DomainError::InvalidValue {
                field: "decision".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Decision produced by one supervisor for one tool call.
///
/// Only a [`DecisionKind::Modify`] decision carries a modified call; the
/// constructors make any other combination unrepresentable, and
/// deserialization rejects it.
///
/// # Example
///
/// ```
/// use toolwarden_domain::supervision::{DecisionKind, SupervisionDecision};
///
/// let decision = SupervisionDecision::reject("Deleting files is not allowed");
/// assert_eq!(decision.kind(), DecisionKind::Reject);
/// assert!(decision.modified_call().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDecision", into = "RawDecision")]
pub struct SupervisionDecision {
    kind: DecisionKind,
    explanation: Option<String>,
    modified: Option<ToolCall>,
}

impl SupervisionDecision {
    fn plain(kind: DecisionKind, explanation: Option<String>) -> Self {
        Self {
            kind,
            explanation,
            modified: None,
        }
    }

    pub fn approve() -> Self {
        Self::plain(DecisionKind::Approve, None)
    }

    pub fn reject(explanation: impl Into<String>) -> Self {
        Self::plain(DecisionKind::Reject, Some(explanation.into()))
    }

    pub fn escalate(explanation: impl Into<String>) -> Self {
        Self::plain(DecisionKind::Escalate, Some(explanation.into()))
    }

    pub fn terminate(explanation: impl Into<String>) -> Self {
        Self::plain(DecisionKind::Terminate, Some(explanation.into()))
    }

    pub fn modify(call: ToolCall, explanation: impl Into<String>) -> Self {
        Self {
            kind: DecisionKind::Modify,
            explanation: Some(explanation.into()),
            modified: Some(call),
        }
    }

    /// Build a decision of any non-modifying kind.
    pub fn of_kind(kind: DecisionKind, explanation: Option<String>) -> Result<Self, DomainError> {
        if kind == DecisionKind::Modify {
            return Err(DomainError::InvalidDecision(
                "a modify decision needs a modified tool call".to_string(),
            ));
        }
        Ok(Self::plain(kind, explanation))
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn kind(&self) -> DecisionKind {
        self.kind
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn modified_call(&self) -> Option<&ToolCall> {
        self.modified.as_ref()
    }

    pub fn is_approve(&self) -> bool {
        self.kind == DecisionKind::Approve
    }
}

/// Wire form of a decision, validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawDecision {
    decision: DecisionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    modified: Option<ToolCall>,
}

impl TryFrom<RawDecision> for SupervisionDecision {
    type Error = DomainError;

    fn try_from(raw: RawDecision) -> Result<Self, Self::Error> {
        match (raw.decision, raw.modified) {
            (DecisionKind::Modify, Some(call)) => Ok(Self {
                kind: DecisionKind::Modify,
                explanation: raw.explanation,
                modified: Some(call),
            }),
            (DecisionKind::Modify, None) => Err(DomainError::InvalidDecision(
                "a modify decision needs a modified tool call".to_string(),
            )),
            (kind, Some(_)) => Err(DomainError::InvalidDecision(format!(
                "a {} decision cannot carry a modified tool call",
                kind
            ))),
            (kind, None) => Ok(Self::plain(kind, raw.explanation)),
        }
    }
}

impl From<SupervisionDecision> for RawDecision {
    fn from(decision: SupervisionDecision) -> Self {
        Self {
            decision: decision.kind,
            explanation: decision.explanation,
            modified: decision.modified,
        }
    }
}
