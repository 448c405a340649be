//! Supervisor port
//!
//! A supervisor is the local callable behind a registered supervisor id.
//! Integrators implement [`Supervisor`] for their own checks (an LLM judge,
//! a human review queue, a policy filter).
//!
//! # Built-in Implementations
//!
//! - [`AllowAll`] - Always approves
//! - [`RejectAll`] - Always rejects with a fixed explanation
//! - [`FnSupervisor`] - Wraps a synchronous closure

use crate::context::SupervisionContext;
use async_trait::async_trait;
use thiserror::Error;
use toolwarden_domain::{SupervisionDecision, SupervisionRequestId, Tool, ToolCall};

/// A supervisor failed to produce a decision.
///
/// This is a fault, not a verdict: rejecting a call is done by returning
/// a REJECT decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    #[error("Supervisor '{name}' failed: {reason}")]
    Failed { name: String, reason: String },

    #[error("Supervisor review timed out")]
    Timeout,
}

/// Everything a supervisor sees when reviewing one call.
#[derive(Clone, Copy)]
pub struct SupervisionRequest<'a> {
    pub tool: &'a Tool,
    pub tool_call: &'a ToolCall,
    /// Read-only view of the run
    pub context: &'a SupervisionContext,
    pub request_id: &'a SupervisionRequestId,
    /// Decision of the previous supervisor in the same chain, if any
    pub previous_decision: Option<&'a SupervisionDecision>,
}

#[async_trait]
pub trait Supervisor: Send + Sync {
    async fn review(
        &self,
        request: SupervisionRequest<'_>,
    ) -> Result<SupervisionDecision, SupervisorError>;
}

/// Approves every call.
pub struct AllowAll;

#[async_trait]
impl Supervisor for AllowAll {
    async fn review(
        &self,
        _request: SupervisionRequest<'_>,
    ) -> Result<SupervisionDecision, SupervisorError> {
        Ok(SupervisionDecision::approve())
    }
}

/// Rejects every call with the same explanation.
pub struct RejectAll {
    explanation: String,
}

impl RejectAll {
    pub fn new(explanation: impl Into<String>) -> Self {
        Self {
            explanation: explanation.into(),
        }
    }
}

impl Default for RejectAll {
    fn default() -> Self {
        Self::new("This tool call is not allowed")
    }
}

#[async_trait]
impl Supervisor for RejectAll {
    async fn review(
        &self,
        _request: SupervisionRequest<'_>,
    ) -> Result<SupervisionDecision, SupervisorError> {
        Ok(SupervisionDecision::reject(self.explanation.clone()))
    }
}

/// Adapts a plain function into a supervisor.
///
/// ```ignore
/// let no_deletes = FnSupervisor::new(|req| {
///     if req.tool_call.tool_name == "delete_file" {
///         SupervisionDecision::reject("Deleting files is not allowed")
///     } else {
///         SupervisionDecision::approve()
///     }
/// });
/// ```
pub struct FnSupervisor<F> {
    f: F,
}

impl<F> FnSupervisor<F>
where
    F: Fn(&SupervisionRequest<'_>) -> SupervisionDecision + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Supervisor for FnSupervisor<F>
where
    F: Fn(&SupervisionRequest<'_>) -> SupervisionDecision + Send + Sync,
{
    async fn review(
        &self,
        request: SupervisionRequest<'_>,
    ) -> Result<SupervisionDecision, SupervisorError> {
        Ok((self.f)(&request))
    }
}
