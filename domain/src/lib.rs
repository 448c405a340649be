//! Domain layer for toolwarden
//!
//! This crate contains the vocabulary of tool-call supervision. It has no
//! dependencies on infrastructure or I/O concerns.
//!
//! # Core Concepts
//!
//! ## Supervision
//!
//! Every tool call a model requests passes through one or more
//! **supervisor chains** before it may run:
//!
//! - **Chain**: supervisors run in order; only ESCALATE hands the call on
//! - **Resolution**: the last decision of every chain decides the outcome
//!
//! ## Execution modes
//!
//! - **Supervision** (default): blocking, gates execution
//! - **Monitoring**: fire-and-forget, audit only

pub mod core;
pub mod prompt;
pub mod session;
pub mod supervision;
pub mod tool;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    ids::{
        ChainId, ProjectId, RunId, SupervisionRequestId, SupervisorId, TaskId, ToolCallId, ToolId,
    },
};
pub use prompt::{FeedbackTemplate, RETRY_NUDGE};
pub use session::{Message, Role};
pub use supervision::{
    ChainDecisions, DecisionKind, ExecutionMode, ExecutionSettings, MultiSupervisorResolution,
    RejectionPolicy, Resolution, SupervisionDecision, SupervisorChain, SupervisorInfo,
    SupervisorKind, feedback_decisions, is_unsupervised, resolve_outcome,
};
pub use tool::{CHAT_TOOL_NAME, Tool, ToolCall, ToolSpecification};
