//! Supervision domain
//!
//! Decision vocabulary, run settings, supervisor identities and the pure
//! rules that turn per-chain decisions into one outcome.

pub mod decision;
pub mod resolution;
pub mod settings;
pub mod supervisor;

pub use decision::{DecisionKind, SupervisionDecision};
pub use resolution::{ChainDecisions, Resolution, feedback_decisions, is_unsupervised, resolve_outcome};
pub use settings::{ExecutionMode, ExecutionSettings, MultiSupervisorResolution, RejectionPolicy};
pub use supervisor::{SupervisorChain, SupervisorInfo, SupervisorKind};
