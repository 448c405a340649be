//! Application layer for toolwarden
//!
//! This crate contains the supervision engine, its per-run context and the
//! port definitions adapters implement. It depends only on the domain layer.

pub mod context;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use context::SupervisionContext;
pub use ports::{
    audit_logger::{AuditEvent, AuditLogger, NoAuditLogger},
    model_client::{ModelClient, ModelError, ModelRequest},
    provider_adapter::{AdapterError, ChatFormat, ProviderAdapter},
    registry::{
        ChoiceIds, InteractionIds, RegistryError, SupervisionRegistry, SupervisorRegistration,
        ToolCallIds,
    },
    supervisor::{AllowAll, FnSupervisor, RejectAll, SupervisionRequest, Supervisor, SupervisorError},
};
pub use use_cases::bootstrap::{
    BootstrapError, ChainSpec, SessionBuilder, SupervisedSession, SupervisorEntry,
};
pub use use_cases::error::SuperviseError;
pub use use_cases::resample::ResampleEngine;
pub use use_cases::resolve_chains::{CallVerdict, MultiChainResolver, SupervisionTarget};
pub use use_cases::run_chain::ChainRunner;
pub use use_cases::supervise_response::SuperviseResponseUseCase;
