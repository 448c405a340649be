//! Errors of the supervision engine

use crate::ports::model_client::ModelError;
use crate::ports::provider_adapter::AdapterError;
use crate::ports::registry::RegistryError;
use crate::ports::supervisor::SupervisorError;
use thiserror::Error;
use toolwarden_domain::DomainError;

/// Errors that abort a supervision pass.
///
/// A rejected or exhausted call is not an error; it yields a response like
/// any other outcome.
#[derive(Error, Debug)]
pub enum SuperviseError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] DomainError),

    #[error("Provider adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),

    #[error("Background supervision task failed: {0}")]
    Background(String),
}

impl SuperviseError {
    /// Failures of an external collaborator (registry or model provider).
    pub fn is_upstream(&self) -> bool {
        matches!(self, SuperviseError::Registry(_) | SuperviseError::Model(_))
    }
}
