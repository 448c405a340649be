//! Raw TOML configuration data types
//!
//! These structs mirror the config file. The `[execution]` table is kept
//! as a raw key/value map so it goes through the same strict parsing as
//! settings passed programmatically.

mod provider;
mod registry;

pub use provider::FileProviderConfig;
pub use registry::FileRegistryConfig;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;
use toolwarden_domain::{DomainError, ExecutionSettings};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid [execution] settings: {0}")]
    Execution(#[from] DomainError),

    #[error("[{0}] timeout_secs cannot be 0")]
    InvalidTimeout(&'static str),

    #[error("[{0}] base_url cannot be empty")]
    EmptyBaseUrl(&'static str),
}

/// Raw audit configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuditConfig {
    /// JSONL file receiving audit events; no audit log when unset
    pub log_path: Option<PathBuf>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Execution settings by their wire names (`execution_mode`, `n_resamples`, ...)
    pub execution: Map<String, Value>,
    pub registry: FileRegistryConfig,
    pub provider: FileProviderConfig,
    pub audit: FileAuditConfig,
}

impl FileConfig {
    /// Parse and validate the `[execution]` table.
    pub fn execution_settings(&self) -> Result<ExecutionSettings, ConfigError> {
        Ok(ExecutionSettings::from_map(&self.execution)?)
    }

    /// Validate every section, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.execution_settings()?;
        self.registry.validate()?;
        self.provider.validate()?;
        Ok(())
    }
}
