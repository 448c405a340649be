//! Infrastructure layer for toolwarden
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: provider payload adapters, registry and model
//! clients, the JSONL audit trail, and configuration file loading.

pub mod config;
pub mod logging;
pub mod model;
pub mod providers;
pub mod registry;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, FileAuditConfig, FileConfig, FileProviderConfig,
    FileRegistryConfig,
};
pub use logging::JsonlAuditLogger;
pub use model::HttpModelClient;
pub use providers::{AnthropicAdapter, GeminiAdapter, OpenAiAdapter, ProviderKind, adapter_for};
pub use registry::{HttpRegistryClient, InMemoryRegistry};
