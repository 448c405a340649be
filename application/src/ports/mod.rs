//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod audit_logger;
pub mod model_client;
pub mod provider_adapter;
pub mod registry;
pub mod supervisor;
